//! WADO-URI download pipeline.
//!
//! One download is a sequential chain: build the request URL, send one HTTP
//! GET, interpret the response (raw DICOM or a single-part
//! `multipart/related` envelope), then write the payload atomically.
//!
//! # Features
//!
//! - HTTP Basic authentication, servlet form login fallback
//! - Binary-safe multipart extraction on raw bytes
//! - Configurable timeouts (30s connect, 30s total by default)
//! - Structured error types with retry classification and user hints
//! - Injectable [`Transport`] for tests and custom HTTP stacks
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wado_core::{ConnectionProfile, ResourceParameters, download_object};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = ConnectionProfile::builder("pacs.example.org", 80).build()?;
//! let params = ResourceParameters::for_object("1.2.3", None, "1.2.3.4.5");
//! let file_path = download_object(&profile, &params, Path::new("./dicom")).await?;
//! println!("Downloaded: {}", file_path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub(crate) mod constants;
mod error;
mod filename;
pub mod multipart;
mod persist;
mod request;
mod response;
mod transport;

pub use client::{WadoClient, download_object};
pub use error::{BoxedSource, WadoError};
pub use filename::{DICOM_EXTENSION, object_filename, resolve_filename};
pub use persist::save;
pub use request::{
    EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN, WadoRequest, build_login_url,
    build_resource_url,
};
pub use response::{DicomPayload, check_dicom_signature, extract, is_login_page};
pub use transport::{HttpTransport, Transport, TransportOptions, WadoResponse};
