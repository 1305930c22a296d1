//! WADO Core Library
//!
//! Retrieves single DICOM objects from a PACS/VNA over WADO-URI (plain HTTP
//! GET with query parameters) and stores them as files.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`profile`] - Connection profile: host, port, credentials, WADO path
//! - [`params`] - Ordered resource parameters addressing one object
//! - [`download`] - Request building, transport, response interpretation,
//!   multipart extraction and atomic persistence
//!
//! The single-call entry point is [`download_object`]; [`WadoClient`] keeps
//! a transport for repeated downloads from the same archive.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod params;
pub mod profile;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{
    DicomPayload, HttpTransport, Transport, TransportOptions, WadoClient, WadoError,
    WadoRequest, WadoResponse, download_object,
};
pub use params::ResourceParameters;
pub use profile::{ConnectionProfile, ConnectionProfileBuilder, Credentials, Scheme};
