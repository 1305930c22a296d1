//! WADO download pipeline.
//!
//! [`WadoClient`] wires request construction, the transport, response
//! interpretation and persistence into one sequential call per object.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use url::Url;

use super::error::WadoError;
use super::filename::resolve_filename;
use super::persist;
use super::request::{WadoRequest, build_login_url, build_resource_url};
use super::response::{DicomPayload, extract, is_login_page};
use super::transport::{HttpTransport, Transport, TransportOptions};
use crate::params::ResourceParameters;
use crate::profile::ConnectionProfile;

/// Downloads DICOM objects from one WADO archive.
///
/// The client holds an immutable [`ConnectionProfile`] and a [`Transport`].
/// Each call is an independent request/response cycle; the client can be
/// shared between tasks when its transport is `Send + Sync`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wado_core::{ConnectionProfile, ResourceParameters, WadoClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let profile = ConnectionProfile::builder("pacs.example.org", 8080)
///     .credentials("user", "secret")
///     .build()?;
/// let client = WadoClient::new(profile)?;
/// let params = ResourceParameters::for_object("1.2.3", Some("1.2.3.4".into()), "1.2.3.4.5");
/// let path = client.download(&params, Path::new("./dicom")).await?;
/// println!("Saved: {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WadoClient<T: Transport = HttpTransport> {
    profile: ConnectionProfile,
    transport: T,
}

impl WadoClient<HttpTransport> {
    /// Creates a client with the default 30 second timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`WadoError::Connection`] when the HTTP client cannot be
    /// initialised.
    pub fn new(profile: ConnectionProfile) -> Result<Self, WadoError> {
        Self::with_options(profile, TransportOptions::default())
    }

    /// Creates a client with explicit timeouts.
    ///
    /// Profiles with form login get a transport that keeps the session
    /// cookie between the login and the object request.
    ///
    /// # Errors
    ///
    /// Returns [`WadoError::Connection`] when the HTTP client cannot be
    /// initialised.
    pub fn with_options(
        profile: ConnectionProfile,
        options: TransportOptions,
    ) -> Result<Self, WadoError> {
        let transport = if profile.form_login() {
            HttpTransport::with_cookie_store(options)?
        } else {
            HttpTransport::new(options)?
        };
        Ok(Self { profile, transport })
    }
}

impl<T: Transport> WadoClient<T> {
    /// Creates a client on top of a caller-supplied transport.
    #[must_use]
    pub fn with_transport(profile: ConnectionProfile, transport: T) -> Self {
        Self { profile, transport }
    }

    /// The archive this client talks to.
    #[must_use]
    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the WADO URL for `params` without sending anything.
    ///
    /// # Errors
    ///
    /// Returns [`WadoError::InvalidParameter`] for empty or reserved
    /// parameters.
    pub fn resource_url(&self, params: &ResourceParameters) -> Result<Url, WadoError> {
        build_resource_url(&self.profile, params)
    }

    /// Retrieves one object and returns its payload without touching the disk.
    ///
    /// When the archive answers with its login page and the profile enables
    /// form login, the credentials are submitted once to the servlet login
    /// endpoint, which answers with the originally requested object.
    ///
    /// # Errors
    ///
    /// Any [`WadoError`] except `Persistence`.
    #[instrument(skip(self, params), fields(params = %params))]
    pub async fn fetch_object(
        &self,
        params: &ResourceParameters,
    ) -> Result<DicomPayload, WadoError> {
        let request = WadoRequest::new(self.resource_url(params)?, self.profile.credentials().cloned());
        debug!(url = %request, "requesting object");
        let response = self.transport.fetch(&request).await?;

        if !is_login_page(&response) {
            return extract(response);
        }
        if !self.profile.form_login() || self.profile.credentials().is_none() {
            return Err(WadoError::authentication(
                request.redacted_url(),
                self.profile.username(),
                "server answered with a login page",
            ));
        }

        let login = WadoRequest::new(
            build_login_url(&self.profile)?,
            self.profile.credentials().cloned(),
        );
        debug!(url = %login, "login page received; submitting form login");
        let response = self.transport.fetch(&login).await?;
        if is_login_page(&response) {
            return Err(WadoError::authentication(
                login.redacted_url(),
                self.profile.username(),
                "form login rejected the credentials",
            ));
        }
        extract(response)
    }

    /// Downloads one object into `folder` and returns the saved file's path.
    ///
    /// # Errors
    ///
    /// See [`download_as`](Self::download_as).
    pub async fn download(
        &self,
        params: &ResourceParameters,
        folder: &Path,
    ) -> Result<PathBuf, WadoError> {
        self.download_as(params, folder, None).await
    }

    /// Downloads one object into `folder`, optionally under `filename`.
    ///
    /// Without an explicit name, the server's `Content-Disposition` filename
    /// is used, then `<objectUID>.dcm`, then `wado_<unix-seconds>.dcm`.
    /// Nothing is written unless the object was fully received and validated.
    ///
    /// # Errors
    ///
    /// Any [`WadoError`]; see the variants for the failure taxonomy.
    #[instrument(skip(self, params, folder), fields(folder = %folder.display()))]
    pub async fn download_as(
        &self,
        params: &ResourceParameters,
        folder: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, WadoError> {
        let payload = self.fetch_object(params).await?;
        let filename = resolve_filename(filename, payload.suggested_filename(), params);
        debug!(filename = %filename, bytes = payload.len(), "object retrieved");
        persist::save(&payload, folder, &filename).await
    }
}

/// Downloads one object from the archive described by `profile` into
/// `folder` and returns the absolute path of the written file.
///
/// Builds a fresh [`WadoClient`] for the call; reuse a client for several
/// downloads from the same archive.
///
/// # Errors
///
/// Any [`WadoError`]; see the variants for the failure taxonomy.
pub async fn download_object(
    profile: &ConnectionProfile,
    params: &ResourceParameters,
    folder: &Path,
) -> Result<PathBuf, WadoError> {
    WadoClient::new(profile.clone())?
        .download(params, folder)
        .await
}
