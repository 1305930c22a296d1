//! WADO request construction.
//!
//! Builds `{scheme}://{host}:{port}/{path}?requestType=WADO&...` URLs from a
//! [`ConnectionProfile`] and [`ResourceParameters`]. Building is pure: no I/O,
//! same inputs give the same URL.

use std::fmt;

use url::Url;

use super::constants::{APPLICATION_DICOM, FORM_LOGIN_ENDPOINT, REQUEST_TYPE_WADO};
use super::error::WadoError;
use crate::params::{CONTENT_TYPE, REQUEST_TYPE, ResourceParameters, TRANSFER_SYNTAX};
use crate::profile::{ConnectionProfile, Credentials};

/// Implicit VR Little Endian transfer syntax UID.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";

/// Explicit VR Little Endian transfer syntax UID.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// A fully built request: URL plus the credentials to authenticate with.
///
/// `Display` redacts any password embedded in the URL (the form-login URL
/// carries one), so requests can be logged safely.
#[derive(Debug, Clone)]
pub struct WadoRequest {
    url: Url,
    credentials: Option<Credentials>,
}

impl WadoRequest {
    /// Creates a request for `url`, authenticating with `credentials` if given.
    #[must_use]
    pub fn new(url: Url, credentials: Option<Credentials>) -> Self {
        Self { url, credentials }
    }

    /// The request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Credentials for HTTP Basic authentication.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The URL with any password replaced by `<password>`.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let mut redacted = self.url.clone();
        if self.url.password().is_some() {
            let _ = redacted.set_password(Some("<password>"));
        }
        if self.url.query_pairs().any(|(key, _)| key == "j_password") {
            let pairs: Vec<(String, String)> = self
                .url
                .query_pairs()
                .map(|(key, value)| {
                    let value = if key == "j_password" {
                        "<password>".to_string()
                    } else {
                        value.into_owned()
                    };
                    (key.into_owned(), value)
                })
                .collect();
            redacted.query_pairs_mut().clear().extend_pairs(pairs);
        }
        redacted.to_string()
    }
}

impl fmt::Display for WadoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted_url())
    }
}

/// Builds the WADO query URL for one object.
///
/// The query starts with `requestType=WADO`, followed by every parameter in
/// insertion order. `contentType=application/dicom` is appended when the
/// caller did not choose a content type (WADO servers otherwise default to a
/// rendered JPEG), and the profile's forced transfer syntax is appended when
/// the caller did not set `transferSyntax`.
///
/// # Errors
///
/// Returns [`WadoError::InvalidParameter`] when `params` is empty, a key is
/// empty, the caller sets `requestType`, or the profile does not form a valid
/// URL.
pub fn build_resource_url(
    profile: &ConnectionProfile,
    params: &ResourceParameters,
) -> Result<Url, WadoError> {
    if params.is_empty() {
        return Err(WadoError::invalid_parameter(
            "resource parameters must not be empty",
        ));
    }
    if params.iter().any(|(key, _)| key.trim().is_empty()) {
        return Err(WadoError::invalid_parameter(
            "resource parameter keys must not be empty",
        ));
    }
    if params.contains_key(REQUEST_TYPE) {
        return Err(WadoError::invalid_parameter(format!(
            "`{REQUEST_TYPE}` is always {REQUEST_TYPE_WADO} and must not be supplied"
        )));
    }

    let mut url = base_url(profile)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair(REQUEST_TYPE, REQUEST_TYPE_WADO);
        query.extend_pairs(params.iter());
        if !params.contains_key(CONTENT_TYPE) {
            query.append_pair(CONTENT_TYPE, APPLICATION_DICOM);
        }
        if let Some(uid) = profile.transfer_syntax()
            && !params.contains_key(TRANSFER_SYNTAX)
        {
            query.append_pair(TRANSFER_SYNTAX, uid);
        }
    }
    Ok(url)
}

/// Builds the servlet form-login URL, `{base}/j_security_check?j_username=..&j_password=..`.
///
/// Archives that answer with a login page hand out the originally requested
/// object in the response to this URL.
///
/// # Errors
///
/// Returns [`WadoError::InvalidParameter`] when the profile has no
/// credentials or does not form a valid URL.
pub fn build_login_url(profile: &ConnectionProfile) -> Result<Url, WadoError> {
    let credentials = profile
        .credentials()
        .ok_or_else(|| WadoError::invalid_parameter("form login requires credentials"))?;
    let mut url = base_url(profile)?;
    url.path_segments_mut()
        .map_err(|()| WadoError::invalid_parameter("WADO base URL cannot have a path"))?
        .pop_if_empty()
        .push(FORM_LOGIN_ENDPOINT);
    url.query_pairs_mut()
        .append_pair("j_username", credentials.username())
        .append_pair("j_password", credentials.password());
    Ok(url)
}

fn base_url(profile: &ConnectionProfile) -> Result<Url, WadoError> {
    let raw = profile.base_url();
    Url::parse(&raw)
        .map_err(|e| WadoError::invalid_parameter(format!("invalid WADO base URL '{raw}': {e}")))
}
