//! Connection profile for a WADO archive.
//!
//! A [`ConnectionProfile`] is an immutable, validated description of where the
//! archive lives and how to authenticate against it. Build one with
//! [`ConnectionProfile::builder`].
//!
//! ```
//! use wado_core::ConnectionProfile;
//!
//! let profile = ConnectionProfile::builder("a.wado.server", 80)
//!     .credentials("testuser", "testpasss")
//!     .build()
//!     .unwrap();
//! assert_eq!(profile.base_url(), "http://a.wado.server:80/wado");
//! ```

use std::fmt;

use crate::download::constants::DEFAULT_WADO_PATH;
use crate::download::WadoError;

/// URL scheme used to reach the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Plain HTTP (the WADO default).
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the scheme as used in URLs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// User name and password for HTTP Basic authentication.
///
/// Holding both in one value makes "user without password" unrepresentable.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from a user name and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Combines optional parts into optional credentials.
    ///
    /// Both present yields credentials, both absent means anonymous access.
    ///
    /// # Errors
    ///
    /// Returns [`WadoError::InvalidParameter`] when only one part is present.
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>, WadoError> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self::new(username, password))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(WadoError::invalid_parameter(
                "a username was given without a password",
            )),
            (None, Some(_)) => Err(WadoError::invalid_parameter(
                "a password was given without a username",
            )),
        }
    }

    /// The user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<password>")
            .finish()
    }
}

/// Immutable description of a WADO archive endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    scheme: Scheme,
    hostname: String,
    port: u16,
    credentials: Option<Credentials>,
    path: String,
    transfer_syntax: Option<String>,
    form_login: bool,
}

impl ConnectionProfile {
    /// Starts building a profile for `hostname:port`.
    ///
    /// The hostname may carry an `http://` or `https://` prefix, which then
    /// selects the scheme.
    pub fn builder(hostname: impl Into<String>, port: u16) -> ConnectionProfileBuilder {
        ConnectionProfileBuilder {
            hostname: hostname.into(),
            port,
            scheme: None,
            credentials: None,
            path: DEFAULT_WADO_PATH.to_string(),
            transfer_syntax: None,
            form_login: false,
        }
    }

    /// URL scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host name or IP address, without scheme.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Credentials, if the archive is not accessed anonymously.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// User name, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(Credentials::username)
    }

    /// Path of the WADO endpoint below the server root, without slashes.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Transfer syntax UID appended to every request, if forced.
    #[must_use]
    pub fn transfer_syntax(&self) -> Option<&str> {
        self.transfer_syntax.as_deref()
    }

    /// Whether the servlet form-login fallback is enabled.
    #[must_use]
    pub fn form_login(&self) -> bool {
        self.form_login
    }

    /// Base URL of the WADO endpoint, e.g. `http://host:80/wado`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}/{}",
            self.scheme.as_str(),
            self.hostname,
            self.port,
            self.path
        )
    }

    /// Replaces the password in `text` so it can be logged or shown.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        match &self.credentials {
            Some(credentials) if !credentials.password.is_empty() => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(credentials.password.as_bytes()).collect();
                text.replace(&encoded, "<password>")
                    .replace(&credentials.password, "<password>")
            }
            _ => text.to_string(),
        }
    }
}

impl fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WADO archive {}://{}:{} (user '{}')",
            self.scheme.as_str(),
            self.hostname,
            self.port,
            self.username().unwrap_or("<anonymous>")
        )
    }
}

/// Builder for [`ConnectionProfile`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
#[must_use]
pub struct ConnectionProfileBuilder {
    hostname: String,
    port: u16,
    scheme: Option<Scheme>,
    credentials: Option<Credentials>,
    path: String,
    transfer_syntax: Option<String>,
    form_login: bool,
}

impl ConnectionProfileBuilder {
    /// Sets the scheme explicitly, overriding any prefix on the hostname.
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Uses HTTP Basic authentication with these credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Sets or clears the credentials.
    pub fn maybe_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the path of the WADO endpoint (default `wado`).
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Appends `transferSyntax=<uid>` to every request that does not set one.
    pub fn transfer_syntax(mut self, uid: impl Into<String>) -> Self {
        self.transfer_syntax = Some(uid.into());
        self
    }

    /// Enables the servlet form-login fallback for archives serving login pages.
    pub fn form_login(mut self, enabled: bool) -> Self {
        self.form_login = enabled;
        self
    }

    /// Validates the settings and builds the profile.
    ///
    /// # Errors
    ///
    /// Returns [`WadoError::InvalidParameter`] when the hostname is empty or
    /// contains URL delimiters, the port is zero, the user name is empty, or
    /// the transfer syntax is blank.
    pub fn build(self) -> Result<ConnectionProfile, WadoError> {
        let (prefix_scheme, hostname) = split_scheme(self.hostname.trim());
        let hostname = hostname.trim_end_matches('/');
        if hostname.is_empty() {
            return Err(WadoError::invalid_parameter("hostname must not be empty"));
        }
        if let Some(bad) = hostname
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
        {
            return Err(WadoError::invalid_parameter(format!(
                "hostname '{hostname}' contains invalid character {bad:?}"
            )));
        }
        if self.port == 0 {
            return Err(WadoError::invalid_parameter(
                "port must be in the range 1..=65535",
            ));
        }
        if let Some(credentials) = &self.credentials
            && credentials.username.is_empty()
        {
            return Err(WadoError::invalid_parameter("username must not be empty"));
        }
        let transfer_syntax = match self.transfer_syntax {
            Some(uid) if uid.trim().is_empty() => {
                return Err(WadoError::invalid_parameter(
                    "transfer syntax must not be blank",
                ));
            }
            Some(uid) => Some(uid.trim().to_string()),
            None => None,
        };

        Ok(ConnectionProfile {
            scheme: self.scheme.or(prefix_scheme).unwrap_or_default(),
            hostname: hostname.to_string(),
            port: self.port,
            credentials: self.credentials,
            path: self.path.trim_matches('/').to_string(),
            transfer_syntax,
            form_login: self.form_login,
        })
    }
}

fn split_scheme(hostname: &str) -> (Option<Scheme>, &str) {
    let lower = hostname.to_ascii_lowercase();
    if lower.starts_with("https://") {
        (Some(Scheme::Https), &hostname["https://".len()..])
    } else if lower.starts_with("http://") {
        (Some(Scheme::Http), &hostname["http://".len()..])
    } else {
        (None, hostname)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let profile = ConnectionProfile::builder("pacs.local", 8080).build().unwrap();
        assert_eq!(profile.scheme(), Scheme::Http);
        assert_eq!(profile.hostname(), "pacs.local");
        assert_eq!(profile.port(), 8080);
        assert!(profile.credentials().is_none());
        assert_eq!(profile.path(), "wado");
        assert!(!profile.form_login());
        assert_eq!(profile.base_url(), "http://pacs.local:8080/wado");
    }

    #[test]
    fn test_builder_strips_scheme_prefix() {
        let profile = ConnectionProfile::builder("https://pacs.local/", 443).build().unwrap();
        assert_eq!(profile.scheme(), Scheme::Https);
        assert_eq!(profile.hostname(), "pacs.local");

        let profile = ConnectionProfile::builder("HTTP://pacs.local", 80).build().unwrap();
        assert_eq!(profile.scheme(), Scheme::Http);
        assert_eq!(profile.hostname(), "pacs.local");
    }

    #[test]
    fn test_explicit_scheme_wins_over_prefix() {
        let profile = ConnectionProfile::builder("http://pacs.local", 443)
            .scheme(Scheme::Https)
            .build()
            .unwrap();
        assert_eq!(profile.scheme(), Scheme::Https);
    }

    #[test]
    fn test_builder_rejects_empty_hostname() {
        let result = ConnectionProfile::builder("  ", 80).build();
        assert!(matches!(result, Err(WadoError::InvalidParameter { .. })));

        let result = ConnectionProfile::builder("http://", 80).build();
        assert!(matches!(result, Err(WadoError::InvalidParameter { .. })));
    }

    #[test]
    fn test_builder_rejects_hostname_with_path_or_whitespace() {
        for bad in ["pacs/wado", "pa cs", "user@pacs", "pacs?x=1"] {
            let result = ConnectionProfile::builder(bad, 80).build();
            assert!(
                matches!(result, Err(WadoError::InvalidParameter { .. })),
                "Expected InvalidParameter for {bad:?}, got: {result:?}"
            );
        }
    }

    #[test]
    fn test_builder_rejects_port_zero() {
        let result = ConnectionProfile::builder("pacs", 0).build();
        assert!(matches!(result, Err(WadoError::InvalidParameter { .. })));
    }

    #[test]
    fn test_builder_rejects_empty_username() {
        let result = ConnectionProfile::builder("pacs", 80)
            .credentials("", "secret")
            .build();
        assert!(matches!(result, Err(WadoError::InvalidParameter { .. })));
    }

    #[test]
    fn test_builder_trims_path_slashes() {
        let profile = ConnectionProfile::builder("pacs", 80)
            .path("/dcm4chee/wado/")
            .build()
            .unwrap();
        assert_eq!(profile.base_url(), "http://pacs:80/dcm4chee/wado");
    }

    #[test]
    fn test_builder_rejects_blank_transfer_syntax() {
        let result = ConnectionProfile::builder("pacs", 80)
            .transfer_syntax(" ")
            .build();
        assert!(matches!(result, Err(WadoError::InvalidParameter { .. })));
    }

    #[test]
    fn test_credentials_from_parts() {
        assert!(Credentials::from_parts(None, None).unwrap().is_none());
        let credentials =
            Credentials::from_parts(Some("u".to_string()), Some("p".to_string())).unwrap();
        assert_eq!(credentials.unwrap().username(), "u");
        assert!(Credentials::from_parts(Some("u".to_string()), None).is_err());
        assert!(Credentials::from_parts(None, Some("p".to_string())).is_err());
    }

    #[test]
    fn test_debug_never_prints_password() {
        let profile = ConnectionProfile::builder("pacs", 80)
            .credentials("testuser", "s3cr3t")
            .build()
            .unwrap();
        let debug = format!("{profile:?}");
        assert!(!debug.contains("s3cr3t"), "password leaked: {debug}");
        assert!(debug.contains("testuser"));
        assert!(!profile.to_string().contains("s3cr3t"));
    }

    #[test]
    fn test_redact_replaces_plain_and_encoded_password() {
        let profile = ConnectionProfile::builder("pacs", 80)
            .credentials("testuser", "p@ss word")
            .build()
            .unwrap();
        let redacted = profile.redact("j_password=p%40ss+word and p@ss word");
        assert_eq!(redacted, "j_password=<password> and <password>");
    }
}
