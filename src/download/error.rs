//! Error types for the WADO download pipeline.
//!
//! Every stage of the pipeline (request building, transport, response
//! interpretation, persistence) reports failures through [`WadoError`], with
//! enough context (redacted URL, raw Content-Type, body excerpt) for the caller
//! to diagnose a server whose WADO dialect differs from the expected one.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::constants::DIAGNOSTIC_EXCERPT_LIMIT;

/// Boxed source error carried by [`WadoError::Connection`].
///
/// Boxed rather than `reqwest::Error` so substitute transports can report
/// connection failures of their own.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while downloading a DICOM object over WADO.
#[derive(Debug, Error)]
pub enum WadoError {
    /// Bad input to the request builder or connection profile. Caller bug, never retried.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// What was wrong with the input.
        message: String,
    },

    /// Network-level failure (DNS resolution, connection refused, TLS, reset).
    #[error("connection error requesting {url}: {source}")]
    Connection {
        /// Request URL with any password redacted.
        url: String,
        /// The underlying transport error.
        #[source]
        source: BoxedSource,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout after {timeout:?} requesting {url}")]
    Timeout {
        /// Request URL with any password redacted.
        url: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status} for {url}")]
    Server {
        /// Request URL with any password redacted.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body, lossily decoded.
        body: String,
        /// The Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// A successful response body exceeded the configured maximum size.
    #[error("response body from {url} exceeds the limit of {limit} bytes")]
    ResponseTooLarge {
        /// Request URL with any password redacted.
        url: String,
        /// The configured maximum body size.
        limit: u64,
    },

    /// The server keeps answering with a login page instead of the object.
    #[error("authentication failed for user '{username}' at {url}: {reason}")]
    Authentication {
        /// Request URL with any password redacted.
        url: String,
        /// The user name that was used, or `<anonymous>`.
        username: String,
        /// Short description of what the server answered.
        reason: &'static str,
    },

    /// The response Content-Type is neither DICOM nor multipart/related DICOM.
    #[error("unsupported content type {}: {excerpt}", content_type.as_deref().unwrap_or("<missing>"))]
    UnsupportedContentType {
        /// The raw Content-Type header value, if any.
        content_type: Option<String>,
        /// Leading part of the response body, lossily decoded.
        excerpt: String,
    },

    /// The multipart/related envelope could not be split into exactly one part.
    #[error("cannot parse multipart response ({content_type}): {reason}")]
    MultipartParse {
        /// The raw Content-Type header value.
        content_type: String,
        /// What went wrong.
        reason: String,
    },

    /// The extracted bytes do not look like a DICOM file.
    #[error("malformed DICOM payload ({len} bytes): {reason}")]
    MalformedPayload {
        /// Payload length in bytes.
        len: usize,
        /// What went wrong.
        reason: &'static str,
        /// Leading part of the payload, lossily decoded.
        excerpt: String,
    },

    /// Local filesystem failure while writing the object.
    #[error("IO error writing to {path}: {source}")]
    Persistence {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl WadoError {
    /// Creates an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a connection error from any transport failure.
    pub fn connection(url: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self::Connection {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Creates a server error, keeping a bounded excerpt of the body.
    pub fn server(url: impl Into<String>, status: u16, body: &[u8]) -> Self {
        Self::Server {
            url: url.into(),
            status,
            body: body_excerpt(body),
            retry_after: None,
        }
    }

    /// Creates a server error with a Retry-After header value.
    pub fn server_with_retry_after(
        url: impl Into<String>,
        status: u16,
        body: &[u8],
        retry_after: Option<String>,
    ) -> Self {
        Self::Server {
            url: url.into(),
            status,
            body: body_excerpt(body),
            retry_after,
        }
    }

    /// Creates a response-too-large error.
    pub fn response_too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::ResponseTooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(
        url: impl Into<String>,
        username: Option<&str>,
        reason: &'static str,
    ) -> Self {
        Self::Authentication {
            url: url.into(),
            username: username.unwrap_or("<anonymous>").to_string(),
            reason,
        }
    }

    /// Creates an unsupported content type error.
    pub fn unsupported_content_type(content_type: Option<&str>, body: &[u8]) -> Self {
        Self::UnsupportedContentType {
            content_type: content_type.map(str::to_string),
            excerpt: body_excerpt(body),
        }
    }

    /// Creates a multipart parse error.
    pub fn multipart(content_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MultipartParse {
            content_type: content_type.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed payload error.
    pub fn malformed_payload(payload: &[u8], reason: &'static str) -> Self {
        Self::MalformedPayload {
            len: payload.len(),
            reason,
            excerpt: body_excerpt(payload),
        }
    }

    /// Creates a persistence error.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the same request may succeed if the caller tries again.
    ///
    /// Connection failures, timeouts, 5xx and 429 responses are transient.
    /// Everything else (bad input, 4xx, protocol-shape violations, local
    /// filesystem faults) will fail the same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => true,
            Self::Server { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// Returns the HTTP status for server errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// User-facing suggestion for the most common WADO misconfigurations.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Server { status: 500, .. } => Some(
                "Some archives answer 500 when seriesUID is missing; pass it explicitly.",
            ),
            Self::Server {
                status: 401 | 403, ..
            } => Some("Check the username and password for this archive."),
            Self::Server { status: 404, .. } => {
                Some("Check the study, series and object UIDs; the archive does not know them.")
            }
            Self::Authentication { .. } => Some(
                "The archive serves a login page; check the credentials or enable form login.",
            ),
            Self::ResponseTooLarge { .. } => Some(
                "Raise `max_body_bytes` in the config file if the object really is this large.",
            ),
            Self::UnsupportedContentType { .. } => Some(
                "The server may have ignored contentType=application/dicom or the WADO path is wrong.",
            ),
            _ => None,
        }
    }
}

/// Lossily decodes the start of a body for diagnostics.
///
/// Control bytes other than line breaks and tabs are replaced so binary
/// content stays readable in a terminal.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let end = body.len().min(DIAGNOSTIC_EXCERPT_LIMIT);
    let mut excerpt: String = String::from_utf8_lossy(&body[..end])
        .chars()
        .map(|c| {
            if c.is_control() && !matches!(c, '\n' | '\r' | '\t') {
                '.'
            } else {
                c
            }
        })
        .collect();
    if body.len() > end {
        excerpt.push_str("...");
    }
    excerpt
}
