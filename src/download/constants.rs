//! Constants for the download module (timeouts, protocol literals, limits).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default maximum size of a successful response body (2 GiB).
pub const MAX_BODY_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Maximum number of body bytes read from a non-2xx response.
pub const ERROR_BODY_EXCERPT_LIMIT: usize = 4096;

/// Maximum number of bytes rendered into error messages.
pub const DIAGNOSTIC_EXCERPT_LIMIT: usize = 512;

/// Default path of the WADO endpoint below the server root.
pub const DEFAULT_WADO_PATH: &str = "wado";

/// Value of the mandatory `requestType` query parameter.
pub const REQUEST_TYPE_WADO: &str = "WADO";

/// Media type of a DICOM part-10 file.
pub const APPLICATION_DICOM: &str = "application/dicom";

/// Offset of the `DICM` magic after the 128 byte preamble.
pub const DICOM_MAGIC_OFFSET: usize = 128;

/// Magic bytes identifying a DICOM part-10 file.
pub const DICOM_MAGIC: &[u8; 4] = b"DICM";

/// Marker text of the login page served by form-authenticated archives.
pub const LOGIN_PAGE_MARKER: &str = "user login at";

/// Servlet container form-login endpoint below the WADO path.
pub const FORM_LOGIN_ENDPOINT: &str = "j_security_check";
