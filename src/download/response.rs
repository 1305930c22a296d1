//! Interpretation of WADO responses.
//!
//! Decides from the `Content-Type` header whether the body is a raw DICOM
//! file or a `multipart/related` envelope around one, extracts the payload and
//! sanity-checks it before it reaches the disk.

use bytes::Bytes;
use reqwest::header::CONTENT_DISPOSITION;
use tracing::debug;

use super::constants::{APPLICATION_DICOM, DICOM_MAGIC, DICOM_MAGIC_OFFSET, LOGIN_PAGE_MARKER};
use super::error::WadoError;
use super::filename::parse_content_disposition;
use super::multipart::single_part;
use super::transport::WadoResponse;

/// Bytes of exactly one DICOM file, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DicomPayload {
    bytes: Bytes,
    suggested_filename: Option<String>,
}

impl DicomPayload {
    /// Wraps raw bytes without a filename suggestion.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            suggested_filename: None,
        }
    }

    /// The payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the payload, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for an empty payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Filename the server proposed in `Content-Disposition`, if any.
    #[must_use]
    pub fn suggested_filename(&self) -> Option<&str> {
        self.suggested_filename.as_deref()
    }

    /// Returns true when the payload carries `DICM` after the 128 byte preamble.
    #[must_use]
    pub fn has_dicom_preamble(&self) -> bool {
        has_dicom_magic(&self.bytes)
    }
}

/// Extracts the DICOM payload from a successful response.
///
/// - `application/dicom`: the body is the payload, unchanged.
/// - no Content-Type: the body is the payload if it carries the DICOM magic.
/// - `multipart/related` (with `type`, if given, `application/dicom`): the
///   body of its single part.
///
/// # Errors
///
/// - [`WadoError::UnsupportedContentType`] for any other Content-Type,
/// - [`WadoError::MultipartParse`] when the envelope does not hold exactly
///   one well-formed part or lacks a boundary,
/// - [`WadoError::MalformedPayload`] when the payload fails the DICOM sanity
///   check.
pub fn extract(response: WadoResponse) -> Result<DicomPayload, WadoError> {
    let outer_filename = response
        .headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition);

    let Some(raw_content_type) = response.content_type().map(str::to_string) else {
        if has_dicom_magic(&response.body) {
            debug!("no content type; body carries the DICOM magic");
            return payload(response.body, outer_filename);
        }
        return Err(WadoError::unsupported_content_type(None, &response.body));
    };

    let Some(media_type) = MediaType::parse(&raw_content_type) else {
        return Err(WadoError::unsupported_content_type(
            Some(&raw_content_type),
            &response.body,
        ));
    };

    if media_type.essence == APPLICATION_DICOM {
        return payload(response.body, outer_filename);
    }

    if media_type.essence == MULTIPART_RELATED {
        if let Some(part_type) = media_type.param("type")
            && !part_type.eq_ignore_ascii_case(APPLICATION_DICOM)
        {
            return Err(WadoError::unsupported_content_type(
                Some(&raw_content_type),
                &response.body,
            ));
        }
        let boundary = media_type
            .param("boundary")
            .filter(|boundary| !boundary.is_empty())
            .map(str::to_string)
            .ok_or_else(|| WadoError::multipart(&raw_content_type, "missing boundary parameter"))?;

        let part = single_part(&response.body, &boundary)
            .map_err(|e| WadoError::multipart(&raw_content_type, e.to_string()))?;
        if let Some(part_type) = part.header("content-type") {
            let is_dicom =
                MediaType::parse(part_type).is_some_and(|m| m.essence == APPLICATION_DICOM);
            if !is_dicom {
                return Err(WadoError::unsupported_content_type(Some(part_type), &part.body));
            }
        }
        let filename = part
            .header("content-disposition")
            .and_then(parse_content_disposition)
            .or(outer_filename);
        debug!(boundary = %boundary, bytes = part.body.len(), "extracted multipart body part");
        return payload(part.body, filename);
    }

    Err(WadoError::unsupported_content_type(
        Some(&raw_content_type),
        &response.body,
    ))
}

const MULTIPART_RELATED: &str = "multipart/related";

/// Lowercased essence and parameters of a Content-Type value.
#[derive(Debug, PartialEq, Eq)]
struct MediaType {
    essence: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parses with `mime`, falling back to a plain `;`/`=` split for values
    /// `mime` rejects, such as the unquoted `type=application/dicom` some
    /// archives send.
    fn parse(raw: &str) -> Option<Self> {
        if let Ok(parsed) = raw.parse::<mime::Mime>() {
            return Some(Self {
                essence: parsed.essence_str().to_ascii_lowercase(),
                params: parsed
                    .params()
                    .map(|(name, value)| {
                        (name.as_str().to_ascii_lowercase(), value.as_str().to_string())
                    })
                    .collect(),
            });
        }

        let mut pieces = raw.split(';');
        let essence = pieces.next()?.trim().to_ascii_lowercase();
        let (type_, subtype) = essence.split_once('/')?;
        if type_.is_empty() || subtype.is_empty() || essence.contains(char::is_whitespace) {
            return None;
        }
        let params = pieces
            .filter_map(|piece| {
                let (name, value) = piece.split_once('=')?;
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some((name.trim().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        debug!(content_type = raw, "content type parsed leniently");
        Some(Self { essence, params })
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Returns true when the response is the HTML login page of a
/// form-authenticated archive instead of the requested object.
#[must_use]
pub fn is_login_page(response: &WadoResponse) -> bool {
    let is_html = response
        .content_type()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    is_html
        && String::from_utf8_lossy(&response.body)
            .to_lowercase()
            .contains(LOGIN_PAGE_MARKER)
}

/// Sanity check that `bytes` can be a DICOM part-10 file.
///
/// Payloads long enough to carry the preamble must have `DICM` at offset
/// 128. Shorter, non-empty payloads cannot be checked and are accepted.
///
/// # Errors
///
/// Returns [`WadoError::MalformedPayload`] for an empty payload or a missing
/// magic.
pub fn check_dicom_signature(bytes: &[u8]) -> Result<(), WadoError> {
    if bytes.is_empty() {
        return Err(WadoError::malformed_payload(bytes, "payload is empty"));
    }
    if bytes.len() < DICOM_MAGIC_OFFSET + DICOM_MAGIC.len() {
        debug!(
            bytes = bytes.len(),
            "payload too short for a DICOM preamble; signature not checked"
        );
        return Ok(());
    }
    if !has_dicom_magic(bytes) {
        return Err(WadoError::malformed_payload(
            bytes,
            "missing 'DICM' magic at byte offset 128",
        ));
    }
    Ok(())
}

fn has_dicom_magic(bytes: &[u8]) -> bool {
    bytes
        .get(DICOM_MAGIC_OFFSET..DICOM_MAGIC_OFFSET + DICOM_MAGIC.len())
        .is_some_and(|magic| magic == DICOM_MAGIC)
}

fn payload(bytes: Bytes, suggested_filename: Option<String>) -> Result<DicomPayload, WadoError> {
    check_dicom_signature(&bytes)?;
    Ok(DicomPayload {
        bytes,
        suggested_filename,
    })
}
