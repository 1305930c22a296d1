//! Filename derivation and sanitization for saved DICOM objects.
//!
//! Precedence: explicit caller name, then the server's `Content-Disposition`
//! filename, then `<objectUID>.dcm`, then `wado_<unix-seconds>.dcm`.

use std::path::{Component, Path};

use crate::params::ResourceParameters;

/// Extension given to generated names.
pub const DICOM_EXTENSION: &str = ".dcm";

/// Picks the name of the file to write, sanitized so it stays in the folder.
#[must_use]
pub fn resolve_filename(
    explicit: Option<&str>,
    suggested: Option<&str>,
    params: &ResourceParameters,
) -> String {
    let chosen = [explicit, suggested]
        .into_iter()
        .flatten()
        .map(sanitize_filename)
        .find(|name| !name.trim_matches('_').is_empty());
    chosen.unwrap_or_else(|| object_filename(params))
}

/// `<objectUID>.dcm`, or `wado_<unix-seconds>.dcm` without an object UID.
#[must_use]
pub fn object_filename(params: &ResourceParameters) -> String {
    if let Some(uid) = params.object_uid() {
        let uid = sanitize_filename(uid.trim());
        if !uid.trim_matches('_').is_empty() {
            return format!("{uid}{DICOM_EXTENSION}");
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("wado_{timestamp}{DICOM_EXTENSION}")
}

/// Parses Content-Disposition header to extract filename.
///
/// Handles both:
/// - `attachment; filename="1.2.3.dcm"`
/// - `attachment; filename=1.2.3.dcm`
/// - `attachment; filename*=UTF-8''1.2.3.dcm` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        // charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim())
                && !decoded.is_empty()
            {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();
    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        let filename = &stripped[..end];
        return (!filename.is_empty()).then(|| filename.to_string());
    }
    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`. Names that would
/// still resolve outside the folder (`.`, `..`) have their dots replaced.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
