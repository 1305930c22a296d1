//! Binary-safe splitting of `multipart/related` bodies.
//!
//! Works purely on byte offsets: DICOM payloads are binary and routinely
//! contain CR/LF bytes, so no line splitting or text decoding is applied to
//! part bodies. Parts are returned as zero-copy slices of the original body.

use bytes::Bytes;
use thiserror::Error;

/// Why a multipart body could not be split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultipartError {
    /// No delimiter line `--<boundary>` was found.
    #[error("boundary delimiter '--{boundary}' not found in body")]
    BoundaryNotFound {
        /// The boundary that was searched for.
        boundary: String,
    },

    /// The last body part is not followed by another delimiter.
    #[error("body part starting at byte {offset} is not terminated by a delimiter")]
    Unterminated {
        /// Offset of the unterminated part.
        offset: usize,
    },

    /// A body part has no empty line ending its headers.
    #[error("headers of the body part starting at byte {offset} are not terminated")]
    HeadersUnterminated {
        /// Offset of the part.
        offset: usize,
    },

    /// A single-object response must contain exactly one part.
    #[error("expected exactly one body part, found {count}")]
    PartCount {
        /// Number of parts found.
        count: usize,
    },
}

/// One body part: its headers and raw body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    /// Part headers as `(lowercased name, trimmed value)` pairs.
    pub headers: Vec<(String, String)>,
    /// Part body, a slice of the multipart body.
    pub body: Bytes,
}

impl BodyPart {
    /// Returns the first header value named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
struct Delimiter {
    /// Offset of the line break preceding `--boundary` (or of `--` at body start).
    start: usize,
    /// Offset right after the delimiter line.
    content_start: usize,
    is_close: bool,
}

/// Splits `body` into its parts.
///
/// The preamble before the first delimiter and the epilogue after the close
/// delimiter are ignored. Every part must be followed by another delimiter
/// line; the last one is normally the close delimiter `--boundary--`.
///
/// # Errors
///
/// Returns [`MultipartError`] when no delimiter is found, a part is not
/// terminated, or a part's headers are not terminated.
pub fn split_parts(body: &Bytes, boundary: &str) -> Result<Vec<BodyPart>, MultipartError> {
    let delimiters = find_delimiters(body, boundary.as_bytes());
    if delimiters.is_empty() {
        return Err(MultipartError::BoundaryNotFound {
            boundary: boundary.to_string(),
        });
    }

    let mut parts = Vec::new();
    for (index, delimiter) in delimiters.iter().enumerate() {
        if delimiter.is_close {
            break;
        }
        let Some(next) = delimiters.get(index + 1) else {
            return Err(MultipartError::Unterminated {
                offset: delimiter.content_start,
            });
        };
        let start = delimiter.content_start;
        let end = next.start.max(start);
        parts.push(parse_part(body, start, end)?);
    }
    Ok(parts)
}

/// Extracts the only part of a single-object multipart body.
///
/// # Errors
///
/// Returns [`MultipartError::PartCount`] when the body holds zero or several
/// parts, or any error of [`split_parts`].
pub fn single_part(body: &Bytes, boundary: &str) -> Result<BodyPart, MultipartError> {
    let mut parts = split_parts(body, boundary)?;
    if parts.len() != 1 {
        return Err(MultipartError::PartCount { count: parts.len() });
    }
    Ok(parts.remove(0))
}

fn find_delimiters(body: &[u8], boundary: &[u8]) -> Vec<Delimiter> {
    let mut dash_boundary = Vec::with_capacity(boundary.len() + 2);
    dash_boundary.extend_from_slice(b"--");
    dash_boundary.extend_from_slice(boundary);

    let mut delimiters = Vec::new();
    let mut from = 0;
    while let Some(found) = find(body, &dash_boundary, from) {
        from = found + 1;

        // A delimiter only counts at the start of a line.
        let start = if found == 0 {
            0
        } else if body[..found].ends_with(b"\r\n") {
            found - 2
        } else if body[found - 1] == b'\n' {
            found - 1
        } else {
            continue;
        };

        let after = found + dash_boundary.len();
        if body[after..].starts_with(b"--") {
            delimiters.push(Delimiter {
                start,
                content_start: after + 2,
                is_close: true,
            });
            break;
        }

        // Transport padding, then the end of the delimiter line.
        let mut cursor = after;
        while cursor < body.len() && matches!(body[cursor], b' ' | b'\t') {
            cursor += 1;
        }
        let content_start = if body[cursor..].starts_with(b"\r\n") {
            cursor + 2
        } else if body[cursor..].starts_with(b"\n") {
            cursor + 1
        } else {
            // `--boundary` is only a prefix of a longer token.
            continue;
        };

        delimiters.push(Delimiter {
            start,
            content_start,
            is_close: false,
        });
        from = content_start;
    }
    delimiters
}

fn parse_part(body: &Bytes, start: usize, end: usize) -> Result<BodyPart, MultipartError> {
    let part = &body[start..end];

    let (header_end, body_start) = if part.starts_with(b"\r\n") {
        (0, 2)
    } else if part.starts_with(b"\n") {
        (0, 1)
    } else {
        // Headers end at the first empty line, whichever line ending it uses.
        let crlf = find(part, b"\r\n\r\n", 0).map(|pos| (pos, pos + 4));
        let lf = find(part, b"\n\n", 0).map(|pos| (pos, pos + 2));
        [crlf, lf]
            .into_iter()
            .flatten()
            .min_by_key(|(header_end, _)| *header_end)
            .ok_or(MultipartError::HeadersUnterminated { offset: start })?
    };

    Ok(BodyPart {
        headers: parse_headers(&part[..header_end]),
        body: body.slice(start + body_start..end),
    })
}

fn parse_headers(raw: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(raw)
        .lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
