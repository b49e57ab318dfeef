//! Filename extraction from a part's `content-disposition` header.
//!
//! This is intentionally not a MIME parameter parser. The header is split on `;`, the first
//! segment whose trimmed text starts with `filename` is taken, and the value is recovered by
//! slicing the *untrimmed* segment from two characters past the first `=` up to (excluding) its
//! last character. That assumes the value is always `filename="value"` with exactly one quote on
//! each side. Consequences, all kept on purpose:
//!
//! - `filename="a;b.txt"` is cut at the `;` and yields an empty name (the part is skipped).
//! - `filename=abc` loses its first and last characters and yields `b`.
//! - `filename=a` cannot be sliced at all and is an error.
//! - `filename*=UTF-8''x.txt` also starts with `filename` and is sliced the same way.
//! - Path separators and `..` pass through untouched.
//!
//! Indices count `char`s rather than bytes so that non-ASCII names never split a code point.

use super::errors::UploadError;

/// Trimmed characters: space and every control character below it.
fn is_trimmed(c: char) -> bool {
    c <= ' '
}

/// Extract the filename from a raw `content-disposition` value.
///
/// Returns `Ok(None)` when no segment starts with `filename`, and an error when the header is
/// absent or the slice bounds are out of range. An empty name comes back as `Ok(Some(""))`;
/// deciding to skip it is the caller's business.
pub fn extract_file_name(content_disposition: Option<&str>) -> Result<Option<String>, UploadError> {
    let header = content_disposition.ok_or(UploadError::MissingContentDisposition)?;

    for segment in header.split(';') {
        if segment.trim_matches(is_trimmed).starts_with("filename") {
            return slice_quoted_value(segment).map(Some);
        }
    }

    Ok(None)
}

fn slice_quoted_value(segment: &str) -> Result<String, UploadError> {
    let chars: Vec<char> = segment.chars().collect();

    // A missing '=' counts as position -1, so the slice starts at 1
    let equals = chars.iter().position(|&c| c == '=').map_or(-1, |i| i as i64);
    let begin = equals + 2;
    let end = chars.len() as i64 - 1;

    if begin > end {
        return Err(UploadError::MalformedFilename {
            segment: segment.to_string(),
            begin,
            end,
        });
    }

    Ok(chars[begin as usize..end as usize].iter().collect())
}
