//! Destination filename derivation from response headers and URL.
//!
//! The resolved name is a single path segment; the caller joins it onto the
//! output directory. Resolution never fails: when neither the headers nor the
//! URL yield a name, a timestamp-based one is generated.

use std::path::{Component, Path};

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::debug;
use url::Url;

/// Longest filename (in characters) we will produce.
const MAX_FILENAME_CHARS: usize = 200;

/// Resolves the local filename for a response.
///
/// Priority:
/// 1. `Content-Disposition` (`filename*=` then `filename=`)
/// 2. Last non-empty path segment of the (post-redirect) response URL
/// 3. `download_<unix-timestamp><ext>`, extension guessed from `Content-Type`
#[must_use]
pub fn resolve_filename(response: &reqwest::Response) -> String {
    let headers = response.headers();
    let content_disposition = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok());
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    filename_from_parts(content_disposition, response.url(), content_type)
}

pub(crate) fn filename_from_parts(
    content_disposition: Option<&str>,
    url: &Url,
    content_type: Option<&str>,
) -> String {
    if let Some(name) = content_disposition
        .and_then(parse_content_disposition)
        .map(|name| sanitize_filename(&name))
        .filter(|name| is_usable(name))
    {
        return name;
    }

    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.into()
        });
        let name = sanitize_filename(&decoded);
        if is_usable(&name) {
            return name;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let extension = content_type.map_or(".bin", extension_from_content_type);
    format!("download_{timestamp}{extension}")
}

fn is_usable(name: &str) -> bool {
    !name.trim_matches('_').is_empty()
}

/// Guess file extension from Content-Type header.
pub(crate) fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/pdf" => ".pdf",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "application/zip" => ".zip",
        "application/gzip" | "application/x-gzip" => ".gz",
        "application/x-tar" => ".tar",
        "application/x-iso9660-image" => ".iso",
        "video/mp4" => ".mp4",
        "audio/mpeg" => ".mp3",
        _ => ".bin",
    }
}

/// Parses a Content-Disposition header value to extract the filename.
///
/// Handles `filename="a.iso"`, `filename=a.iso` and the RFC 5987 form
/// `filename*=UTF-8''a%20b.iso`, preferring the latter when both are present.
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();
    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        return Some(stripped[..end].to_string());
    }
    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Sanitizes a filename so it is a single safe path segment.
///
/// Replaces `/ \ : * ? " < > |` and control characters with `_`, rewrites
/// bare dot segments, and caps the length.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_FILENAME_CHARS)
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
