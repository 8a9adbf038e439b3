//! Download URL validation.

use tracing::trace;
use url::Url;

use super::error::{MAX_URL_LENGTH, ParseError};

/// Validates a download URL and returns it in normalized form.
///
/// Accepts only absolute `http`/`https` URLs with a host, no longer than
/// [`MAX_URL_LENGTH`]. Strip any throttle directive with
/// [`parse_limit`](super::parse_limit) first.
///
/// # Errors
///
/// Returns [`ParseError`] describing the first failed check.
///
/// # Examples
///
/// ```
/// use rget_core::parser::validate_url;
///
/// assert_eq!(
///     validate_url("https://Example.com/a.iso").unwrap(),
///     "https://example.com/a.iso"
/// );
/// assert!(validate_url("ftp://example.com/a.iso").is_err());
/// ```
pub fn validate_url(raw: &str) -> Result<String, ParseError> {
    let raw = raw.trim();
    if raw.len() > MAX_URL_LENGTH {
        return Err(ParseError::too_long(raw));
    }

    let parsed = Url::parse(raw).map_err(|e| ParseError::malformed(raw, &e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(ParseError::unsupported_scheme(raw, scheme)),
    }

    if parsed.host().is_none() {
        return Err(ParseError::no_host(raw));
    }

    trace!(url = %parsed, "validated download URL");
    Ok(parsed.to_string())
}
