//! Throttle directives embedded in download URLs.
//!
//! A URL may end with a fragment such as `#limit=500` (KB/s) or
//! `#limit=2m` (MB/s). Fragments never reach the server, so the directive is
//! stripped before the URL is used for anything else.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

#[allow(clippy::expect_used)]
static LIMIT_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^limit=(\d+)([kKmM]?)$").expect("limit directive regex is valid") // Static pattern, safe to panic
});

const KILO: u64 = 1_000;
const MEGA: u64 = 1_000_000;

/// Splits a raw download URL into its byte-rate limit and the clean URL.
///
/// The limit is in bytes per second; `0` means unthrottled. Other fragment
/// parts (joined by `&`) survive; an emptied fragment is dropped entirely.
/// A malformed directive leaves the URL untouched and yields `0`.
///
/// # Examples
///
/// ```
/// use rget_core::parser::parse_limit;
///
/// assert_eq!(
///     parse_limit("https://example.com/a.iso#limit=500"),
///     (500_000, "https://example.com/a.iso".to_string())
/// );
/// assert_eq!(
///     parse_limit("https://example.com/a.iso#limit=2M&page=3"),
///     (2_000_000, "https://example.com/a.iso#page=3".to_string())
/// );
/// assert_eq!(
///     parse_limit("https://example.com/a.iso"),
///     (0, "https://example.com/a.iso".to_string())
/// );
/// ```
#[must_use]
pub fn parse_limit(raw_url: &str) -> (u64, String) {
    let Some((base, fragment)) = raw_url.split_once('#') else {
        return (0, raw_url.to_string());
    };

    let mut limit = None;
    let mut kept = Vec::new();
    for part in fragment.split('&') {
        if limit.is_none()
            && let Some(bytes) = directive_bytes(part)
        {
            limit = Some(bytes);
            continue;
        }
        if part.starts_with("limit=") && limit.is_none() {
            debug!(directive = part, "ignoring malformed limit directive");
            return (0, raw_url.to_string());
        }
        kept.push(part);
    }

    let Some(limit) = limit else {
        return (0, raw_url.to_string());
    };

    let clean = if kept.iter().all(|part| part.is_empty()) {
        base.to_string()
    } else {
        format!("{base}#{}", kept.join("&"))
    };
    debug!(limit, url = %clean, "parsed limit directive");
    (limit, clean)
}

fn directive_bytes(part: &str) -> Option<u64> {
    let caps = LIMIT_DIRECTIVE.captures(part)?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = match caps.get(2).map(|m| m.as_str()) {
        Some("m" | "M") => MEGA,
        _ => KILO,
    };
    value.checked_mul(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit_plain_kilobytes() {
        assert_eq!(
            parse_limit("http://host/f.bin#limit=64"),
            (64_000, "http://host/f.bin".to_string())
        );
    }

    #[test]
    fn test_parse_limit_suffixes() {
        assert_eq!(parse_limit("http://host/f#limit=3k").0, 3_000);
        assert_eq!(parse_limit("http://host/f#limit=3K").0, 3_000);
        assert_eq!(parse_limit("http://host/f#limit=3m").0, 3_000_000);
        assert_eq!(parse_limit("http://host/f#limit=3M").0, 3_000_000);
    }

    #[test]
    fn test_parse_limit_keeps_other_fragment_parts() {
        assert_eq!(
            parse_limit("http://host/f?q=1#top&limit=10"),
            (10_000, "http://host/f?q=1#top".to_string())
        );
    }

    #[test]
    fn test_parse_limit_without_directive_is_unchanged() {
        assert_eq!(
            parse_limit("http://host/f#section"),
            (0, "http://host/f#section".to_string())
        );
        assert_eq!(parse_limit("http://host/f"), (0, "http://host/f".to_string()));
    }

    #[test]
    fn test_parse_limit_malformed_directive_is_unchanged() {
        for raw in [
            "http://host/f#limit=abc",
            "http://host/f#limit=",
            "http://host/f#limit=5g",
            "http://host/f#limit=-5",
        ] {
            assert_eq!(parse_limit(raw), (0, raw.to_string()), "input: {raw}");
        }
    }

    #[test]
    fn test_parse_limit_overflow_is_malformed() {
        let raw = "http://host/f#limit=99999999999999999999m";
        assert_eq!(parse_limit(raw), (0, raw.to_string()));
    }

    #[test]
    fn test_parse_limit_zero_is_unthrottled() {
        assert_eq!(
            parse_limit("http://host/f#limit=0"),
            (0, "http://host/f".to_string())
        );
    }
}
