//! Human-readable byte counts and durations for progress displays.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with 1024-based units.
///
/// Counts below 1024 are shown as whole bytes; larger counts get one decimal.
///
/// ```
/// use rget_core::format::format_bytes;
///
/// assert_eq!(format_bytes(512), "512B");
/// assert_eq!(format_bytes(1536), "1.5KB");
/// assert_eq!(format_bytes(5 * 1024 * 1024), "5.0MB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes}B");
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}

/// Formats a number of seconds compactly.
///
/// `42s`, `3m05s`, `2h07m`, `3d04h`: at most two units, the smaller one
/// zero-padded.
///
/// ```
/// use rget_core::format::format_duration;
///
/// assert_eq!(format_duration(5), "5s");
/// assert_eq!(format_duration(185), "3m05s");
/// assert_eq!(format_duration(7620), "2h07m");
/// ```
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    match seconds {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m{:02}s", s / MINUTE, s % MINUTE),
        s if s < DAY => format!("{}h{:02}m", s / HOUR, (s % HOUR) / MINUTE),
        s => format!("{}d{:02}h", s / DAY, (s % DAY) / HOUR),
    }
}
