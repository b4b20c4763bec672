//! Time formatting helpers.

/// Format a duration in seconds to a human-readable string.
///
/// Whole units drop their zero remainder, so a ten-minute TTL reads "10m"
/// rather than "10m 0s".
pub fn format_duration(secs: u64) -> String {
    let (major, major_unit, minor, minor_unit) = if secs < 60 {
        return format!("{secs}s");
    } else if secs < 3600 {
        (secs / 60, "m", secs % 60, "s")
    } else if secs < 86400 {
        (secs / 3600, "h", (secs % 3600) / 60, "m")
    } else {
        (secs / 86400, "d", (secs % 86400) / 3600, "h")
    };
    if minor == 0 {
        format!("{major}{major_unit}")
    } else {
        format!("{major}{major_unit} {minor}{minor_unit}")
    }
}
