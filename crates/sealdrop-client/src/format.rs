//! Human-readable formatting for user-facing messages.

const SI_UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BINARY_UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Format a byte count. `si` selects powers of 1000 over powers of 1024;
/// `decimals` is the number of fraction digits shown.
pub fn human_file_size(bytes: i64, si: bool, decimals: usize) -> String {
    let threshold = if si { 1000.0 } else { 1024.0 };
    let mut value = bytes as f64;

    if value.abs() < threshold {
        return format!("{} B", bytes);
    }

    let units = if si { SI_UNITS } else { BINARY_UNITS };
    let mut unit = 0;
    while value.abs() >= threshold && unit < units.len() - 1 {
        value /= threshold;
        unit += 1;
    }
    if value.abs() >= threshold {
        value /= threshold;
    }

    format!("{:.*} {}", decimals, value, units[unit])
}

/// Name a retention duration: "1 hour", "12 hours", "1 day", "2 days",
/// "1 week".
pub fn duration_name(hours: i64) -> String {
    if hours < 24 {
        format!("{} hour{}", hours, plural(hours == 1))
    } else if hours < 24 * 7 {
        format!("{} day{}", scaled(hours, 24), plural(hours == 24))
    } else {
        format!("{} week{}", scaled(hours, 24 * 7), plural(hours == 24 * 7))
    }
}

fn plural(singular: bool) -> &'static str {
    if singular {
        ""
    } else {
        "s"
    }
}

fn scaled(hours: i64, per_unit: i64) -> String {
    if hours % per_unit == 0 {
        (hours / per_unit).to_string()
    } else {
        format!("{:.1}", hours as f64 / per_unit as f64)
    }
}
