//! Display formatting for large magnitudes and durations.
//!
//! The engine works on plain `f64` amounts; these helpers turn them into
//! short strings such as `"1.5K"` or `"12B"` for the presentation layer.

/// Abbreviation suffixes, one per power of 1000.
const SUFFIXES: [&str; 12] = [
    "", "K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No", "Dc",
];

/// Returned for magnitudes past the largest suffix tier.
pub const OVERFLOW_MARKER: &str = "Infinity";

/// Format a number with a K/M/B/T… suffix (e.g. 1234 → "1.2K", 56_000_000 → "56M").
///
/// Values below 1000 are floored and printed as integers.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }
    if n < 1000.0 {
        return format!("{}", n.floor() as u64);
    }
    if !n.is_finite() {
        return OVERFLOW_MARKER.to_string();
    }

    let mut tier = (n.log10() / 3.0).floor() as usize;
    // log10 can land a hair below an exact power of 1000.
    if n / 1000f64.powi(tier as i32) >= 1000.0 {
        tier += 1;
    }
    if tier >= SUFFIXES.len() {
        return OVERFLOW_MARKER.to_string();
    }

    let scaled = n / 1000f64.powi(tier as i32);
    let text = if scaled < 10.0 {
        format!("{:.1}", scaled)
    } else {
        format!("{:.0}", scaled)
    };

    // Rounding may carry into the next tier ("1000K" → "1.0M").
    if text == "1000" {
        return match SUFFIXES.get(tier + 1) {
            Some(next) => format!("1.0{}", next),
            None => OVERFLOW_MARKER.to_string(),
        };
    }
    format!("{}{}", text, SUFFIXES[tier])
}

/// Currency amount with a prefix symbol.
pub fn format_currency(n: f64) -> String {
    format!("$ {}", format_number(n))
}

/// Income rate, e.g. "12K/s".
pub fn format_per_second(n: f64) -> String {
    format!("{}/s", format_number(n))
}

/// Human readable duration from milliseconds: "2d 3h", "4h 10m", "5m 2s", "42s".
pub fn format_duration_ms(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
