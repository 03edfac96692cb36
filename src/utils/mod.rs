pub mod event;

/// Truncate a string to a maximum length, appending an ellipsis if truncated
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a byte count with decimal units, matching how Grid Engine scales memory
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [(&str, f64); 4] = [("T", 1e12), ("G", 1e9), ("M", 1e6), ("K", 1e3)];

    let value = bytes as f64;
    for (suffix, scale) in UNITS {
        if value.abs() >= scale {
            return format!("{:.1}{}", value / scale, suffix);
        }
    }
    format!("{}B", bytes)
}

/// Shorten a qstat timestamp (`2024-03-01T10:05:00.123`) to `2024-03-01 10:05:00`
pub fn format_timestamp(value: &str) -> String {
    let trimmed = value.split('.').next().unwrap_or(value);
    trimmed.replacen('T', " ", 1)
}
