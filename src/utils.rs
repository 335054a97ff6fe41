use std::time::Duration;

/// Formats a remaining duration as `MM:SS`, dropping any fractional second.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
