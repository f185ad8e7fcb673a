//! Date formatting for order history and discount windows.

use chrono::{DateTime, Utc};

/// Format a timestamp as a calendar date, e.g. `Oct 19, 2026`.
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// Format a timestamp with hours and minutes, e.g. `Oct 19, 2026 14:05`.
#[must_use]
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 9, 14, 5, 0).single().unwrap_or_default();
        assert_eq!(format_date(at), "Oct 9, 2026");
        assert_eq!(format_date_time(at), "Oct 9, 2026 14:05");
    }
}
