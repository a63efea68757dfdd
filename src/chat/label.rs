//! Relative creation labels shown next to conversation titles.

use chrono::{DateTime, Utc};

/// Format the age of `created_at` relative to `now`.
///
/// Timestamps in the future are treated as "Just now".
#[must_use]
pub fn relative_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(created_at);

    let minutes = age.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = age.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = age.num_days();
    match days {
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=13 => "Last week".to_string(),
        14..=34 => format!("{} weeks ago", days / 7),
        _ => created_at.format("%b %-d, %Y").to_string(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_recent() {
        assert_eq!(relative_label(now(), now()), "Just now");
        assert_eq!(relative_label(now() + Duration::minutes(5), now()), "Just now");
        assert_eq!(relative_label(now() - Duration::minutes(1), now()), "1 minute ago");
        assert_eq!(relative_label(now() - Duration::minutes(42), now()), "42 minutes ago");
    }

    #[test]
    fn test_hours_and_days() {
        assert_eq!(relative_label(now() - Duration::hours(2), now()), "2 hours ago");
        assert_eq!(relative_label(now() - Duration::hours(25), now()), "Yesterday");
        assert_eq!(relative_label(now() - Duration::days(2), now()), "2 days ago");
    }

    #[test]
    fn test_weeks_and_dates() {
        assert_eq!(relative_label(now() - Duration::days(8), now()), "Last week");
        assert_eq!(relative_label(now() - Duration::days(14), now()), "2 weeks ago");
        assert_eq!(relative_label(now() - Duration::days(21), now()), "3 weeks ago");
        assert_eq!(relative_label(now() - Duration::days(60), now()), "Jan 20, 2024");
    }
}
