//! Countdown text and live-window rules for a race's advertised start.
//!
//! Both functions take `now` explicitly so they stay pure; callers read the
//! clock once per race and pass the same instant to each.

use chrono::{DateTime, Utc};

/// Text shown once a race has reached its advertised start.
pub const LIVE_LABEL: &str = "LIVE";

/// How long after its advertised start a race still counts as live (seconds).
pub const LIVE_WINDOW_SECS: i64 = 300;

/// Whole seconds from `now` until `advertised_start` (negative once started).
pub fn seconds_until(advertised_start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    advertised_start.timestamp() - now.timestamp()
}

/// Format the time remaining until `advertised_start`.
///
/// - started (diff <= 0): `"LIVE"`
/// - under a minute: `"45s"`
/// - under an hour: `"2m 30s"`
/// - otherwise: `"1h 3m"`
pub fn format_countdown(advertised_start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = seconds_until(advertised_start, now);
    match diff {
        d if d <= 0 => LIVE_LABEL.to_string(),
        d if d < 60 => format!("{}s", d),
        d if d < 3600 => format!("{}m {}s", d / 60, d % 60),
        d => format!("{}h {}m", d / 3600, (d % 3600) / 60),
    }
}

/// A race is live from its advertised start until [`LIVE_WINDOW_SECS`] after it.
pub fn is_race_live(advertised_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let diff = seconds_until(advertised_start, now);
    diff <= 0 && diff.abs() <= LIVE_WINDOW_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(format_countdown(at(1150), at(1000)), "2m 30s");
    }

    #[test]
    fn test_started_is_live() {
        assert_eq!(format_countdown(at(999), at(1000)), "LIVE");
    }

    #[test]
    fn test_exact_start_is_live() {
        assert_eq!(format_countdown(at(1000), at(1000)), "LIVE");
    }

    #[test]
    fn test_seconds_only() {
        assert_eq!(format_countdown(at(1030), at(1000)), "30s");
        assert_eq!(format_countdown(at(1001), at(1000)), "1s");
        assert_eq!(format_countdown(at(1059), at(1000)), "59s");
    }

    #[test]
    fn test_minute_boundary() {
        assert_eq!(format_countdown(at(1060), at(1000)), "1m 0s");
        assert_eq!(format_countdown(at(4599), at(1000)), "59m 59s");
    }

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(format_countdown(at(4780), at(1000)), "1h 3m");
        assert_eq!(format_countdown(at(4600), at(1000)), "1h 0m");
        assert_eq!(format_countdown(at(1000 + 2 * 3600 + 59 * 60 + 59), at(1000)), "2h 59m");
    }

    #[test]
    fn test_future_races_never_live() {
        let now = at(1000);
        for offset in [1, 59, 60, 61, 3599, 3600, 86_400] {
            let start = at(1000 + offset);
            assert_ne!(format_countdown(start, now), LIVE_LABEL, "offset {}", offset);
            assert!(!is_race_live(start, now), "offset {}", offset);
        }
    }

    #[test]
    fn test_live_window() {
        let now = at(1000);
        assert!(is_race_live(at(1000), now));
        assert!(is_race_live(at(999), now));
        assert!(is_race_live(at(700), now), "exactly 300s past is still live");
        assert!(!is_race_live(at(699), now), "301s past is no longer live");
    }

    #[test]
    fn test_stable_under_repeated_calls() {
        let (start, now) = (at(1150), at(1000));
        let first = format_countdown(start, now);
        for _ in 0..10 {
            assert_eq!(format_countdown(start, now), first);
            assert!(!is_race_live(start, now));
        }
    }
}
