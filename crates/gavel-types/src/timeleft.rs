use chrono::{DateTime, Duration, Utc};

/// Sentinel reported once an auction's end time has passed.
pub const ENDED: &str = "Ended";

/// Remaining auction time as the client displays it: "Ended" when the end
/// time is now or in the past, otherwise "H:MM:SS" with a leading
/// "D day(s), " part once the window exceeds a day. Sub-second remainder
/// is dropped.
pub fn time_left(end_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = end_time - now;
    if remaining <= Duration::zero() {
        return ENDED.to_string();
    }

    let secs = remaining.num_seconds();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!(
            "{} day{}, {}:{:02}:{:02}",
            days,
            if days == 1 { "" } else { "s" },
            hours,
            minutes,
            seconds
        )
    } else {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn ended_when_past_or_exactly_now() {
        assert_eq!(time_left(at(-1), at(0)), ENDED);
        assert_eq!(time_left(at(0), at(0)), ENDED);
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(time_left(at(3_600), at(0)), "1:00:00");
        assert_eq!(time_left(at(59), at(0)), "0:00:59");
        assert_eq!(time_left(at(3_725), at(0)), "1:02:05");
    }

    #[test]
    fn formats_days_with_plural() {
        assert_eq!(time_left(at(86_400 + 3_600), at(0)), "1 day, 1:00:00");
        assert_eq!(time_left(at(2 * 86_400 + 65), at(0)), "2 days, 0:01:05");
    }
}
