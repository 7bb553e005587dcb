//! Date and time transforms

use std::fmt::Write;

use chrono::DateTime;
use chrono::Duration;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Offset;
use chrono::TimeZone;
use chrono::Utc;

use crate::error::DataError;
use crate::model::Value;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// How a date/time cell is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeStyle {
    DateTime,
    Time,
    Date,
    TimeSince,
    TimeTense,
}

impl DateTimeStyle {
    /// Whether the display timezone applies unless the column says otherwise.
    pub fn uses_timezone_by_default(self) -> bool {
        matches!(
            self,
            DateTimeStyle::DateTime | DateTimeStyle::TimeSince | DateTimeStyle::TimeTense
        )
    }

    /// The format used when the column has none.
    pub fn default_format(self) -> &'static str {
        match self {
            DateTimeStyle::DateTime => "%a, %b %-d, %Y %-I:%M %p",
            DateTimeStyle::Time => "%-I:%M %p",
            DateTimeStyle::Date => "%b %-d, %Y",
            DateTimeStyle::TimeSince | DateTimeStyle::TimeTense => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Expands a named format alias into a strftime pattern.
pub fn named_format(format: &str) -> &str {
    match format {
        "dateTimeLongMin" => DateTimeStyle::DateTime.default_format(),
        "dateLongMin" => DateTimeStyle::Date.default_format(),
        "time" => DateTimeStyle::Time.default_format(),
        "dateTime" => "%Y-%m-%d %H:%M:%S",
        "date" => "%Y-%m-%d",
        other => other,
    }
}

/// Interprets a cell value as a UTC timestamp.
///
/// Null and empty strings are `None`. Time-only strings fall on the date of
/// `now`. Integers are Unix timestamps in seconds.
pub fn parse_datetime(
    value: &Value,
    column: &str,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, DataError> {
    let invalid = || DataError::InvalidDateTime {
        column: column.to_string(),
        value: value.to_text(),
    };

    match value {
        Value::Null => Ok(None),
        Value::DateTime(dt) => Ok(Some(*dt)),
        Value::Int(seconds) => Utc
            .timestamp_opt(*seconds, 0)
            .single()
            .map(Some)
            .ok_or_else(invalid),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => parse_text(text.trim(), now).map(Some).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_text(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(text, format) {
            return Some(now.date_naive().and_time(time).and_utc());
        }
    }
    None
}

/// Formats `dt` with a strftime pattern, or `None` if the pattern is invalid.
pub fn try_format(dt: &DateTime<FixedOffset>, format: &str) -> Option<String> {
    let mut output = String::new();
    write!(output, "{}", dt.format(format)).ok()?;
    Some(output)
}

/// Renders a timestamp for a date/time column.
///
/// `timezone` is the display zone, or `None` to show the stored UTC time.
pub fn format_datetime(
    dt: DateTime<Utc>,
    style: DateTimeStyle,
    format: Option<&str>,
    timezone: Option<FixedOffset>,
    now: DateTime<Utc>,
) -> String {
    let offset = timezone.unwrap_or_else(|| Utc.fix());
    let local = dt.with_timezone(&offset);

    match style {
        DateTimeStyle::TimeSince => time_since(dt, now),
        DateTimeStyle::TimeTense => time_tense(&local, &now.with_timezone(&offset)),
        _ => {
            let default = style.default_format();
            let pattern = format.map(named_format).unwrap_or(default);
            try_format(&local, pattern)
                .or_else(|| try_format(&local, default))
                .unwrap_or_default()
        }
    }
}

/// Human readable distance between `dt` and `now`, such as "3 hours ago".
pub fn time_since(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(dt);
    let suffix = if delta < Duration::zero() { "from now" } else { "ago" };
    let seconds = delta.num_seconds().unsigned_abs();

    if seconds == 0 {
        return "just now".to_string();
    }

    let (amount, unit) = match seconds {
        s if s < 60 => (s, "second"),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 604_800 => (s / 86_400, "day"),
        s if s < 2_592_000 => (s / 604_800, "week"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{amount} {unit}{plural} {suffix}")
}

/// "Today at 10:15" style rendering relative to `now`.
pub fn time_tense(dt: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> String {
    let date = dt.date_naive();
    let today = now.date_naive();

    let day = if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else if today.succ_opt() == Some(date) {
        "Tomorrow".to_string()
    } else {
        dt.format("%b %-d, %Y").to_string()
    };

    format!("{} at {}", day, dt.format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        for text in ["2024-03-01 09:30:00", "2024-03-01T09:30:00Z", "2024-03-01 09:30"] {
            let parsed = parse_datetime(&Value::from(text), "created_at", now()).unwrap();
            assert_eq!(parsed, Some(expected), "{text}");
        }

        let time = parse_datetime(&Value::from("08:15"), "starts_at", now()).unwrap();
        assert_eq!(time, Some(Utc.with_ymd_and_hms(2024, 3, 15, 8, 15, 0).unwrap()));

        assert_eq!(parse_datetime(&Value::from(""), "created_at", now()), Ok(None));
        assert_eq!(parse_datetime(&Value::Null, "created_at", now()), Ok(None));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let error = parse_datetime(&Value::from("next tuesday"), "created_at", now()).unwrap_err();
        assert_eq!(
            error,
            DataError::InvalidDateTime {
                column: "created_at".to_string(),
                value: "next tuesday".to_string(),
            }
        );
        assert!(parse_datetime(&Value::Bool(true), "created_at", now()).is_err());
    }

    #[test]
    fn test_default_formats() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 21, 5, 0).unwrap();
        let style = |style| format_datetime(dt, style, None, None, now());
        assert_eq!(style(DateTimeStyle::DateTime), "Fri, Mar 1, 2024 9:05 PM");
        assert_eq!(style(DateTimeStyle::Date), "Mar 1, 2024");
        assert_eq!(style(DateTimeStyle::Time), "9:05 PM");
    }

    #[test]
    fn test_timezone_shifts_display() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let shown = format_datetime(dt, DateTimeStyle::Date, Some("%Y-%m-%d"), Some(tz), now());
        assert_eq!(shown, "2024-03-02");
    }

    #[test]
    fn test_time_since() {
        let dt = now() - Duration::hours(3);
        assert_eq!(time_since(dt, now()), "3 hours ago");
        assert_eq!(time_since(now() + Duration::days(1), now()), "1 day from now");
    }

    #[test]
    fn test_time_tense() {
        let format = |dt| format_datetime(dt, DateTimeStyle::TimeTense, None, None, now());
        assert_eq!(format(now() - Duration::hours(2)), "Today at 10:00");
        assert_eq!(format(now() - Duration::days(1)), "Yesterday at 12:00");
        assert_eq!(format(now() + Duration::days(1)), "Tomorrow at 12:00");
        assert_eq!(format(now() - Duration::days(10)), "Mar 5, 2024 at 12:00");
    }
}
