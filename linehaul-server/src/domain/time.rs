//! Schedule time handling.
//!
//! Route schedules arrive from spreadsheets and upstream systems as loosely
//! formatted clock times: "14:30", "14:30:00", or a spreadsheet datetime such
//! as "1900-01-01 02:15:00" where the bogus date only marks a next-day time.
//! Everything here works on the time of day alone; dates are ignored.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Error returned when parsing an invalid schedule time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse a schedule time of day.
///
/// Accepts `HH:MM`, `HH:MM:SS`, and a date-prefixed form
/// (`YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DDTHH:MM[:SS]`) whose date is
/// discarded.
///
/// # Examples
///
/// ```
/// use linehaul_server::domain::parse_schedule_time;
/// use chrono::NaiveTime;
///
/// let t = NaiveTime::from_hms_opt(2, 15, 0).unwrap();
/// assert_eq!(parse_schedule_time("02:15").unwrap(), t);
/// assert_eq!(parse_schedule_time("02:15:00").unwrap(), t);
/// assert_eq!(parse_schedule_time("1900-01-01 02:15:00").unwrap(), t);
///
/// assert!(parse_schedule_time("2:15pm").is_err());
/// assert!(parse_schedule_time("25:00").is_err());
/// ```
pub fn parse_schedule_time(s: &str) -> Result<NaiveTime, TimeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeError::new("empty time"));
    }

    // Drop any date prefix; only the clock part matters.
    let clock = s.rsplit([' ', 'T']).next().unwrap_or(s);

    let parts: Vec<&str> = clock.split(':').collect();
    let (hour, minute, second) = match parts.as_slice() {
        [h, m] => (parse_two_digits(h), parse_two_digits(m), Some(0)),
        [h, m, sec] => (parse_two_digits(h), parse_two_digits(m), parse_seconds(sec)),
        _ => return Err(TimeError::new("expected HH:MM or HH:MM:SS")),
    };

    let hour = hour.ok_or_else(|| TimeError::new("invalid hour digits"))?;
    if hour > 23 {
        return Err(TimeError::new("hour must be 0-23"));
    }
    let minute = minute.ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minute > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }
    let second = second.ok_or_else(|| TimeError::new("invalid second digits"))?;

    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| TimeError::new("invalid time"))
}

/// Format a time of day as `HH:MM:SS`, the canonical stored form.
pub fn format_schedule_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Minutes since midnight for a timestamp, ignoring its date.
pub fn minutes_of_day(time: NaiveTime) -> i64 {
    time.hour() as i64 * 60 + time.minute() as i64
}

/// Format a timestamp the way the API reports it.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a timestamp in the API's `YYYY-MM-DDTHH:MM[:SS]` form.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| TimeError::new("expected YYYY-MM-DDTHH:MM:SS"))
}

/// Parse one or two ASCII digits into a u32.
fn parse_two_digits(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Seconds may carry a fractional part from spreadsheet exports.
fn parse_seconds(s: &str) -> Option<u32> {
    let whole = s.split('.').next()?;
    let secs = parse_two_digits(whole)?;
    (secs <= 59).then_some(secs)
}
