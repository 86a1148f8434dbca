//! Time parsing and query windows.
//!
//! User-facing date and time arguments are interpreted in the timezone of the
//! `now` value the caller passes in, which keeps parsing deterministic in
//! tests. [`QueryWindow`] is the inclusive range handed to recurrence
//! expansion.

use std::sync::LazyLock;

use chrono::{
    DateTime, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Matches relative day/week offsets such as `+3d`, `-2w` or `5d`.
static RELATIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)(\d+)([dw])$").expect("Invalid relative date regex"));

/// Matches Go-style durations such as `1h30m`, `45m` or `90s`.
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("Invalid duration regex")
});

/// Errors produced while parsing user supplied dates, times and durations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// The date text matched none of the supported forms.
    #[error("unsupported date format: {0}")]
    Date(String),

    /// The time text matched none of the supported forms.
    #[error("unsupported time format: {0}")]
    Time(String),

    /// The duration text could not be parsed.
    #[error("invalid duration: {0}")]
    Duration(String),

    /// The local time does not exist (e.g. inside a DST gap) or overflows.
    #[error("time out of range: {0}")]
    OutOfRange(String),
}

/// Parses a date argument and returns local midnight of that day as UTC.
///
/// Accepted forms: `today`, `tomorrow`, `yesterday`, `[+-]Nd`, `[+-]Nw` and
/// `YYYY-MM-DD`.
pub fn parse_date<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();
    let today = now.date_naive();

    let date = match input {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        "yesterday" => today.checked_sub_days(Days::new(1)),
        _ => match parse_relative_days(input) {
            Some(days) => offset_date(today, days),
            None => Some(
                NaiveDate::parse_from_str(input, "%Y-%m-%d")
                    .map_err(|_| TimeParseError::Date(input.to_string()))?,
            ),
        },
    }
    .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()))?;

    local_to_utc(&now.timezone(), date.and_time(NaiveTime::MIN), input)
}

/// Parses a date argument and returns the last second of that day as UTC.
pub fn parse_date_end<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>, TimeParseError> {
    let midnight = parse_date(input, now)?;
    midnight
        .checked_add_signed(Duration::days(1) - Duration::seconds(1))
        .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()))
}

/// Parses a start time argument.
///
/// Accepted forms: `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM`, and `HH:MM`
/// (today at that time).
pub fn parse_time<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();
    let tz = now.timezone();

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return local_to_utc(&tz, naive, input);
        }
    }

    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
        return local_to_utc(&tz, now.date_naive().and_time(time), input);
    }

    Err(TimeParseError::Time(input.to_string()))
}

/// Parses a duration such as `1h`, `30m`, `1h30m` or `90s`.
///
/// An empty string means one hour.
pub fn parse_duration(input: &str) -> Result<Duration, TimeParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Duration::hours(1));
    }

    let caps = DURATION_REGEX
        .captures(input)
        .ok_or_else(|| TimeParseError::Duration(input.to_string()))?;

    let mut total = Duration::zero();
    let mut matched = false;
    for (index, unit) in [(1, 3600), (2, 60), (3, 1)] {
        if let Some(value) = caps.get(index) {
            let value: i64 = value
                .as_str()
                .parse()
                .map_err(|_| TimeParseError::Duration(input.to_string()))?;
            let seconds = value
                .checked_mul(unit)
                .ok_or_else(|| TimeParseError::Duration(input.to_string()))?;
            total += Duration::seconds(seconds);
            matched = true;
        }
    }

    if matched {
        Ok(total)
    } else {
        Err(TimeParseError::Duration(input.to_string()))
    }
}

fn parse_relative_days(input: &str) -> Option<i64> {
    let caps = RELATIVE_REGEX.captures(input)?;
    let amount: i64 = caps[2].parse().ok()?;
    let days = match &caps[3] {
        "w" => amount.checked_mul(7)?,
        _ => amount,
    };
    Some(if &caps[1] == "-" { -days } else { days })
}

fn offset_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days < 0 {
        date.checked_sub_days(magnitude)
    } else {
        date.checked_add_days(magnitude)
    }
}

fn local_to_utc<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    input: &str,
) -> Result<DateTime<Utc>, TimeParseError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()))
}

/// An inclusive query window `[from, to]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Start of the window (inclusive).
    pub from: DateTime<Utc>,
    /// End of the window (inclusive).
    pub to: DateTime<Utc>,
}

impl QueryWindow {
    /// Creates a new window.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Creates a window from optional bounds.
    ///
    /// A missing `from` means the dawn of time; a missing `to` means ten
    /// years after `now`.
    pub fn from_bounds(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let from = from.unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = to.unwrap_or_else(|| {
            now.checked_add_months(Months::new(120))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Self { from, to }
    }

    /// Creates a window covering a whole calendar month in the given timezone.
    ///
    /// Returns `None` for an invalid month.
    pub fn month<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = first.checked_add_months(Months::new(1))?;

        let from = tz.from_local_datetime(&first.and_time(NaiveTime::MIN)).earliest()?;
        let next = tz.from_local_datetime(&next.and_time(NaiveTime::MIN)).earliest()?;
        Some(Self {
            from: from.with_timezone(&Utc),
            to: next.with_timezone(&Utc) - Duration::seconds(1),
        })
    }

    /// Checks if a datetime falls within this window (both ends inclusive).
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.from <= dt && dt <= self.to
    }

    /// Checks if a span overlaps this window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        end >= self.from && start <= self.to
    }
}
