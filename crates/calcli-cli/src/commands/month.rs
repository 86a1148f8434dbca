//! `calcli month`.

use std::fmt::Display;
use std::io::Write;

use calcli_core::{MonthView, QueryWindow};
use calcli_store::EventSource;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

use super::expand_events;
use crate::cli::MonthArgs;
use crate::error::{CliError, CliResult};

/// Prints the month grid for `args.date` (or the current month) followed by
/// that month's events.
pub async fn run<S, Tz, W>(
    source: &S,
    args: &MonthArgs,
    now: &DateTime<Tz>,
    out: &mut W,
) -> CliResult<()>
where
    S: EventSource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    let today = now.date_naive();
    let (year, month) = match args.date.as_deref() {
        Some(text) => parse_month(text)?,
        None => (today.year(), today.month()),
    };

    let tz = now.timezone();
    let window = QueryWindow::month(year, month, &tz)
        .ok_or_else(|| CliError::invalid(format!("month {}-{:02} is out of range", year, month)))?;

    let mut occurrences = expand_events(&source.list_events().await?, &window);
    let view = MonthView::new(year, month, today, std::mem::take(&mut occurrences.events))
        .ok_or_else(|| CliError::invalid(format!("month {}-{:02} is out of range", year, month)))?;

    write!(out, "{}", view.render_with_events(&tz))?;
    occurrences.write_notes(out)
}

/// Parses `YYYY-MM`.
fn parse_month(text: &str) -> CliResult<(i32, u32)> {
    NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d")
        .map(|date| (date.year(), date.month()))
        .map_err(|_| CliError::invalid(format!("invalid month '{}', expected YYYY-MM", text)))
}
