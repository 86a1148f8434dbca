//! `calcli new`.

use std::io::Write;

use calcli_core::{
    Event, EventZone, RecurrenceRule, parse_date, parse_date_end, parse_duration, parse_time,
};
use calcli_store::Calendars;
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use tracing::debug;

use super::{new_uid, select_calendar};
use crate::cli::NewArgs;
use crate::error::{CliError, CliResult};

/// Creates an event in the requested (or default) calendar and returns it.
pub async fn run<Tz, W>(
    calendars: &Calendars,
    default_calendar: &str,
    args: &NewArgs,
    now: &DateTime<Tz>,
    out: &mut W,
) -> CliResult<Event>
where
    Tz: TimeZone,
    W: Write,
{
    let event = build_event(args, now)?;
    let calendar = args.calendar.as_deref().unwrap_or(default_calendar);
    let store = select_calendar(calendars, calendar)?;

    let path = store.create_event(&event).await?;
    debug!(uid = %event.uid, path = %path.display(), "Created event");

    writeln!(out, "Event '{}' created successfully", event.summary)?;
    Ok(event.with_calendar(calendar))
}

fn build_event<Tz: TimeZone>(args: &NewArgs, now: &DateTime<Tz>) -> CliResult<Event> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(CliError::invalid("event title must not be empty"));
    }

    let (start, end) = if args.all_day {
        if args.duration.is_some() {
            return Err(CliError::invalid("--duration cannot be used with --all-day"));
        }
        let start = parse_date(args.when.as_deref().unwrap_or("today"), now)?;
        (start, start + Duration::days(1))
    } else {
        let start = match args.when.as_deref() {
            Some(when) => parse_time(when, now)?,
            None => next_full_hour(now)?,
        };
        let duration = parse_duration(args.duration.as_deref().unwrap_or(""))?;
        (start, start + duration)
    };

    // Command-line times are wall-clock times in the system zone.
    let mut event = Event::new(new_uid(), title, start, end)
        .with_all_day(args.all_day)
        .with_zone(EventZone::Local);
    if let Some(location) = args.location.as_deref().filter(|l| !l.is_empty()) {
        event = event.with_location(location);
    }
    if let Some(description) = args.description.as_deref().filter(|d| !d.is_empty()) {
        event = event.with_description(description);
    }
    if let Some(rule) = recurrence(args, start, now)? {
        event = event.with_recurrence(rule);
    }
    Ok(event)
}

fn recurrence<Tz: TimeZone>(
    args: &NewArgs,
    start: DateTime<Utc>,
    now: &DateTime<Tz>,
) -> CliResult<Option<RecurrenceRule>> {
    let Some(repeat) = args.repeat else {
        if args.interval.is_some() || args.count.is_some() || args.until.is_some() {
            return Err(CliError::invalid(
                "--interval, --count and --until require --repeat",
            ));
        }
        return Ok(None);
    };

    let mut rule = RecurrenceRule::new(repeat.into());
    if let Some(interval) = args.interval {
        let interval = i32::try_from(interval)
            .ok()
            .filter(|i| *i >= 1)
            .ok_or_else(|| CliError::invalid("--interval must be at least 1"))?;
        rule = rule.with_interval(interval);
    }
    if let Some(count) = args.count {
        if count == 0 {
            return Err(CliError::invalid("--count must be at least 1"));
        }
        rule = rule.with_count(count);
    }
    if let Some(until) = args.until.as_deref() {
        let until = parse_date_end(until, now)?;
        if until < start {
            return Err(CliError::invalid("--until must not be before the event start"));
        }
        rule = rule.with_until(until);
    }
    Ok(Some(rule))
}

/// The next full hour after `now`, in `now`'s timezone.
fn next_full_hour<Tz: TimeZone>(now: &DateTime<Tz>) -> CliResult<DateTime<Utc>> {
    now.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .and_then(|t| t.checked_add_signed(Duration::hours(1)))
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| CliError::invalid("cannot compute a default start time"))
}
