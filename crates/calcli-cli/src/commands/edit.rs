//! `calcli edit`.

use std::io::Write;

use calcli_core::{Event, parse_date, parse_duration, parse_time};
use calcli_store::Calendars;
use chrono::{DateTime, TimeZone};
use tracing::debug;

use super::select_calendar;
use crate::cli::EditArgs;
use crate::error::{CliError, CliResult};

const MIN_UID_LEN: usize = 3;

/// Applies the requested changes to the event with `args.uid` and returns
/// the updated event.
pub async fn run<Tz, W>(
    calendars: &Calendars,
    args: &EditArgs,
    now: &DateTime<Tz>,
    out: &mut W,
) -> CliResult<Event>
where
    Tz: TimeZone,
    W: Write,
{
    if args.uid.chars().count() < MIN_UID_LEN {
        return Err(CliError::invalid(format!(
            "UID '{}' is too short. UIDs should be at least {} characters long",
            args.uid, MIN_UID_LEN
        )));
    }
    if args.title.is_none()
        && args.when.is_none()
        && args.duration.is_none()
        && args.location.is_none()
    {
        return Err(CliError::invalid(
            "nothing to change: pass --title, --when, --duration or --location",
        ));
    }

    let event = match calendars.find_event(&args.uid).await {
        Ok(event) => event,
        Err(e) if e.is_not_found() => {
            return Err(CliError::invalid(format!(
                "no event found with UID '{}'. Use 'calcli list --show-uid' or \
                 'calcli search --show-uid <query>' to find valid UIDs",
                args.uid
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let store = select_calendar(calendars, &event.calendar)?;
    let updated = apply(event, args, now)?;
    let path = store.update_event(&updated).await?;
    debug!(uid = %updated.uid, path = %path.display(), "Updated event");

    writeln!(out, "Event '{}' updated successfully", updated.summary)?;
    Ok(updated)
}

fn apply<Tz: TimeZone>(mut event: Event, args: &EditArgs, now: &DateTime<Tz>) -> CliResult<Event> {
    if let Some(ref title) = args.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(CliError::invalid("event title must not be empty"));
        }
        event.summary = title.to_string();
    }

    if let Some(ref location) = args.location {
        event.location = Some(location.clone()).filter(|l| !l.is_empty());
    }

    if args.when.is_none() && args.duration.is_none() {
        return Ok(event);
    }

    if event.all_day && args.duration.is_some() {
        return Err(CliError::invalid("--duration cannot be used with all-day events"));
    }

    let start = match args.when.as_deref() {
        Some(when) if event.all_day => parse_date(when, now)?,
        Some(when) => parse_time(when, now)?,
        None => event.start,
    };
    let duration = match args.duration.as_deref() {
        Some(duration) => parse_duration(duration)?,
        None => event.duration(),
    };

    event.start = start;
    event.end = start + duration;
    Ok(event)
}
