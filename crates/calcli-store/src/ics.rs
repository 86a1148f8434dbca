//! ICS/iCalendar encoding and decoding.
//!
//! Parses VEVENT components (RFC 5545) into [`Event`]s and writes a single
//! event back as a VCALENDAR document.

use std::str::FromStr;

use calcli_core::{Event, EventZone, Frequency, RecurrenceRule};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike,
};
use tracing::{debug, warn};

const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Parses ICS content and returns every VEVENT it contains.
///
/// Components without a UID or DTSTART are skipped.
pub fn parse_events(ics: &str) -> Result<Vec<Event>, String> {
    let calendar = ics.parse::<Calendar>()?;

    Ok(calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => parse_event(event),
            _ => None,
        })
        .collect())
}

fn parse_event(vevent: &icalendar::Event) -> Option<Event> {
    let uid = vevent.get_uid()?;
    let start_raw = vevent.get_start()?;
    let all_day = matches!(start_raw, DatePerhapsTime::Date(_));
    let zone = zone_of(&start_raw);

    let start = to_utc(start_raw);
    let end = match vevent.get_end() {
        Some(end) => to_utc(end),
        None => start,
    };

    let mut event = Event::new(uid, vevent.get_summary().unwrap_or_default(), start, end)
        .with_all_day(all_day)
        .with_zone(zone);

    if let Some(description) = vevent.get_description().filter(|d| !d.is_empty()) {
        event = event.with_description(description);
    }
    if let Some(location) = vevent.get_location().filter(|l| !l.is_empty()) {
        event = event.with_location(location);
    }
    if let Some(categories) = vevent.property_value("CATEGORIES") {
        event = event.with_categories(
            categories
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
        );
    }
    if let Some(rrule) = vevent.property_value("RRULE") {
        event = event.with_recurrence(parse_rrule(rrule));
    }

    debug!(uid = %event.uid, start = %event.start, "Parsed event from ICS");
    Some(event)
}

/// Parses an RRULE value such as `FREQ=WEEKLY;INTERVAL=2;COUNT=5`.
///
/// Unknown parts are ignored and malformed numbers keep their defaults.
pub fn parse_rrule(value: &str) -> RecurrenceRule {
    let mut rule = RecurrenceRule::new(Frequency::Daily);

    for part in value.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => rule.frequency = Frequency::from_rrule(value),
            "INTERVAL" => {
                if let Ok(interval) = value.parse() {
                    rule.interval = interval;
                }
            }
            "COUNT" => rule.count = value.parse().ok(),
            "UNTIL" => rule.until = parse_until(value),
            _ => {}
        }
    }
    rule
}

fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, UNTIL_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    // Date-only UNTIL covers the whole day.
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// The zone a DTSTART was written in. Unknown TZIDs are read as UTC.
fn zone_of(value: &DatePerhapsTime) -> EventZone {
    match value {
        DatePerhapsTime::Date(_) => EventZone::Local,
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(_)) => EventZone::Utc,
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(_)) => EventZone::Local,
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { tzid, .. }) => {
            Tz::from_str(tzid).map_or(EventZone::Utc, EventZone::Named)
        }
    }
}

/// Converts an icalendar date or date-time to UTC.
///
/// Dates map to local midnight, floating times to local time, and zoned
/// times go through the tz database. Unknown zones are read as UTC.
fn to_utc(value: DatePerhapsTime) -> DateTime<Utc> {
    match value {
        DatePerhapsTime::Date(date) => local_to_utc(date.and_hms_opt(0, 0, 0).unwrap_or_default()),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => dt,
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => local_to_utc(naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match Tz::from_str(&tzid) {
                Ok(tz) => tz
                    .from_local_datetime(&date_time)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&date_time)),
                Err(_) => {
                    warn!(tzid = %tzid, "Unknown timezone, treating time as UTC");
                    Utc.from_utc_datetime(&date_time)
                }
            }
        }
    }
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Generates a VCALENDAR document holding `event` as its only VEVENT.
pub fn generate_event(event: &Event) -> String {
    let mut vevent = icalendar::Event::new();
    vevent.uid(&event.uid).summary(&event.summary);

    if let Some(ref description) = event.description {
        vevent.description(description);
    }
    if let Some(ref location) = event.location {
        vevent.location(location);
    }
    if !event.categories.is_empty() {
        vevent.add_property("CATEGORIES", event.categories.join(","));
    }

    if event.all_day {
        let start = event.zone.local_time(event.start).date();
        let end = event.zone.local_time(event.end).date().max(start);
        vevent.starts(start).ends(end);
    } else {
        vevent
            .starts(zoned_time(event.zone, event.start))
            .ends(zoned_time(event.zone, event.end));
    }

    if let Some(ref rule) = event.recurrence {
        vevent.add_property("RRULE", rule.to_rrule());
    }

    Calendar::new().push(vevent.done()).done().to_string()
}

/// Writes `instant` the way `zone` reads it back: UTC, floating or TZID.
fn zoned_time(zone: EventZone, instant: DateTime<Utc>) -> CalendarDateTime {
    match zone {
        EventZone::Utc => CalendarDateTime::Utc(instant),
        EventZone::Local => CalendarDateTime::Floating(zone.local_time(instant)),
        EventZone::Named(tz) => CalendarDateTime::WithTimezone {
            date_time: zone.local_time(instant),
            tzid: tz.name().to_string(),
        },
    }
}
