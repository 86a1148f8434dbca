//! Event types for calendar events.
//!
//! This module provides the value types stored in a calendar directory:
//! - [`Event`]: a single calendar event, possibly recurring
//! - [`RecurrenceRule`]: how a recurring event repeats
//! - [`Frequency`]: the supported recurrence frequencies
//! - [`EventZone`]: the zone an event's wall-clock times belong to

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// How often a recurring event repeats.
///
/// Only the four basic iCalendar frequencies are supported. Text coming from
/// disk goes through [`Frequency::from_rrule`], which maps anything it does
/// not recognise to [`Frequency::Daily`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Parses an RRULE `FREQ` value.
    ///
    /// Matching is case-insensitive. Unknown values fall back to daily
    /// stepping so a malformed rule still shows up in listings.
    pub fn from_rrule(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => Self::Daily,
        }
    }

    /// Returns the RRULE `FREQ` value.
    pub fn as_rrule(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_rrule())
    }
}

/// The time zone an event was written in.
///
/// Recurrence steps on wall-clock time in this zone, so a 09:00 meeting
/// stays at 09:00 across daylight-saving changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventZone {
    /// Fixed UTC times.
    #[default]
    Utc,
    /// The system zone. Used for floating times and all-day dates.
    Local,
    /// A named IANA zone.
    Named(chrono_tz::Tz),
}

impl EventZone {
    /// Returns the wall-clock time of `instant` in this zone.
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Utc => instant.naive_utc(),
            Self::Local => instant.with_timezone(&chrono::Local).naive_local(),
            Self::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Resolves a wall-clock time in this zone to an instant.
    ///
    /// Ambiguous times take the earlier instant. Times inside a DST gap move
    /// forward by an hour.
    pub fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Utc => Some(local.and_utc()),
            Self::Local => resolve_in(&chrono::Local, local),
            Self::Named(tz) => resolve_in(tz, local),
        }
    }

    pub fn is_utc(&self) -> bool {
        matches!(self, Self::Utc)
    }
}

fn resolve_in<Z: TimeZone>(tz: &Z, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            local
                .checked_add_signed(Duration::hours(1))
                .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
}

impl fmt::Display for EventZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => f.write_str("UTC"),
            Self::Local => f.write_str("local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for EventZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UTC" | "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            name => name
                .parse::<chrono_tz::Tz>()
                .map(Self::Named)
                .map_err(|_| format!("unknown time zone '{}'", name)),
        }
    }
}

impl From<EventZone> for String {
    fn from(zone: EventZone) -> Self {
        zone.to_string()
    }
}

impl TryFrom<String> for EventZone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A recurrence rule attached to an [`Event`].
///
/// `interval` is kept exactly as read; the recurrence engine treats values
/// below one as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Repetition frequency.
    pub frequency: Frequency,
    /// Number of frequency units between occurrences.
    pub interval: i32,
    /// Maximum number of occurrences, counted from the first one.
    pub count: Option<u32>,
    /// Last instant an occurrence may start at (inclusive).
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// Creates a rule with interval 1 and no count or until limit.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
        }
    }

    /// Builder method to set the interval.
    pub fn with_interval(mut self, interval: i32) -> Self {
        self.interval = interval;
        self
    }

    /// Builder method to set the count limit.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Builder method to set the until limit.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Returns the interval normalized to at least one.
    pub fn effective_interval(&self) -> u32 {
        u32::try_from(self.interval).unwrap_or(0).max(1)
    }

    /// Renders the rule as an RRULE value, e.g. `FREQ=WEEKLY;INTERVAL=2`.
    pub fn to_rrule(&self) -> String {
        let mut rrule = format!("FREQ={}", self.frequency.as_rrule());
        if self.interval > 1 {
            rrule.push_str(&format!(";INTERVAL={}", self.interval));
        }
        if let Some(count) = self.count {
            rrule.push_str(&format!(";COUNT={}", count));
        }
        if let Some(until) = self.until {
            rrule.push_str(&format!(";UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
        }
        rrule
    }
}

/// A calendar event.
///
/// Events are produced by the directory store or by recurrence expansion.
/// Expanded instances never carry a [`RecurrenceRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier (iCalendar UID).
    pub uid: String,
    /// Event title.
    pub summary: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant, never before `start`.
    pub end: DateTime<Utc>,
    /// Optional location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Whether this is an all-day event.
    pub all_day: bool,
    /// Zone the start and end were written in.
    #[serde(default, skip_serializing_if = "EventZone::is_utc")]
    pub zone: EventZone,
    /// Name of the calendar (collection) owning this event.
    pub calendar: String,
    /// Recurrence rule, if the event repeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

impl Event {
    /// Creates a new event. An `end` before `start` is clamped to `start`.
    pub fn new(
        uid: impl Into<String>,
        summary: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            summary: summary.into(),
            description: None,
            start,
            end: end.max(start),
            location: None,
            categories: Vec::new(),
            all_day: false,
            zone: EventZone::Utc,
            calendar: String::new(),
            recurrence: None,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the owning calendar.
    pub fn with_calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = calendar.into();
        self
    }

    /// Builder method to mark the event as all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Builder method to set the zone.
    pub fn with_zone(mut self, zone: EventZone) -> Self {
        self.zone = zone;
        self
    }

    /// Builder method to add categories.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Builder method to attach a recurrence rule.
    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    /// Returns true if the event carries a recurrence rule.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Returns the span of a single occurrence.
    ///
    /// An all-day event whose end is not after its start lasts one day.
    pub fn duration(&self) -> Duration {
        let span = self.end - self.start;
        if self.all_day && span <= Duration::zero() {
            Duration::days(1)
        } else {
            span
        }
    }

    /// Returns a non-recurring copy of this event at the given start.
    pub fn instance_at(&self, start: DateTime<Utc>) -> Self {
        let end = start.checked_add_signed(self.duration()).unwrap_or(start);
        Self {
            start,
            end,
            recurrence: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn frequency_from_rrule() {
        assert_eq!(Frequency::from_rrule("DAILY"), Frequency::Daily);
        assert_eq!(Frequency::from_rrule("weekly"), Frequency::Weekly);
        assert_eq!(Frequency::from_rrule("Monthly"), Frequency::Monthly);
        assert_eq!(Frequency::from_rrule("YEARLY"), Frequency::Yearly);
        assert_eq!(Frequency::from_rrule("HOURLY"), Frequency::Daily);
        assert_eq!(Frequency::from_rrule(""), Frequency::Daily);
    }

    #[test]
    fn effective_interval_normalizes() {
        let rule = RecurrenceRule::new(Frequency::Daily);
        assert_eq!(rule.clone().with_interval(0).effective_interval(), 1);
        assert_eq!(rule.clone().with_interval(-4).effective_interval(), 1);
        assert_eq!(rule.with_interval(3).effective_interval(), 3);
    }

    #[test]
    fn rrule_rendering() {
        let rule = RecurrenceRule::new(Frequency::Weekly);
        assert_eq!(rule.to_rrule(), "FREQ=WEEKLY");

        let rule = RecurrenceRule::new(Frequency::Monthly)
            .with_interval(2)
            .with_count(6)
            .with_until(utc(2025, 12, 31, 0, 0));
        assert_eq!(
            rule.to_rrule(),
            "FREQ=MONTHLY;INTERVAL=2;COUNT=6;UNTIL=20251231T000000Z"
        );
    }

    #[test]
    fn new_clamps_end() {
        let event = Event::new("e1", "Backwards", utc(2025, 1, 2, 10, 0), utc(2025, 1, 1, 10, 0));
        assert_eq!(event.end, event.start);
    }

    #[test]
    fn duration_of_all_day_event() {
        let start = utc(2025, 1, 1, 0, 0);
        let event = Event::new("e1", "Holiday", start, start).with_all_day(true);
        assert_eq!(event.duration(), Duration::days(1));

        let event = Event::new("e2", "Trip", start, start + Duration::days(3)).with_all_day(true);
        assert_eq!(event.duration(), Duration::days(3));
    }

    #[test]
    fn instance_drops_recurrence() {
        let start = utc(2025, 1, 1, 9, 0);
        let event = Event::new("e1", "Standup", start, start + Duration::minutes(15))
            .with_location("Room 1")
            .with_recurrence(RecurrenceRule::new(Frequency::Daily));

        let instance = event.instance_at(start + Duration::days(2));
        assert!(!instance.is_recurring());
        assert_eq!(instance.start, utc(2025, 1, 3, 9, 0));
        assert_eq!(instance.end, utc(2025, 1, 3, 9, 15));
        assert_eq!(instance.location.as_deref(), Some("Room 1"));
        assert_eq!(instance.uid, "e1");
    }

    #[test]
    fn zone_round_trips_through_text() {
        let berlin: EventZone = "Europe/Berlin".parse().unwrap();
        assert_eq!(berlin, EventZone::Named(chrono_tz::Europe::Berlin));
        assert_eq!(berlin.to_string(), "Europe/Berlin");
        assert_eq!("UTC".parse::<EventZone>().unwrap(), EventZone::Utc);
        assert_eq!("local".parse::<EventZone>().unwrap(), EventZone::Local);
        assert!("Mars/Olympus".parse::<EventZone>().is_err());
    }

    #[test]
    fn zone_resolves_wall_clock_times() {
        let berlin = EventZone::Named(chrono_tz::Europe::Berlin);
        let nine = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap().and_hms_opt(9, 0, 0).unwrap();

        assert_eq!(berlin.resolve(nine(24)), Some(utc(2025, 3, 24, 8, 0)));
        assert_eq!(berlin.resolve(nine(31)), Some(utc(2025, 3, 31, 7, 0)));
        assert_eq!(berlin.local_time(utc(2025, 3, 31, 7, 0)), nine(31));

        // 02:30 does not exist on the spring-forward day.
        let gap = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap().and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(berlin.resolve(gap), Some(utc(2025, 3, 30, 1, 30)));
    }

    #[test]
    fn serde_omits_empty_fields() {
        let event = Event::new("e1", "Lunch", utc(2025, 1, 1, 12, 0), utc(2025, 1, 1, 13, 0))
            .with_calendar("home");
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("description").is_none());
        assert!(json.get("recurrence").is_none());
        assert!(json.get("zone").is_none());
        assert_eq!(json["calendar"], "home");

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);

        let zoned = event.with_zone(EventZone::Named(chrono_tz::Asia::Tokyo));
        let json = serde_json::to_value(&zoned).unwrap();
        assert_eq!(json["zone"], "Asia/Tokyo");
        assert_eq!(serde_json::from_value::<Event>(json).unwrap(), zoned);
    }
}
