//! Output formatting for calendar events.
//!
//! This module provides formatters for displaying events:
//! - **Text**: one line per event, optionally followed by its location
//! - **JSON**: machine-readable event list
//! - **Month**: a month grid with an event list (see [`month`])
//!
//! All formatters render times in a caller-supplied timezone so output is
//! reproducible in tests.

pub mod month;


use std::borrow::Cow;
use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;

pub use month::MonthView;

/// The output format for event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Time format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// 24-hour format (e.g., "14:30").
    #[default]
    H24,
    /// 12-hour format with AM/PM (e.g., "2:30 PM").
    H12,
}

impl TimeFormat {
    fn pattern(&self) -> &'static str {
        match self {
            Self::H24 => "%H:%M",
            Self::H12 => "%-I:%M %p",
        }
    }
}

/// Configuration options for output formatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Append the event UID to each line.
    pub show_uid: bool,
    /// Maximum length for event titles (truncated with ellipsis).
    pub max_title_length: Option<usize>,
    /// Time format preference.
    pub time_format: TimeFormat,
}

/// JSON output format for machine consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Number of events returned.
    pub count: usize,
    /// The events, in display order.
    pub events: Vec<JsonEvent>,
}

/// A single event in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEvent {
    /// Event UID.
    pub uid: String,
    /// Event title (may be truncated).
    pub title: String,
    /// Owning calendar.
    pub calendar: String,
    /// Start time in RFC 3339 format.
    pub start: String,
    /// End time in RFC 3339 format.
    pub end: String,
    /// Whether this is an all-day event.
    pub all_day: bool,
    /// Location, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Formatter for event listings.
#[derive(Debug, Clone, Default)]
pub struct EventFormatter {
    options: FormatOptions,
}

impl EventFormatter {
    /// Creates a new formatter with the given options.
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Creates a new formatter with default options.
    pub fn with_defaults() -> Self {
        Self::new(FormatOptions::default())
    }

    /// Returns the formatter options.
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Formats events as text, one entry per event.
    ///
    /// Each entry is `DATE START - END TITLE` (or `DATE all-day TITLE`),
    /// followed by an indented `@ LOCATION` line when a location is set.
    pub fn format_text<Tz>(&self, events: &[Event], tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        events
            .iter()
            .map(|event| self.format_event(event, tz))
            .collect()
    }

    /// Formats a single event, including the trailing newline.
    pub fn format_event<Tz>(&self, event: &Event, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let start = event.start.with_timezone(tz);
        let title = self.title(&event.summary);

        let mut out = if event.all_day {
            format!("{} all-day {}", start.format("%Y-%m-%d"), title)
        } else {
            let pattern = self.options.time_format.pattern();
            format!(
                "{} {} - {} {}",
                start.format("%Y-%m-%d"),
                start.format(pattern),
                event.end.with_timezone(tz).format(pattern),
                title
            )
        };

        if self.options.show_uid {
            out.push_str(&format!(" [{}]", event.uid));
        }
        out.push('\n');

        if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
            out.push_str(&format!("  @ {}\n", location));
        }
        out
    }

    /// Builds the JSON representation of `events`.
    pub fn format_json<Tz>(&self, events: &[Event], tz: &Tz) -> JsonOutput
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let events: Vec<JsonEvent> = events
            .iter()
            .map(|event| JsonEvent {
                uid: event.uid.clone(),
                title: self.title(&event.summary).into_owned(),
                calendar: event.calendar.clone(),
                start: rfc3339(event.start, tz),
                end: rfc3339(event.end, tz),
                all_day: event.all_day,
                location: event.location.clone(),
                description: event.description.clone(),
            })
            .collect();

        JsonOutput {
            count: events.len(),
            events,
        }
    }

    fn title<'a>(&self, title: &'a str) -> Cow<'a, str> {
        match self.options.max_title_length {
            Some(max) => ellipsis(title, max),
            None => Cow::Borrowed(title),
        }
    }
}

fn rfc3339<Tz>(dt: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.with_timezone(tz).to_rfc3339()
}

/// Truncates a string with ellipsis if it exceeds the given length.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}
