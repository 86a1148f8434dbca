//! Core types: events, recurrence expansion, time parsing, search, formatting

pub mod event;
pub mod format;
pub mod recurrence;
pub mod search;
pub mod time;
pub mod tracing;

pub use event::{Event, EventZone, Frequency, RecurrenceRule};
pub use format::{
    EventFormatter, FormatOptions, JsonEvent, JsonOutput, MonthView, OutputFormat, TimeFormat,
    ellipsis,
};
pub use recurrence::{DEFAULT_MAX_OCCURRENCES, Expansion, expand, expand_default};
pub use search::{SearchField, matches_event};
pub use time::{QueryWindow, TimeParseError, parse_date, parse_date_end, parse_duration, parse_time};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
