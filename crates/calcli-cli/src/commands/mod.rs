//! Command handlers.
//!
//! Handlers take the current time and an output writer so they can be
//! exercised in tests with a fixed clock and an in-memory buffer.

pub mod calendars;
pub mod config;
pub mod edit;
pub mod import;
pub mod list;
pub mod month;
pub mod new;
pub mod reindex;
pub mod search;

use std::io::Write;

use calcli_core::{DEFAULT_MAX_OCCURRENCES, Event, QueryWindow, expand_default};
use calcli_store::{Calendars, VdirStore};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CliError, CliResult};

/// Occurrences inside a query window.
#[derive(Debug, Default)]
pub struct Occurrences {
    /// Occurrences sorted by start.
    pub events: Vec<Event>,
    /// Summaries of recurring events whose expansion hit the step ceiling.
    pub truncated: Vec<String>,
}

impl Occurrences {
    /// Tells the user which events have occurrences missing from the output.
    pub fn write_notes<W: Write>(&self, out: &mut W) -> CliResult<()> {
        for summary in &self.truncated {
            writeln!(
                out,
                "note: '{}' has more than {} occurrences in this range; later ones are not shown",
                summary, DEFAULT_MAX_OCCURRENCES
            )?;
        }
        Ok(())
    }
}

/// Expands recurring events over `window` and keeps the one-off events that
/// overlap it.
pub fn expand_events(events: &[Event], window: &QueryWindow) -> Occurrences {
    let mut occurrences = Occurrences {
        events: Vec::with_capacity(events.len()),
        truncated: Vec::new(),
    };

    for event in events {
        if !event.is_recurring() {
            if window.overlaps(event.start, event.end) {
                occurrences.events.push(event.clone());
            }
            continue;
        }

        let expansion = expand_default(event, window.from, window.to);
        debug!(uid = %event.uid, occurrences = expansion.events.len(), "Expanded recurring event");
        if expansion.truncated {
            warn!(
                uid = %event.uid,
                limit = DEFAULT_MAX_OCCURRENCES,
                "Recurrence expansion truncated"
            );
            occurrences.truncated.push(event.summary.clone());
        }
        occurrences.events.extend(expansion.events);
    }

    occurrences
        .events
        .sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.uid.cmp(&b.uid)));
    occurrences
}

/// Looks up a configured calendar by name.
pub fn select_calendar<'a>(calendars: &'a Calendars, name: &str) -> CliResult<&'a VdirStore> {
    calendars.get(name).ok_or_else(|| {
        let known: Vec<&str> = calendars.iter().map(|store| store.name()).collect();
        CliError::Config(format!(
            "unknown calendar '{}' (known: {})",
            name,
            known.join(", ")
        ))
    })
}

/// Generates a UID for a new event.
pub fn new_uid() -> String {
    format!("calcli-{}", Uuid::new_v4().simple())
}
