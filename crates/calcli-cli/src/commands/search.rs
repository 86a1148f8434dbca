//! `calcli search`.

use std::fmt::Display;
use std::io::Write;

use calcli_core::{EventFormatter, FormatOptions, QueryWindow, matches_event};
use calcli_store::EventSource;
use chrono::{DateTime, Duration, Months, TimeZone, Utc};

use super::expand_events;
use crate::cli::SearchArgs;
use crate::error::CliResult;

/// How far back a search looks.
const LOOKBEHIND_DAYS: i64 = 30;

/// Prints the occurrences between 30 days ago and a year from now whose
/// `field` contains the query.
pub async fn run<S, Tz, W>(
    source: &S,
    args: &SearchArgs,
    now: &DateTime<Tz>,
    out: &mut W,
) -> CliResult<()>
where
    S: EventSource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    let window = search_window(now.with_timezone(&Utc));

    let matching: Vec<_> = source
        .list_events()
        .await?
        .into_iter()
        .filter(|event| matches_event(event, &args.query, args.field))
        .collect();
    let occurrences = expand_events(&matching, &window);

    if occurrences.events.is_empty() {
        writeln!(out, "No matching events.")?;
    } else {
        let formatter = EventFormatter::new(FormatOptions {
            show_uid: args.show_uid,
            ..FormatOptions::default()
        });
        write!(out, "{}", formatter.format_text(&occurrences.events, &now.timezone()))?;
    }
    occurrences.write_notes(out)
}

fn search_window(now: DateTime<Utc>) -> QueryWindow {
    let from = now - Duration::days(LOOKBEHIND_DAYS);
    let to = now
        .checked_add_months(Months::new(12))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    QueryWindow::new(from, to)
}
