//! `calcli list`.

use std::fmt::Display;
use std::io::Write;

use calcli_core::{EventFormatter, FormatOptions, QueryWindow, parse_date, parse_date_end};
use calcli_store::EventSource;
use chrono::{DateTime, TimeZone, Utc};

use super::expand_events;
use crate::cli::ListArgs;
use crate::error::{CliError, CliResult};

/// Lists the events of `source` inside the requested window.
pub async fn run<S, Tz, W>(
    source: &S,
    args: &ListArgs,
    now: &DateTime<Tz>,
    out: &mut W,
) -> CliResult<()>
where
    S: EventSource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    let window = window(args, now)?;
    let occurrences = expand_events(&source.list_events().await?, &window);
    let events = &occurrences.events;

    let formatter = EventFormatter::new(FormatOptions {
        show_uid: args.show_uid,
        ..FormatOptions::default()
    });
    let tz = now.timezone();

    if args.json {
        // JSON stays machine-readable; truncation is only logged.
        let json = serde_json::to_string_pretty(&formatter.format_json(events, &tz))?;
        writeln!(out, "{}", json)?;
        return Ok(());
    }

    if events.is_empty() {
        writeln!(out, "No events found.")?;
    } else {
        write!(out, "{}", formatter.format_text(events, &tz))?;
    }
    occurrences.write_notes(out)
}

fn window<Tz: TimeZone>(args: &ListArgs, now: &DateTime<Tz>) -> CliResult<QueryWindow> {
    let from = args.from.as_deref().map(|s| parse_date(s, now)).transpose()?;
    let to = args.to.as_deref().map(|s| parse_date_end(s, now)).transpose()?;
    let window = QueryWindow::from_bounds(from, to, now.with_timezone(&Utc));

    if window.from > window.to {
        return Err(CliError::invalid("--from must not be after --to"));
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeSource, output, utc};
    use calcli_core::{Event, Frequency, RecurrenceRule};
    use chrono::{Duration, FixedOffset};

    fn source() -> FakeSource {
        let standup_start = utc(2025, 3, 3, 9, 0);
        FakeSource::new(vec![
            Event::new("lunch-1", "Lunch", utc(2025, 3, 4, 12, 0), utc(2025, 3, 4, 13, 0))
                .with_location("Cafe"),
            Event::new(
                "standup",
                "Standup",
                standup_start,
                standup_start + Duration::minutes(15),
            )
            .with_recurrence(RecurrenceRule::new(Frequency::Daily).with_count(3)),
            Event::new("old", "Old news", utc(2024, 1, 1, 8, 0), utc(2024, 1, 1, 9, 0)),
        ])
    }

    fn args(from: Option<&str>, to: Option<&str>) -> ListArgs {
        ListArgs {
            from: from.map(String::from),
            to: to.map(String::from),
            ..ListArgs::default()
        }
    }

    #[tokio::test]
    async fn lists_window_with_expanded_occurrences() {
        let now = utc(2025, 3, 3, 8, 0);
        let mut buf = Vec::new();
        run(&source(), &args(Some("today"), Some("+2d")), &now, &mut buf)
            .await
            .unwrap();

        assert_eq!(
            output(buf),
            "2025-03-03 09:00 - 09:15 Standup\n\
             2025-03-04 09:00 - 09:15 Standup\n\
             2025-03-04 12:00 - 13:00 Lunch\n\
             \x20 @ Cafe\n\
             2025-03-05 09:00 - 09:15 Standup\n"
        );
    }

    #[tokio::test]
    async fn default_window_starts_at_dawn_of_time() {
        let now = utc(2025, 3, 3, 8, 0);
        let mut buf = Vec::new();
        run(&source(), &ListArgs::default(), &now, &mut buf).await.unwrap();

        let text = output(buf);
        assert!(text.starts_with("2024-01-01 08:00 - 09:00 Old news\n"), "{text}");
        assert_eq!(text.matches("Standup").count(), 3);
    }

    #[tokio::test]
    async fn renders_in_local_timezone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = utc(2025, 3, 4, 8, 0).with_timezone(&tz);
        let only_lunch = FakeSource::new(vec![Event::new(
            "lunch-1",
            "Lunch",
            utc(2025, 3, 4, 12, 0),
            utc(2025, 3, 4, 13, 0),
        )]);

        let mut buf = Vec::new();
        let list = ListArgs {
            show_uid: true,
            ..ListArgs::default()
        };
        run(&only_lunch, &list, &now, &mut buf).await.unwrap();
        assert_eq!(output(buf), "2025-03-04 14:00 - 15:00 Lunch [lunch-1]\n");
    }

    #[tokio::test]
    async fn empty_window_prints_notice() {
        let now = utc(2025, 6, 1, 8, 0);
        let mut buf = Vec::new();
        run(&source(), &args(Some("today"), Some("today")), &now, &mut buf)
            .await
            .unwrap();
        assert_eq!(output(buf), "No events found.\n");
    }

    #[tokio::test]
    async fn json_output() {
        let now = utc(2025, 3, 4, 0, 0);
        let list = ListArgs {
            from: Some("today".into()),
            to: Some("today".into()),
            json: true,
            ..ListArgs::default()
        };
        let mut buf = Vec::new();
        run(&source(), &list, &now, &mut buf).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&output(buf)).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["events"][0]["title"], "Standup");
        assert_eq!(value["events"][1]["uid"], "lunch-1");
        assert_eq!(value["events"][1]["location"], "Cafe");
    }

    #[tokio::test]
    async fn notes_truncated_recurrence() {
        let now = utc(2025, 1, 1, 8, 0);
        let pill = FakeSource::new(vec![
            Event::new("pill", "Pill", utc(2025, 1, 1, 8, 0), utc(2025, 1, 1, 8, 5))
                .with_recurrence(RecurrenceRule::new(Frequency::Daily)),
        ]);

        let mut buf = Vec::new();
        run(&pill, &args(Some("today"), Some("2040-12-31")), &now, &mut buf)
            .await
            .unwrap();

        let text = output(buf);
        assert_eq!(text.matches(" Pill\n").count(), 5000);
        assert!(text.starts_with("2025-01-01 08:00 - 08:05 Pill\n"), "{text}");
        assert!(text.ends_with(
            "note: 'Pill' has more than 5000 occurrences in this range; later ones are not shown\n"
        ));
    }

    #[tokio::test]
    async fn json_output_has_no_truncation_note() {
        let now = utc(2025, 1, 1, 8, 0);
        let pill = FakeSource::new(vec![
            Event::new("pill", "Pill", utc(2025, 1, 1, 8, 0), utc(2025, 1, 1, 8, 5))
                .with_recurrence(RecurrenceRule::new(Frequency::Daily)),
        ]);
        let list = ListArgs {
            json: true,
            ..args(Some("today"), Some("2040-12-31"))
        };

        let mut buf = Vec::new();
        run(&pill, &list, &now, &mut buf).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output(buf)).unwrap();
        assert_eq!(value["count"], 5000);
    }

    #[tokio::test]
    async fn rejects_inverted_window() {
        let now = utc(2025, 3, 3, 8, 0);
        let mut buf = Vec::new();
        let err = run(&source(), &args(Some("+3d"), Some("today")), &now, &mut buf)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_bad_date() {
        let now = utc(2025, 3, 3, 8, 0);
        let mut buf = Vec::new();
        let err = run(&source(), &args(Some("someday"), None), &now, &mut buf)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported date format: someday");
    }
}
