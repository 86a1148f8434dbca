//! `calcli import`.

use std::io::Write;

use calcli_store::{Calendars, StoreError, parse_events};
use tracing::{debug, info};

use super::{new_uid, select_calendar};
use crate::cli::ImportArgs;
use crate::error::{CliError, CliResult};

/// Copies every VEVENT of an `.ics` file into a calendar, one file per
/// event. Returns the number of imported events.
pub async fn run<W: Write>(
    calendars: &Calendars,
    default_calendar: &str,
    args: &ImportArgs,
    out: &mut W,
) -> CliResult<usize> {
    let calendar = args.calendar.as_deref().unwrap_or(default_calendar);
    let store = select_calendar(calendars, calendar)?;

    let content = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| StoreError::io(&args.file, &e))?;
    let events = parse_events(&content).map_err(|e| StoreError::parse(&args.file, e))?;
    if events.is_empty() {
        return Err(CliError::invalid(format!(
            "no events found in {}",
            args.file.display()
        )));
    }

    for mut event in events.iter().cloned() {
        if args.random_uid {
            let uid = new_uid();
            debug!(old = %event.uid, new = %uid, "Replacing imported UID");
            event.uid = uid;
        }
        store.create_event(&event).await?;
    }

    info!(count = events.len(), calendar = %calendar, "Imported events");
    writeln!(out, "Successfully imported {} events", events.len())?;
    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::output;
    use calcli_store::EventCache;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TWO_EVENTS: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        PRODID:-//test//EN\r\n\
        BEGIN:VEVENT\r\n\
        UID:team-sync\r\n\
        DTSTART:20250310T090000Z\r\n\
        DTEND:20250310T093000Z\r\n\
        SUMMARY:Team sync\r\n\
        RRULE:FREQ=WEEKLY;COUNT=4\r\n\
        END:VEVENT\r\n\
        BEGIN:VEVENT\r\n\
        UID:dentist/42\r\n\
        DTSTART:20250312T140000Z\r\n\
        DTEND:20250312T150000Z\r\n\
        SUMMARY:Dentist\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    fn calendars(dir: &TempDir) -> Calendars {
        let mut calendars = Calendars::new(Arc::new(EventCache::default()));
        calendars.add("home", dir.path().join("home"), false);
        calendars.add("work", dir.path().join("work"), false);
        calendars
    }

    fn write_source(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("invite.ics");
        std::fs::write(&path, TWO_EVENTS).unwrap();
        path
    }

    #[tokio::test]
    async fn imports_each_event_into_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let calendars = calendars(&dir);
        let args = ImportArgs {
            file: write_source(dir.path()),
            ..ImportArgs::default()
        };

        let mut buf = Vec::new();
        let count = run(&calendars, "home", &args, &mut buf).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(output(buf), "Successfully imported 2 events\n");

        assert!(dir.path().join("home/team-sync.ics").exists());
        assert!(dir.path().join("home/dentist_42.ics").exists());

        let sync = calendars.find_event("team-sync").await.unwrap();
        assert_eq!(sync.calendar, "home");
        assert_eq!(sync.recurrence.unwrap().count, Some(4));
        assert_eq!(calendars.find_event("dentist/42").await.unwrap().summary, "Dentist");
    }

    #[tokio::test]
    async fn random_uids_and_target_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let calendars = calendars(&dir);
        let args = ImportArgs {
            file: write_source(dir.path()),
            random_uid: true,
            calendar: Some("work".into()),
        };

        let mut buf = Vec::new();
        run(&calendars, "home", &args, &mut buf).await.unwrap();

        let events = calendars.get("work").unwrap().list_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.uid.starts_with("calcli-")));
        assert!(calendars.get("home").unwrap().list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let calendars = calendars(&dir);
        let args = ImportArgs {
            file: dir.path().join("nope.ics"),
            ..ImportArgs::default()
        };

        let mut buf = Vec::new();
        let err = run(&calendars, "home", &args, &mut buf).await.unwrap_err();
        assert!(matches!(err, CliError::Store(StoreError::Io { .. })));
    }

    #[tokio::test]
    async fn file_without_events_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let calendars = calendars(&dir);
        let file = dir.path().join("empty.ics");
        std::fs::write(&file, "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n").unwrap();

        let mut buf = Vec::new();
        let args = ImportArgs {
            file,
            ..ImportArgs::default()
        };
        assert!(run(&calendars, "home", &args, &mut buf).await.is_err());
        assert!(buf.is_empty());
        assert!(!dir.path().join("home").exists());
    }
}
