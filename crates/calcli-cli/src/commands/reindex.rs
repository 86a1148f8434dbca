//! `calcli reindex`.

use std::io::Write;

use calcli_store::Calendars;

use crate::error::{CliError, CliResult};

/// Drops the event cache and reloads every calendar into it.
pub async fn run<W: Write>(calendars: &Calendars, out: &mut W) -> CliResult<()> {
    if !calendars.cache().is_enabled() {
        return Err(CliError::invalid(
            "the event cache is disabled; set [cache] enabled = true to use reindex",
        ));
    }

    let stats = calendars.reindex().await?;
    writeln!(out, "Cache cleared. Removed {} cached events.", stats.before)?;
    writeln!(out, "Reindexed {} events.", stats.after)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::output;
    use calcli_core::Event;
    use calcli_store::EventCache;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_before_and_after() {
        let dir = tempfile::tempdir().unwrap();
        let mut calendars = Calendars::new(Arc::new(EventCache::new(true)));
        calendars.add("home", dir.path(), false);

        let start = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        let store = calendars.get("home").unwrap();
        for uid in ["one", "two", "three"] {
            store
                .create_event(&Event::new(uid, uid, start, start + Duration::hours(1)))
                .await
                .unwrap();
        }
        calendars.list_events().await.unwrap();
        assert_eq!(calendars.cache().size(), 3);

        // A file added behind the cache's back shows up after the rebuild.
        std::fs::write(
            dir.path().join("four.ics"),
            calcli_store::generate_event(&Event::new("four", "four", start, start)),
        )
        .unwrap();

        let mut buf = Vec::new();
        run(&calendars, &mut buf).await.unwrap();
        assert_eq!(
            output(buf),
            "Cache cleared. Removed 3 cached events.\nReindexed 4 events.\n"
        );
        assert_eq!(calendars.cache().size(), 4);
    }

    #[tokio::test]
    async fn disabled_cache_is_an_error() {
        let calendars = Calendars::new(Arc::new(EventCache::disabled()));
        let mut buf = Vec::new();
        let err = run(&calendars, &mut buf).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
        assert!(buf.is_empty());
    }
}
