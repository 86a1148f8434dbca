//! `calcli calendars`.

use std::io::Write;

use calcli_store::Calendars;

use crate::error::CliResult;

/// Prints one `name: path` line per configured calendar.
pub fn run<W: Write>(calendars: &Calendars, out: &mut W) -> CliResult<()> {
    if calendars.is_empty() {
        writeln!(out, "No calendars configured.")?;
        return Ok(());
    }

    for store in calendars.iter() {
        write!(out, "{}: {}", store.name(), store.path().display())?;
        if store.is_read_only() {
            write!(out, " (read-only)")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
