//! Command-line interface definition.

use std::path::PathBuf;

use calcli_core::{Frequency, SearchField};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// calcli - a personal calendar in plain .ics files
#[derive(Debug, Parser)]
#[command(name = "calcli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short = 'c', env = "CALCLI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Subcommand to run (defaults to `list`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List events, expanding recurring ones
    List(ListArgs),

    /// Search events by text
    Search(SearchArgs),

    /// Create a new event
    New(NewArgs),

    /// Change an existing event
    Edit(EditArgs),

    /// Import events from an .ics file
    Import(ImportArgs),

    /// Show configured calendars
    Calendars,

    /// Show a month calendar with its events
    Month(MonthArgs),

    /// Clear and rebuild the event cache
    Reindex,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// First day to show (today, tomorrow, +3d, -1w, YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day to show, inclusive
    #[arg(long)]
    pub to: Option<String>,

    /// Only show events from this calendar
    #[arg(long)]
    pub calendar: Option<String>,

    /// Append event UIDs
    #[arg(long)]
    pub show_uid: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Text to look for (case-insensitive)
    pub query: String,

    /// Field to search: any, title, desc or location
    #[arg(long, default_value_t = SearchField::Any)]
    pub field: SearchField,

    /// Append event UIDs
    #[arg(long)]
    pub show_uid: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct NewArgs {
    /// Event title
    pub title: String,

    /// Start time (HH:MM, YYYY-MM-DD HH:MM); a date with --all-day.
    /// Defaults to the next full hour, or today for all-day events.
    #[arg(long)]
    pub when: Option<String>,

    /// Duration such as 1h, 30m or 1h30m (default 1h)
    #[arg(long)]
    pub duration: Option<String>,

    /// Event location
    #[arg(long)]
    pub location: Option<String>,

    /// Event description
    #[arg(long)]
    pub description: Option<String>,

    /// Repeat the event
    #[arg(long, value_enum)]
    pub repeat: Option<Repeat>,

    /// Repeat every N days/weeks/months/years
    #[arg(long)]
    pub interval: Option<u32>,

    /// Stop after this many occurrences
    #[arg(long)]
    pub count: Option<u32>,

    /// Last day an occurrence may start on
    #[arg(long)]
    pub until: Option<String>,

    /// Create an all-day event
    #[arg(long)]
    pub all_day: bool,

    /// Calendar to write to (defaults to the configured default)
    #[arg(long)]
    pub calendar: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    /// UID of the event (see `list --show-uid`)
    pub uid: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New start time; the event keeps its duration unless --duration is given
    #[arg(long)]
    pub when: Option<String>,

    /// New duration
    #[arg(long)]
    pub duration: Option<String>,

    /// New location (empty to clear)
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ImportArgs {
    /// The .ics file to import
    pub file: PathBuf,

    /// Give every imported event a fresh UID
    #[arg(long)]
    pub random_uid: bool,

    /// Calendar to import into (defaults to the configured default)
    #[arg(long)]
    pub calendar: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MonthArgs {
    /// Month to show as YYYY-MM (defaults to the current month)
    #[arg(long)]
    pub date: Option<String>,
}

/// Recurrence frequency accepted by `new --repeat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Repeat {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<Repeat> for Frequency {
    fn from(repeat: Repeat) -> Self {
        match repeat {
            Repeat::Daily => Frequency::Daily,
            Repeat::Weekly => Frequency::Weekly,
            Repeat::Monthly => Frequency::Monthly,
            Repeat::Yearly => Frequency::Yearly,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Dump,
    /// Validate the configuration
    Validate,
    /// Show the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["calcli"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn parse_list_flags() {
        let cli = Cli::try_parse_from([
            "calcli", "list", "--from", "today", "--to", "+1w", "--show-uid", "--json",
        ])
        .unwrap();
        let Some(Command::List(args)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.from.as_deref(), Some("today"));
        assert_eq!(args.to.as_deref(), Some("+1w"));
        assert!(args.show_uid);
        assert!(args.json);
        assert!(args.calendar.is_none());
    }

    #[test]
    fn parse_new_with_repeat() {
        let cli = Cli::try_parse_from([
            "calcli",
            "new",
            "Standup",
            "--when",
            "2025-03-03 09:30",
            "--repeat",
            "weekly",
            "--interval",
            "2",
            "--count",
            "10",
        ])
        .unwrap();
        let Some(Command::New(args)) = cli.command else {
            panic!("expected new");
        };
        assert_eq!(args.title, "Standup");
        assert_eq!(args.repeat, Some(Repeat::Weekly));
        assert_eq!(args.interval, Some(2));
        assert_eq!(args.count, Some(10));
        assert_eq!(Frequency::from(Repeat::Weekly), Frequency::Weekly);
    }

    #[test]
    fn parse_search_field() {
        let cli = Cli::try_parse_from(["calcli", "search", "lunch", "--field", "location"]).unwrap();
        let Some(Command::Search(args)) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, "lunch");
        assert_eq!(args.field, SearchField::Location);

        assert!(Cli::try_parse_from(["calcli", "search", "x", "--field", "colour"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["calcli", "calendars", "--debug", "--config", "/tmp/c.toml"])
            .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Some(Command::Calendars)));
    }

    #[test]
    fn parse_config_action() {
        let cli = Cli::try_parse_from(["calcli", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Path
            })
        ));
    }
}
