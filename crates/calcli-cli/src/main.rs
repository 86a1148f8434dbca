//! calcli CLI entry point.

use std::io;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;

use calcli_cli::cli::{Cli, Command, ConfigAction, ListArgs};
use calcli_cli::commands::{self, select_calendar};
use calcli_cli::config::CliConfig;
use calcli_cli::error::{CliError, CliResult};
use calcli_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let config = match cli.config {
        Some(ref path) => CliConfig::load_from(path),
        None => CliConfig::load(),
    }
    .map_err(CliError::Config)?;

    // Initialize tracing
    let tracing_config = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    let now = Local::now();
    let mut out = io::stdout();
    let calendars = config.build_calendars();
    let default_calendar = config.default_calendar_name();

    match cli.command.unwrap_or_else(|| Command::List(ListArgs::default())) {
        Command::List(args) => match args.calendar.as_deref() {
            Some(name) => {
                let store = select_calendar(&calendars, name)?;
                commands::list::run(store, &args, &now, &mut out).await
            }
            None => commands::list::run(&calendars, &args, &now, &mut out).await,
        },
        Command::Search(args) => commands::search::run(&calendars, &args, &now, &mut out).await,
        Command::New(args) => {
            commands::new::run(&calendars, default_calendar, &args, &now, &mut out)
                .await
                .map(drop)
        }
        Command::Edit(args) => commands::edit::run(&calendars, &args, &now, &mut out)
            .await
            .map(drop),
        Command::Import(args) => {
            commands::import::run(&calendars, default_calendar, &args, &mut out)
                .await
                .map(drop)
        }
        Command::Calendars => commands::calendars::run(&calendars, &mut out),
        Command::Month(args) => commands::month::run(&calendars, &args, &now, &mut out).await,
        Command::Reindex => commands::reindex::run(&calendars, &mut out).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path, &mut out),
            ConfigAction::Validate => commands::config::validate(&config, &mut out),
            ConfigAction::Path => commands::config::path(&config_path, &mut out),
        },
    }
}
