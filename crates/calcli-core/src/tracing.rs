//! Log output for calcli.
//!
//! Every crate in the workspace emits `tracing` events; the binary installs
//! one subscriber at startup:
//!
//! ```ignore
//! use calcli_core::tracing::{init_tracing, TracingConfig};
//!
//! let config = if debug { TracingConfig::cli_debug() } else { TracingConfig::cli() };
//! init_tracing(config)?;
//! ```
//!
//! `RUST_LOG` takes precedence over the preset level unless the config
//! carries its own filter directive. Logs go to stderr, leaving stdout to
//! command output.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Crates whose events pass the default filter.
const CRATES: [&str; 4] = ["calcli", "calcli_cli", "calcli_core", "calcli_store"];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, indented
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// JSON lines
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level used when neither `env_filter` nor `RUST_LOG` is set
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Source file and line of each event
    pub include_location: bool,
    /// Module path of each event
    pub include_target: bool,
    pub include_timestamp: bool,
    /// Explicit filter directive, overriding both `RUST_LOG` and the level
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli()
    }
}

impl TracingConfig {
    /// Warnings and errors only, no decorations.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
            env_filter: None,
        }
    }

    /// Everything down to debug, with timestamps and source locations.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_location: true,
            include_target: true,
            include_timestamp: true,
            ..Self::cli()
        }
    }

    #[must_use]
    pub fn with_level(self, default_level: Level) -> Self {
        Self {
            default_level,
            ..self
        }
    }

    #[must_use]
    pub fn with_format(self, output_format: TracingOutputFormat) -> Self {
        Self {
            output_format,
            ..self
        }
    }

    #[must_use]
    pub fn with_env_filter(self, directive: impl Into<String>) -> Self {
        Self {
            env_filter: Some(directive.into()),
            ..self
        }
    }

    /// Resolves the filter: explicit directive, then `RUST_LOG`, then the
    /// default level for the calcli crates.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit directive does not parse.
    pub fn build_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(directive) = self.env_filter.as_deref() {
            return Ok(EnvFilter::try_new(directive)?);
        }
        Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(self.default_level))))
    }

    fn fmt_layer(&self) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(self.include_target);

        match (self.output_format, self.include_timestamp) {
            (TracingOutputFormat::Pretty, _) => layer.pretty().boxed(),
            (TracingOutputFormat::Json, _) => layer.json().boxed(),
            (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
            (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
        }
    }
}

fn default_directive(level: Level) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. Call once, early in `main`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the filter
/// directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.build_filter()?;
    let subscriber = tracing_subscriber::registry().with(config.fmt_layer().with_filter(filter));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_preset_is_quiet() {
        let config = TracingConfig::cli();
        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(!config.include_location);
        assert!(!config.include_timestamp);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn default_is_cli_preset() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::WARN);
        assert!(!config.include_target);
    }

    #[test]
    fn debug_preset_adds_detail() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(config.include_location);
        assert!(config.include_timestamp);
    }

    #[test]
    fn builders_override_fields() {
        let config = TracingConfig::cli()
            .with_level(Level::TRACE)
            .with_format(TracingOutputFormat::Json)
            .with_env_filter("calcli_store=trace");

        assert_eq!(config.default_level, Level::TRACE);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("calcli_store=trace"));
    }

    #[test]
    fn explicit_filter_must_parse() {
        let bad = TracingConfig::cli().with_env_filter("calcli=notalevel");
        assert!(matches!(bad.build_filter(), Err(TracingError::EnvFilter(_))));

        let good = TracingConfig::cli().with_env_filter("calcli=debug");
        assert!(good.build_filter().is_ok());
    }

    #[test]
    fn default_directive_names_every_crate() {
        assert_eq!(
            default_directive(Level::DEBUG),
            "calcli=DEBUG,calcli_cli=DEBUG,calcli_core=DEBUG,calcli_store=DEBUG"
        );
    }
}
