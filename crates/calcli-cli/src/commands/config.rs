//! Configuration commands.

use std::io::Write;
use std::path::Path;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Dump the effective configuration as TOML.
pub fn dump<W: Write>(config: &CliConfig, path: &Path, out: &mut W) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::Serialize(format!("failed to serialize config: {}", e)))?;
    writeln!(out, "# config.toml ({})", path.display())?;
    writeln!(out, "{}", toml_str)?;
    Ok(())
}

/// Validate the configuration.
pub fn validate<W: Write>(config: &CliConfig, out: &mut W) -> CliResult<()> {
    config.validate().map_err(CliError::Config)?;

    for (name, settings) in &config.calendars {
        let path = crate::config::expand_path(&settings.path);
        if !path.is_dir() {
            writeln!(
                out,
                "note: calendar '{}' directory {} does not exist yet",
                name,
                path.display()
            )?;
        }
    }

    writeln!(out, "Configuration is valid.")?;
    Ok(())
}

/// Show the configuration file path.
pub fn path<W: Write>(path: &Path, out: &mut W) -> CliResult<()> {
    writeln!(out, "config: {}", path.display())?;
    Ok(())
}
