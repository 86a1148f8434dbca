//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calcli/config.toml` by default:
//!
//! ```toml
//! [calendars.home]
//! path = "~/.local/share/calcli/home"
//! color = "blue"
//!
//! [calendars.holidays]
//! path = "~/calendars/holidays"
//! readonly = true
//!
//! [defaults]
//! default_calendar = "home"
//!
//! [cache]
//! enabled = true
//! max_size = 0
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use calcli_store::{Calendars, EventCache};
use serde::{Deserialize, Serialize};

const DEFAULT_CALENDAR: &str = "home";

// ---------------------------------------------------------------------------
// CliConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the calcli CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Debug mode.
    pub debug: bool,

    /// Calendars by name.
    pub calendars: BTreeMap<String, CalendarSettings>,

    /// Defaults for commands that write events.
    pub defaults: Defaults,

    /// Event cache settings.
    pub cache: CacheSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        let mut calendars = BTreeMap::new();
        calendars.insert(
            DEFAULT_CALENDAR.to_string(),
            CalendarSettings {
                path: Self::default_data_dir().join(DEFAULT_CALENDAR),
                color: Some("blue".to_string()),
                readonly: false,
            },
        );

        Self {
            debug: false,
            calendars,
            defaults: Defaults::default(),
            cache: CacheSettings::default(),
        }
    }
}

/// One calendar directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Directory holding the calendar's `.ics` files. `~/` is expanded.
    pub path: PathBuf,

    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Refuse writes to this calendar.
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Calendar used by `new` and `import` when `--calendar` is not given.
    pub default_calendar: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            default_calendar: DEFAULT_CALENDAR.to_string(),
        }
    }
}

/// Event cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,

    /// Soft limit on cached events, 0 for unlimited.
    pub max_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 0,
        }
    }
}

impl CliConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calcli")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calcli")
    }

    pub fn default_calendar_name(&self) -> &str {
        &self.defaults.default_calendar
    }

    /// Builds the calendar stores, all sharing one event cache.
    pub fn build_calendars(&self) -> Calendars {
        let cache = Arc::new(EventCache::with_max_size(
            self.cache.max_size,
            self.cache.enabled,
        ));
        let mut calendars = Calendars::new(cache);
        for (name, settings) in &self.calendars {
            calendars.add(name, expand_path(&settings.path), settings.readonly);
        }
        calendars
    }

    /// Checks the configuration for inconsistencies.
    pub fn validate(&self) -> Result<(), String> {
        if self.calendars.is_empty() {
            return Err("no calendars configured".to_string());
        }

        for (name, settings) in &self.calendars {
            if name.trim().is_empty() {
                return Err("calendar names must not be empty".to_string());
            }
            if settings.path.as_os_str().is_empty() {
                return Err(format!("calendar '{}' has an empty path", name));
            }
        }

        let default = self.default_calendar_name();
        if !self.calendars.contains_key(default) {
            return Err(format!(
                "default calendar '{}' is not configured (known: {})",
                default,
                self.calendars.keys().cloned().collect::<Vec<_>>().join(", ")
            ));
        }

        Ok(())
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
