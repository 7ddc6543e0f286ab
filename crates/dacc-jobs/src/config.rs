//! Configuration for capacity-calculation runs.
//!
//! The [`CcConfig`] is stored in `~/.dacc/config.toml` and supports partial
//! files where unspecified values use defaults.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use dacc_core::{CcError, CcResult};
use serde::{Deserialize, Serialize};

/// Longest accepted per-hour wait budget (one week).
pub const MAX_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;

/// Largest accepted per-day event buffer.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CcConfig {
    /// Business calendar and versioning.
    pub core: CoreConfig,

    /// Optimization engine interaction.
    pub engine: EngineConfig,

    /// Daily artifact export.
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// IANA name of the business timezone.
    pub timezone: String,

    /// Version used when a request does not carry one.
    pub default_version: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Brussels".to_string(),
            default_version: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wait budget per hourly job; also quoted in timeout messages.
    pub timeout_minutes: u64,

    /// Buffered job events per day before slow subscribers lag.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: 60,
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Wait budget as a duration, between one minute and [`MAX_TIMEOUT_MINUTES`].
    pub fn timeout(&self) -> CcResult<chrono::Duration> {
        if self.timeout_minutes == 0 || self.timeout_minutes > MAX_TIMEOUT_MINUTES {
            return Err(CcError::Config(format!(
                "engine.timeout_minutes must be between 1 and {MAX_TIMEOUT_MINUTES}, got {}",
                self.timeout_minutes
            )));
        }
        i64::try_from(self.timeout_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| {
                CcError::Config(format!(
                    "engine.timeout_minutes {} is not representable",
                    self.timeout_minutes
                ))
            })
    }

    pub fn validate(&self) -> CcResult<()> {
        self.timeout()?;
        if self.event_capacity == 0 || self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(CcError::Config(format!(
                "engine.event_capacity must be between 1 and {MAX_EVENT_CAPACITY}, got {}",
                self.event_capacity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root directory of the filesystem artifact store.
    pub output_root: PathBuf,

    /// Indent exported JSON documents.
    pub pretty_json: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("dacc-out"),
            pretty_json: true,
        }
    }
}

impl CcConfig {
    /// Get the default config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".dacc"))
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> CcResult<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> CcResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| CcError::Serialization(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be expressed in the types alone.
    pub fn validate(&self) -> CcResult<()> {
        self.timezone()?;
        self.engine.validate()
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> CcResult<()> {
        let path = Self::config_path()
            .ok_or_else(|| CcError::Config("could not determine config directory".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> CcResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| CcError::Serialization(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Parsed business timezone.
    pub fn timezone(&self) -> CcResult<Tz> {
        self.core
            .timezone
            .parse::<Tz>()
            .map_err(|e| CcError::Config(format!("unknown timezone '{}': {e}", self.core.timezone)))
    }
}
