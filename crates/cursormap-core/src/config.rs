// Cursormap Config Parser - TOML with Serde
// Parses the filter table and mode from a TOML file

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::{ContinuationPolicy, EngineConfig};
use crate::table::{Replacement, SubstitutionEntry, SubstitutionTable, TABLE_LEN};
use crate::ModifierMode;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid modifier mode: {0}")]
    InvalidMode(String),

    #[error("Invalid continuation policy: {0}")]
    InvalidContinuation(String),

    #[error("Substitution table needs exactly 4 entries, found {0}")]
    TableSize(usize),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// Filter settings
    #[serde(default)]
    pub filter: Option<FilterToml>,

    /// Substitution entries (zero for the built-in table, or exactly four)
    #[serde(default)]
    pub substitution: Vec<SubstitutionToml>,
}

/// `[filter]` section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FilterToml {
    /// Mode name or patch-block byte
    pub mode: Option<ModeToml>,

    /// "preserve" or "reset-on-miss"
    pub continuation: Option<String>,
}

/// `[[substitution]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstitutionToml {
    pub key: NumberToml,
    pub replacement: NumberToml,
}

/// A number written either as an integer or as a string ("0x4D1E", "24")
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberToml {
    Int(i64),
    Text(String),
}

impl NumberToml {
    fn value(&self) -> Result<i64, ConfigError> {
        match self {
            NumberToml::Int(value) => Ok(*value),
            NumberToml::Text(text) => parse_number(text),
        }
    }
}

/// Parse a decimal, `0x`-hex, or `$`-hex number
pub fn parse_number(text: &str) -> Result<i64, ConfigError> {
    let trimmed = text.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| trimmed.strip_prefix('$'))
    {
        i64::from_str_radix(hex, 16)
    } else {
        trimmed.parse::<i64>()
    };
    parsed.map_err(|_| ConfigError::InvalidNumber(text.to_string()))
}

/// A mode written either as its name or as its patch-block byte
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModeToml {
    Name(String),
    Byte(i64),
}

impl ModeToml {
    pub fn resolve(&self) -> Result<ModifierMode, String> {
        match self {
            ModeToml::Name(name) => name
                .parse::<ModifierMode>()
                .map_err(|_| format!("unknown modifier mode '{}'", name)),
            ModeToml::Byte(value) => u8::try_from(*value)
                .ok()
                .and_then(ModifierMode::from_u8)
                .ok_or_else(|| format!("unknown modifier mode {}", value)),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Engine configuration ready for `RemapEngine::new`
    pub engine: EngineConfig,
    /// Path the config was loaded from, if any
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut config = Self::from_toml(&content)?;
        config.source_path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// Get the default config path (~/.config/cursormap/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cursormap").join("config.toml"))
    }

    /// Load from the default location, falling back to built-in defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_toml_path(path);
            }
        }
        log::debug!("no config file found, using built-in table");
        Ok(Self::default())
    }
}

impl ConfigToml {
    /// Convert to the resolved configuration
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let filter = self.filter.clone().unwrap_or_default();

        let mode = match &filter.mode {
            Some(mode) => mode.resolve().map_err(ConfigError::InvalidMode)?,
            None => ModifierMode::default(),
        };

        let continuation = match &filter.continuation {
            Some(name) => name
                .parse::<ContinuationPolicy>()
                .map_err(|_| ConfigError::InvalidContinuation(name.clone()))?,
            None => ContinuationPolicy::default(),
        };

        let table = self.to_table()?;
        let duplicates = table.duplicate_keys();
        if !duplicates.is_empty() {
            log::warn!(
                "substitution keys {:02X?} appear more than once; the last entry wins",
                duplicates
            );
        }

        log::debug!("config resolved: mode={} continuation={}", mode, continuation);

        Ok(Config {
            engine: EngineConfig {
                table,
                mode,
                continuation,
            },
            source_path: None,
        })
    }

    fn to_table(&self) -> Result<SubstitutionTable, ConfigError> {
        match self.substitution.len() {
            0 => Ok(SubstitutionTable::default()),
            TABLE_LEN => {
                let mut entries = [SubstitutionEntry::default(); TABLE_LEN];
                for (entry, toml_entry) in entries.iter_mut().zip(&self.substitution) {
                    let key = toml_entry.key.value()?;
                    let key = u8::try_from(key)
                        .map_err(|_| ConfigError::OutOfRange(format!("key {}", key)))?;
                    let replacement = toml_entry.replacement.value()?;
                    let replacement = u16::try_from(replacement).map_err(|_| {
                        ConfigError::OutOfRange(format!("replacement {}", replacement))
                    })?;
                    *entry = SubstitutionEntry::new(key, Replacement(replacement));
                }
                Ok(SubstitutionTable::new(entries))
            }
            other => Err(ConfigError::TableSize(other)),
        }
    }
}

/// Create default config content for a new installation
pub fn default_config_content() -> &'static str {
    r#"# Cursormap configuration
# Place this file at: ~/.config/cursormap/config.toml

[filter]
# "option", "caps-lock", or "caps-lock-neutralizing" (or 0, 1, 2)
mode = "caps-lock-neutralizing"
# "preserve" or "reset-on-miss"
continuation = "preserve"

# Exactly four entries. Keys are physical key codes; replacements are
# key code (high byte) and character code (low byte).
[[substitution]]
key = "0x18"          # =
replacement = "0x4D1E" # up arrow

[[substitution]]
key = "0x21"          # [
replacement = "0x461C" # left arrow

[[substitution]]
key = "0x1E"          # ]
replacement = "0x481F" # down arrow

[[substitution]]
key = "0x2A"          # \
replacement = "0x421D" # right arrow
"#
}
