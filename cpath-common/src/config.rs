//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. A missing file
//! is not an error: every field has a compiled default.
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CPATH_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::questionnaire::Tag;
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CPATH_ROOT_FOLDER";

/// Default HTTP port of the questionnaire service
pub const DEFAULT_PORT: u16 = 5790;

/// Database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "coursepath.db";

/// Credential issued to a newly registered school administrator
pub const DEFAULT_ADMIN_CREDENTIAL: &str = "CoursePath-Welcome-1";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database (and any custom question bank)
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    pub port: Option<u16>,

    /// Database file name, relative to the root folder
    pub database_file: Option<String>,

    /// Custom question bank file; built-in bank when absent
    pub question_bank: Option<PathBuf>,

    /// Credential handed to new school administrators
    pub default_admin_credential: Option<String>,

    pub logging: LoggingConfig,

    pub scoring: ScoringConfig,

    pub sessions: SessionsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Tie-break order, highest priority first
    pub priority: Option<Vec<Tag>>,
}

/// In-memory session lifetime
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Unsubmitted sessions idle this long are discarded
    pub idle_timeout_secs: u64,
    /// Submitted sessions stay readable this long
    pub submitted_retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 4 * 60 * 60,
            submitted_retention_secs: 10 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(
            self.database_file
                .as_deref()
                .unwrap_or(DEFAULT_DATABASE_FILE),
        )
    }

    /// Custom bank path; relative paths resolve against the root folder
    pub fn question_bank_path(&self, root_folder: &Path) -> Option<PathBuf> {
        self.question_bank.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                root_folder.join(path)
            }
        })
    }

    pub fn default_admin_credential(&self) -> &str {
        self.default_admin_credential
            .as_deref()
            .unwrap_or(DEFAULT_ADMIN_CREDENTIAL)
    }
}

/// Load bootstrap configuration
///
/// An explicit path must exist and parse. Without one, the platform config
/// locations are searched; finding nothing yields the defaults.
/// Returns the configuration and the file it came from, if any.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok((TomlConfig::default(), None)),
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = TomlConfig::from_toml_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok((config, Some(path)))
}

/// First existing platform config file
///
/// Linux tries `~/.config/coursepath/config.toml` then
/// `/etc/coursepath/config.toml`; other platforms use the user config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("coursepath").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/coursepath/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/coursepath (or /var/lib/coursepath for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("coursepath"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/coursepath"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/coursepath
        dirs::data_dir()
            .map(|d| d.join("coursepath"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/coursepath"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\coursepath
        dirs::data_local_dir()
            .map(|d| d.join("coursepath"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\coursepath"))
    } else {
        PathBuf::from("./coursepath_data")
    }
}
