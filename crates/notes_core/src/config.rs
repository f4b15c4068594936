//! Configuration file and provider settings resolution.
//!
//! # Responsibility
//! - Locate, read and atomically write the JSON config file.
//! - Resolve effective provider settings from explicit input, environment
//!   and the config file.
//! - Produce a display summary that never contains secrets.
//!
//! # Invariants
//! - A missing config file is `Ok(None)`, not an error.
//! - `save_config` never leaves a half-written file behind.
//! - Resolution priority: explicit > environment > config file > default.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_ENV: &str = "NOTES_CONFIG_DIR";
pub const PROVIDER_ENV: &str = "NOTES_PROVIDER";
pub const APPSHEET_APP_ID_ENV: &str = "APPSHEET_APP_ID";
pub const APPSHEET_API_KEY_ENV: &str = "APPSHEET_API_KEY";
pub const APPSHEET_TABLE_ENV: &str = "APPSHEET_TABLE_NAME";
pub const SQLITE_PATH_ENV: &str = "NOTES_SQLITE_PATH";

pub const DEFAULT_PROVIDER: &str = "appsheet";
pub const DEFAULT_NOTE_TABLE: &str = "Note";
const CONFIG_FILE_NAME: &str = "config.json";
const SQLITE_FILE_NAME: &str = "notes.sqlite3";

/// Environment lookup, injectable for tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads the process environment, treating blank values as unset.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Config/settings errors.
#[derive(Debug)]
pub enum ConfigError {
    /// No usable configuration exists at `path`.
    Missing(PathBuf),
    /// Neither `NOTES_CONFIG_DIR` nor `HOME` is set.
    NoConfigDir,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(path) => write!(
                f,
                "no config found at {}; run `notes config import <file.json>`",
                path.display()
            ),
            Self::NoConfigDir => write!(
                f,
                "cannot locate config directory; set {CONFIG_DIR_ENV} or HOME"
            ),
            Self::Io { path, source } => write!(f, "cannot access {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid JSON in {}: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Missing(_) | Self::NoConfigDir => None,
        }
    }
}

/// On-disk config document.
///
/// ```json
/// {"provider": "appsheet",
///  "appsheet": {"app_id": "...", "api_key": "...", "note_table": "Note"}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appsheet: Option<AppSheetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSheetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_table: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Effective settings handed to a provider factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Lower-case registry id.
    pub provider_id: String,
    pub appsheet: AppSheetConfig,
    pub sqlite_path: PathBuf,
}

impl ProviderSettings {
    /// Resolves settings for a running process.
    ///
    /// Provider id: `explicit`, then `NOTES_PROVIDER`, then the config file,
    /// then `appsheet`. Individual AppSheet fields prefer the config file and
    /// fall back to `APPSHEET_*` variables; the note table defaults to `Note`.
    pub fn resolve(
        config: Option<&NotesConfig>,
        explicit: Option<&str>,
        env: EnvLookup<'_>,
        config_dir: &Path,
    ) -> Self {
        let provider_id = explicit
            .map(str::to_string)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| env(PROVIDER_ENV))
            .or_else(|| config.and_then(|config| config.provider.clone()))
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        let file = config.and_then(|config| config.appsheet.clone()).unwrap_or_default();
        let appsheet = AppSheetConfig {
            app_id: non_blank(file.app_id).or_else(|| env(APPSHEET_APP_ID_ENV)),
            api_key: non_blank(file.api_key).or_else(|| env(APPSHEET_API_KEY_ENV)),
            note_table: non_blank(file.note_table)
                .or_else(|| env(APPSHEET_TABLE_ENV))
                .or_else(|| Some(DEFAULT_NOTE_TABLE.to_string())),
            attachment_table: non_blank(file.attachment_table),
        };

        let sqlite_path = config
            .and_then(|config| config.sqlite.as_ref())
            .and_then(|sqlite| sqlite.path.clone())
            .or_else(|| env(SQLITE_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| config_dir.join(SQLITE_FILE_NAME));

        Self {
            provider_id: provider_id.trim().to_lowercase(),
            appsheet,
            sqlite_path,
        }
    }

    /// Resolves settings from the file alone, with no environment fallback.
    ///
    /// Used to validate a proposed config before it is saved.
    pub fn from_file(config: &NotesConfig, config_dir: &Path) -> Self {
        let file = config.appsheet.clone().unwrap_or_default();
        let settings = Self::resolve(Some(config), None, &|_| None, config_dir);
        Self {
            appsheet: AppSheetConfig {
                note_table: non_blank(file.note_table),
                ..settings.appsheet
            },
            ..settings
        }
    }
}

/// Display-safe view of a config file; API keys are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appsheet: Option<AppSheetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSheetSummary {
    pub app_id: String,
    pub note_table: String,
    pub attachment_table: String,
}

impl NotesConfig {
    /// Summarizes non-sensitive settings for display.
    pub fn summary(&self) -> ConfigSummary {
        let not_set = || "(not set)".to_string();
        ConfigSummary {
            provider: self.provider.clone().unwrap_or_else(|| "unknown".to_string()),
            appsheet: self.appsheet.as_ref().map(|appsheet| AppSheetSummary {
                app_id: appsheet.app_id.clone().unwrap_or_else(not_set),
                note_table: appsheet.note_table.clone().unwrap_or_else(not_set),
                attachment_table: appsheet.attachment_table.clone().unwrap_or_else(not_set),
            }),
            sqlite: self.sqlite.clone(),
        }
    }
}

/// Returns the config directory: `$NOTES_CONFIG_DIR`, else `$HOME/.config/notes`.
pub fn config_dir(env: EnvLookup<'_>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env(CONFIG_DIR_ENV) {
        return Ok(expand_home(&dir, env));
    }
    env("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("notes"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Returns the config file path inside `dir`.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Loads the config file; a missing file yields `Ok(None)`.
pub fn load_config(path: &Path) -> Result<Option<NotesConfig>, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_config(&raw, path).map(Some)
}

/// Reads a proposed config document from any path.
pub fn read_config_file(path: &Path) -> Result<NotesConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

/// Writes the config as pretty JSON via temp file + rename.
pub fn save_config(path: &Path, config: &NotesConfig) -> Result<(), ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let body = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, body).map_err(io_error)?;
    std::fs::rename(&temp_path, path).map_err(io_error)?;

    log::info!(
        "event=config_save module=config status=ok path={}",
        path.display()
    );
    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> Result<NotesConfig, ConfigError> {
    serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn expand_home(dir: &str, env: EnvLookup<'_>) -> PathBuf {
    match (dir.strip_prefix("~/"), env("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(dir),
    }
}

#[cfg(test)]
mod tests {
    use super::{config_dir, ConfigError, NotesConfig, ProviderSettings};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_dir_prefers_override_then_home() {
        let env = env_of(&[("NOTES_CONFIG_DIR", "~/notes-cfg"), ("HOME", "/home/ada")]);
        assert_eq!(config_dir(&env).unwrap(), PathBuf::from("/home/ada/notes-cfg"));

        let env = env_of(&[("HOME", "/home/ada")]);
        assert_eq!(
            config_dir(&env).unwrap(),
            PathBuf::from("/home/ada/.config/notes")
        );

        let env = env_of(&[]);
        assert!(matches!(config_dir(&env), Err(ConfigError::NoConfigDir)));
    }

    #[test]
    fn from_file_ignores_environment_and_default_table() {
        let config: NotesConfig =
            serde_json::from_str(r#"{"provider":"appsheet","appsheet":{"app_id":"a"}}"#).unwrap();
        let settings = ProviderSettings::from_file(&config, Path::new("/cfg"));
        assert_eq!(settings.appsheet.app_id.as_deref(), Some("a"));
        assert_eq!(settings.appsheet.api_key, None);
        assert_eq!(settings.appsheet.note_table, None);
    }
}
