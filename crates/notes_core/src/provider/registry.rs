//! In-process provider registry and config validation.
//!
//! # Responsibility
//! - Map provider ids to factories that build [`NotesProvider`] values.
//! - Validate a proposed config by building its provider and probing it.
//!
//! # Invariants
//! - Provider ids match `[a-z0-9_-]+`; lookups trim and lower-case input.
//! - `validate_config` reports failures in its result, never as `Err`.

use crate::config::{NotesConfig, ProviderSettings};
use crate::provider::appsheet::{AppSheetProvider, APPSHEET_PROVIDER_ID};
use crate::provider::sqlite::{SqliteNotesProvider, SQLITE_PROVIDER_ID};
use crate::provider::{ConnectionStats, NotesProvider, ProviderError, ProviderResult};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// Provider registration/selection errors.
#[derive(Debug)]
pub enum ProviderRegistryError {
    InvalidProviderId(String),
    DuplicateProviderId(String),
    ProviderNotFound {
        provider_id: String,
        available: Vec<String>,
    },
    Provider(ProviderError),
}

impl Display for ProviderRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProviderId(value) => write!(f, "provider id is invalid: {value}"),
            Self::DuplicateProviderId(value) => {
                write!(f, "provider id already registered: {value}")
            }
            Self::ProviderNotFound {
                provider_id,
                available,
            } => write!(
                f,
                "unknown provider `{provider_id}`; available: {}",
                available.join(", ")
            ),
            Self::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProviderRegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProviderError> for ProviderRegistryError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

/// Builds one kind of provider from resolved settings.
pub trait ProviderFactory: Send + Sync {
    fn provider_id(&self) -> &str;
    fn build(&self, settings: &ProviderSettings) -> ProviderResult<Box<dyn NotesProvider>>;
}

struct AppSheetFactory;

impl ProviderFactory for AppSheetFactory {
    fn provider_id(&self) -> &str {
        APPSHEET_PROVIDER_ID
    }

    fn build(&self, settings: &ProviderSettings) -> ProviderResult<Box<dyn NotesProvider>> {
        Ok(Box::new(AppSheetProvider::new(&settings.appsheet)?))
    }
}

struct SqliteFactory;

impl ProviderFactory for SqliteFactory {
    fn provider_id(&self) -> &str {
        SQLITE_PROVIDER_ID
    }

    fn build(&self, settings: &ProviderSettings) -> ProviderResult<Box<dyn NotesProvider>> {
        Ok(Box::new(SqliteNotesProvider::open(&settings.sqlite_path)?))
    }
}

/// Outcome of validating a proposed config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValidation {
    pub ok: bool,
    pub message: String,
    pub stats: ConnectionStats,
}

impl ConfigValidation {
    fn failed(message: String, stats: ConnectionStats) -> Self {
        Self {
            ok: false,
            message,
            stats,
        }
    }
}

/// Runtime provider factory registry.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `appsheet` and `sqlite` providers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let builtin: [Arc<dyn ProviderFactory>; 2] =
            [Arc::new(AppSheetFactory), Arc::new(SqliteFactory)];
        for factory in builtin {
            let id = factory.provider_id().to_string();
            registry.factories.insert(id, factory);
        }
        registry
    }

    /// Registers one provider factory.
    pub fn register(
        &mut self,
        factory: Arc<dyn ProviderFactory>,
    ) -> Result<(), ProviderRegistryError> {
        let provider_id = factory.provider_id().trim().to_string();
        if !is_valid_provider_id(&provider_id) {
            return Err(ProviderRegistryError::InvalidProviderId(provider_id));
        }
        if self.factories.contains_key(provider_id.as_str()) {
            return Err(ProviderRegistryError::DuplicateProviderId(provider_id));
        }

        self.factories.insert(provider_id, factory);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns sorted provider ids.
    pub fn provider_ids(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Returns one factory by id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn ProviderFactory>> {
        self.factories
            .get(provider_id.trim().to_lowercase().as_str())
            .cloned()
    }

    /// Builds the provider named by `settings.provider_id`.
    pub fn build(
        &self,
        settings: &ProviderSettings,
    ) -> Result<Box<dyn NotesProvider>, ProviderRegistryError> {
        let factory = self.get(&settings.provider_id).ok_or_else(|| {
            ProviderRegistryError::ProviderNotFound {
                provider_id: settings.provider_id.clone(),
                available: self.provider_ids(),
            }
        })?;
        Ok(factory.build(settings)?)
    }

    /// Builds the provider a proposed config describes and probes it.
    ///
    /// Only the file's own values are used; environment fallbacks do not
    /// count towards a valid config.
    pub fn validate_config(&self, config: &NotesConfig, config_dir: &Path) -> ConfigValidation {
        if config.provider.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return ConfigValidation::failed(
                "Missing 'provider' field".to_string(),
                ConnectionStats::new(),
            );
        }

        let settings = ProviderSettings::from_file(config, config_dir);
        let provider = match self.build(&settings) {
            Ok(provider) => provider,
            Err(err) => {
                warn!(
                    "event=config_validate module=provider status=error provider={} error={}",
                    settings.provider_id, err
                );
                return ConfigValidation::failed(err.to_string(), ConnectionStats::new());
            }
        };

        match provider.check_connection() {
            Ok(stats) => {
                info!(
                    "event=config_validate module=provider status=ok provider={}",
                    settings.provider_id
                );
                ConfigValidation {
                    ok: true,
                    message: "Connection successful".to_string(),
                    stats,
                }
            }
            Err(err) => {
                warn!(
                    "event=config_validate module=provider status=error provider={} error={}",
                    settings.provider_id, err
                );
                ConfigValidation::failed(format!("Connection failed: {err}"), provider.describe())
            }
        }
    }
}

fn is_valid_provider_id(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
