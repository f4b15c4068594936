//! CLI-specific error types
//!
//! Every error is fatal: `main` prints it as `Error: <message>` and exits 1.

use notes_core::{ConfigError, NoteServiceError, ProviderRegistryError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Registry(ProviderRegistryError),
    Service(NoteServiceError),
    Json(serde_json::Error),
    /// Malformed command line.
    Usage(clap::Error),
    /// Validation already printed its details.
    ConfigRejected,
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "failed to render JSON: {err}"),
            Self::Usage(err) => {
                let rendered = err.to_string();
                let message = rendered.strip_prefix("error: ").unwrap_or(&rendered);
                write!(f, "{}", message.trim_end())
            }
            Self::ConfigRejected => write!(f, "configuration check failed"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Service(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Usage(err) => Some(err),
            Self::ConfigRejected => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ProviderRegistryError> for CliError {
    fn from(value: ProviderRegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<NoteServiceError> for CliError {
    fn from(value: NoteServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<clap::Error> for CliError {
    fn from(value: clap::Error) -> Self {
        Self::Usage(value)
    }
}
