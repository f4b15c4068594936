//! Backend provider contracts and implementations.
//!
//! # Responsibility
//! - Define the storage-agnostic contract every notes backend implements.
//! - Map backend rows into [`Note`] and backend failures into [`ProviderError`].
//!
//! # Invariants
//! - `fetch_all` returns every record in backend order; filtering happens
//!   in the query engine, never in a provider.
//! - Providers never retry internally.
//! - Attachment rows are passed through untouched.

use crate::db::DbError;
use crate::model::note::{NewNote, Note, NoteId, NoteUpdate, NoteValidationError};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod appsheet;
pub mod registry;
pub mod sqlite;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Non-secret key/value facts about a provider connection.
pub type ConnectionStats = BTreeMap<String, String>;

/// Provider-layer error for connectivity, auth, storage and mapping failures.
#[derive(Debug)]
pub enum ProviderError {
    /// Required setting absent from both config file and environment.
    MissingSetting {
        provider: &'static str,
        setting: &'static str,
        env_var: &'static str,
    },
    Unauthorized {
        status: u16,
        body: String,
    },
    TableNotFound {
        table: String,
        body: String,
    },
    Http {
        status: u16,
        body: String,
    },
    Transport(reqwest::Error),
    InvalidResponse(String),
    Db(DbError),
    NotFound(NoteId),
    Validation(NoteValidationError),
    Unsupported(&'static str),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSetting {
                provider,
                setting,
                env_var,
            } => write!(
                f,
                "{provider} {setting} is required; set {env_var} or configure it via `notes config import`"
            ),
            Self::Unauthorized { status, body } => {
                write!(f, "backend rejected credentials (HTTP {status}): {body}")
            }
            Self::TableNotFound { table, body } => {
                write!(f, "backend table `{table}` not found: {body}")
            }
            Self::Http { status, body } => write!(f, "backend API error: {status} - {body}"),
            Self::Transport(err) => write!(f, "backend request failed: {err}"),
            Self::InvalidResponse(message) => write!(f, "invalid backend response: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unsupported(message) => write!(f, "unsupported operation: {message}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<DbError> for ProviderError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProviderError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<NoteValidationError> for ProviderError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Contract implemented by every notes backend.
pub trait NotesProvider {
    /// Registry id, e.g. `appsheet`.
    fn provider_id(&self) -> &str;
    /// Fetches every note in backend order.
    fn fetch_all(&self) -> ProviderResult<Vec<Note>>;
    /// Gets one note by id.
    fn get(&self, id: &str) -> ProviderResult<Option<Note>>;
    /// Persists a new note; the backend assigns id and timestamps.
    fn add(&self, note: &NewNote) -> ProviderResult<Note>;
    /// Applies a partial update and returns the stored note.
    fn update(&self, id: &str, update: &NoteUpdate) -> ProviderResult<Note>;
    /// Lists raw attachment rows for one note.
    fn list_attachments(&self, note_id: &str) -> ProviderResult<Vec<serde_json::Value>>;
    /// Non-secret settings for display.
    fn describe(&self) -> ConnectionStats;
    /// Probes the backend and returns record counts.
    fn check_connection(&self) -> ProviderResult<ConnectionStats>;
}

impl<P: NotesProvider + ?Sized> NotesProvider for Box<P> {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn fetch_all(&self) -> ProviderResult<Vec<Note>> {
        (**self).fetch_all()
    }

    fn get(&self, id: &str) -> ProviderResult<Option<Note>> {
        (**self).get(id)
    }

    fn add(&self, note: &NewNote) -> ProviderResult<Note> {
        (**self).add(note)
    }

    fn update(&self, id: &str, update: &NoteUpdate) -> ProviderResult<Note> {
        (**self).update(id, update)
    }

    fn list_attachments(&self, note_id: &str) -> ProviderResult<Vec<serde_json::Value>> {
        (**self).list_attachments(note_id)
    }

    fn describe(&self) -> ConnectionStats {
        (**self).describe()
    }

    fn check_connection(&self) -> ProviderResult<ConnectionStats> {
        (**self).check_connection()
    }
}

/// Number of trailing secret characters left visible by [`mask_secret`].
pub const SECRET_TAIL_CHARS: usize = 8;

/// Masks a secret for display as `********...<last 8 chars>`.
pub fn mask_secret(secret: &str) -> String {
    let chars = secret.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    let start = chars.len().saturating_sub(SECRET_TAIL_CHARS);
    let tail = chars[start..].iter().collect::<String>();
    format!("********...{tail}")
}
