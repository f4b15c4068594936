//! Core domain logic for the notes front end.
//! Query parsing, evaluation and provider access live here; callers only
//! format results.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod query;
pub mod service;

pub use config::{ConfigError, NotesConfig, ProviderSettings};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::note::{NewNote, Note, NoteId, NoteUpdate, NoteValidationError};
pub use model::timestamp::Timestamp;
pub use provider::registry::{ConfigValidation, ProviderRegistry, ProviderRegistryError};
pub use provider::{NotesProvider, ProviderError, ProviderResult};
pub use query::{
    list_notes, parse_query, ListError, ListRequest, ListResult, QueryExpr, QuerySyntaxError,
};
pub use service::note_service::{NoteService, NoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
