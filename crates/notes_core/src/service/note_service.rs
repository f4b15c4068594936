//! Note use-case service.
//!
//! # Responsibility
//! - Run Gmail-style list requests against any [`NotesProvider`].
//! - Validate create/update requests before they reach the backend.
//!
//! # Invariants
//! - `list` parses the query and sort before any provider I/O.
//! - `total_count` always counts matches before `limit`.
//! - Provider `NotFound` surfaces as [`NoteServiceError::NoteNotFound`].

use crate::logging::{sanitize_message, MAX_LOGGED_TEXT_CHARS};
use crate::model::note::{NewNote, Note, NoteId, NoteUpdate, NoteValidationError};
use crate::provider::{NotesProvider, ProviderError};
use crate::query::{apply_query, ListError, ListRequest, ListResult};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Malformed query or sort; nothing was fetched.
    List(ListError),
    /// Request rejected before reaching the provider.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Backend failure.
    Provider(ProviderError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::List(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Provider(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<ListError> for NoteServiceError {
    fn from(value: ListError) -> Self {
        Self::List(value)
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ProviderError> for NoteServiceError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::NotFound(id) => Self::NoteNotFound(id),
            ProviderError::Validation(err) => Self::Validation(err),
            other => Self::Provider(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over provider implementations.
pub struct NoteService<P: NotesProvider> {
    provider: P,
}

impl<P: NotesProvider> NoteService<P> {
    /// Creates a service using the provided backend.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Lists notes matching a Gmail-style query.
    ///
    /// # Errors
    /// - [`NoteServiceError::List`] for malformed queries or sort fields;
    ///   the provider is not contacted in that case.
    /// - [`NoteServiceError::Provider`] when fetching fails.
    pub fn list(&self, request: &ListRequest) -> NoteServiceResult<ListResult> {
        let started_at = Instant::now();
        let query = sanitize_message(&request.query, MAX_LOGGED_TEXT_CHARS);

        let (expr, sort) = match request.compile() {
            Ok(compiled) => compiled,
            Err(err) => {
                error!(
                    "event=notes_list module=service status=error stage=parse query={:?} error={}",
                    query, err
                );
                return Err(err.into());
            }
        };

        let records = self.provider.fetch_all().map_err(|err| {
            error!(
                "event=notes_list module=service status=error stage=fetch provider={} error={}",
                self.provider.provider_id(),
                err
            );
            NoteServiceError::from(err)
        })?;

        let result = apply_query(&records, &expr, sort, request.limit);
        info!(
            "event=notes_list module=service status=ok provider={} query={:?} fetched={} matched={} returned={} duration_ms={}",
            self.provider.provider_id(),
            query,
            records.len(),
            result.total_count,
            result.results.len(),
            started_at.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Gets one note by id.
    pub fn get(&self, id: &str) -> NoteServiceResult<Note> {
        self.provider
            .get(id)?
            .ok_or_else(|| NoteServiceError::NoteNotFound(id.to_string()))
    }

    /// Creates one note; labels are normalized first.
    pub fn add(&self, note: &NewNote) -> NoteServiceResult<Note> {
        let note = note.normalized()?;
        let created = self.provider.add(&note)?;
        info!(
            "event=note_add module=service status=ok provider={} id={}",
            self.provider.provider_id(),
            created.id
        );
        Ok(created)
    }

    /// Applies a partial update.
    pub fn update(&self, id: &str, update: &NoteUpdate) -> NoteServiceResult<Note> {
        let update = update.normalized()?;
        let updated = self.provider.update(id, &update)?;
        info!(
            "event=note_update module=service status=ok provider={} id={}",
            self.provider.provider_id(),
            updated.id
        );
        Ok(updated)
    }

    /// Lists raw attachment rows for one note.
    pub fn list_attachments(&self, note_id: &str) -> NoteServiceResult<Vec<serde_json::Value>> {
        Ok(self.provider.list_attachments(note_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteService, NoteServiceError};
    use crate::model::note::{NewNote, Note, NoteUpdate};
    use crate::provider::{ConnectionStats, NotesProvider, ProviderError, ProviderResult};
    use crate::query::{ListError, ListRequest};
    use std::cell::Cell;

    /// Provider that counts fetches and serves a fixed record set.
    struct CountingProvider {
        notes: Vec<Note>,
        fetches: Cell<usize>,
    }

    impl NotesProvider for CountingProvider {
        fn provider_id(&self) -> &str {
            "counting"
        }

        fn fetch_all(&self) -> ProviderResult<Vec<Note>> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self.notes.clone())
        }

        fn get(&self, id: &str) -> ProviderResult<Option<Note>> {
            Ok(self.notes.iter().find(|note| note.id == id).cloned())
        }

        fn add(&self, note: &NewNote) -> ProviderResult<Note> {
            let mut created = Note::new("new", note.title.clone());
            created.labels = note.labels.clone();
            Ok(created)
        }

        fn update(&self, id: &str, _update: &NoteUpdate) -> ProviderResult<Note> {
            Err(ProviderError::NotFound(id.to_string()))
        }

        fn list_attachments(&self, _note_id: &str) -> ProviderResult<Vec<serde_json::Value>> {
            Err(ProviderError::Unsupported("no attachments"))
        }

        fn describe(&self) -> ConnectionStats {
            ConnectionStats::new()
        }

        fn check_connection(&self) -> ProviderResult<ConnectionStats> {
            Ok(ConnectionStats::new())
        }
    }

    fn service() -> NoteService<CountingProvider> {
        let mut work = Note::new("1", "Meeting notes");
        work.labels = "work".to_string();
        NoteService::new(CountingProvider {
            notes: vec![work, Note::new("2", "Groceries")],
            fetches: Cell::new(0),
        })
    }

    #[test]
    fn syntax_errors_fail_before_fetching() {
        let service = service();
        let err = service.list(&ListRequest::new("(label:work")).unwrap_err();
        assert!(matches!(err, NoteServiceError::List(ListError::Syntax(_))));
        assert_eq!(service.provider().fetches.get(), 0);
    }

    #[test]
    fn list_filters_after_a_single_fetch() {
        let service = service();
        let result = service.list(&ListRequest::new("label:work")).unwrap();
        assert_eq!(result.total_count, 1);
        assert_eq!(result.results[0].id, "1");
        assert_eq!(service.provider().fetches.get(), 1);
    }

    #[test]
    fn add_normalizes_labels_and_rejects_blank_titles() {
        let service = service();
        let created = service
            .add(&NewNote::new("Plan").with_labels(" a, A ,b"))
            .unwrap();
        assert_eq!(created.labels, "a,b");
        assert!(matches!(
            service.add(&NewNote::new(" ")),
            Err(NoteServiceError::Validation(_))
        ));
    }

    #[test]
    fn provider_not_found_maps_to_note_not_found() {
        let service = service();
        let update = NoteUpdate {
            title: Some("x".to_string()),
            ..NoteUpdate::default()
        };
        assert!(matches!(
            service.update("404", &update),
            Err(NoteServiceError::NoteNotFound(id)) if id == "404"
        ));
        assert!(matches!(
            service.get("missing"),
            Err(NoteServiceError::NoteNotFound(_))
        ));
    }
}
