//! Note domain model.
//!
//! # Responsibility
//! - Define the flat note record every provider maps its rows into.
//! - Own label-set derivation from comma-joined label text.
//! - Validate create/update requests before they reach a provider.
//!
//! # Invariants
//! - `id` is assigned by the backend and never rewritten by core.
//! - Labels keep their stored spelling; comparisons are case-insensitive.
//! - A note with empty fields is still a valid note (empty text, empty set).

use crate::model::timestamp::{self, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque backend-assigned note identifier.
pub type NoteId = String;

/// Separator used by every backend for the `Labels` column.
pub const LABEL_SEPARATOR: char = ',';

/// Canonical note record.
///
/// Serialized with the backend's flat column names
/// (`ID, Title, Content, Labels, Created, Modified`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "ID")]
    pub id: NoteId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Content", default)]
    pub content: String,
    /// Comma-joined label text as stored by the backend.
    #[serde(rename = "Labels", default)]
    pub labels: String,
    #[serde(
        rename = "Created",
        default,
        deserialize_with = "timestamp::deserialize_optional"
    )]
    pub created: Option<Timestamp>,
    #[serde(
        rename = "Modified",
        default,
        deserialize_with = "timestamp::deserialize_optional"
    )]
    pub modified: Option<Timestamp>,
}

impl Note {
    /// Creates a note with empty content, labels and timestamps.
    pub fn new(id: impl Into<NoteId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            labels: String::new(),
            created: None,
            modified: None,
        }
    }

    /// Iterates the trimmed, non-empty entries of the label text.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        split_labels(&self.labels)
    }
}

/// Create request for a new note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    /// Comma-separated labels.
    pub labels: String,
}

impl NewNote {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_labels(mut self, labels: impl Into<String>) -> Self {
        self.labels = labels.into();
        self
    }

    /// Rejects a blank title.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns a validated copy with normalized label text.
    pub fn normalized(&self) -> Result<Self, NoteValidationError> {
        self.validate()?;
        Ok(Self {
            title: self.title.clone(),
            content: self.content.clone(),
            labels: normalize_labels(&self.labels),
        })
    }
}

/// Partial update; `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub labels: Option<String>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.labels.is_none()
    }

    /// Rejects empty patches and blank replacement titles.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.is_empty() {
            return Err(NoteValidationError::EmptyUpdate);
        }
        if matches!(self.title.as_deref(), Some(title) if title.trim().is_empty()) {
            return Err(NoteValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns a validated copy with normalized label text.
    pub fn normalized(&self) -> Result<Self, NoteValidationError> {
        self.validate()?;
        Ok(Self {
            title: self.title.clone(),
            content: self.content.clone(),
            labels: self.labels.as_deref().map(normalize_labels),
        })
    }
}

/// Validation failures for note create/update requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyUpdate,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::EmptyUpdate => write!(
                f,
                "at least one of title, content, or labels must be provided"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// Splits comma-joined label text into trimmed, non-empty labels.
pub fn split_labels(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LABEL_SEPARATOR)
        .map(str::trim)
        .filter(|label| !label.is_empty())
}

/// Trims labels, drops blanks and removes case-insensitive duplicates.
///
/// The first spelling of a label wins and input order is preserved.
pub fn normalize_labels(raw: &str) -> String {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::new();
    for label in split_labels(raw) {
        if seen.insert(label.to_lowercase()) {
            kept.push(label);
        }
    }
    kept.join(",")
}
