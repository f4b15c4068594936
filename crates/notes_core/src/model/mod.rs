//! Domain model for notes.
//!
//! # Responsibility
//! - Define the record shape shared by providers, the query engine and callers.
//! - Keep label/timestamp normalization in one place.
//!
//! # Invariants
//! - Every note is identified by a backend-assigned `NoteId`.
//! - Records are plain values; core never mutates a fetched record.

pub mod note;
pub mod timestamp;
