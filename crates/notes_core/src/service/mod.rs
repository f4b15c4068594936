//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate provider calls and the query engine into use-case APIs.
//! - Keep CLI and tool surfaces decoupled from backend details.

pub mod note_service;
