//! Query evaluation against note records.
//!
//! # Invariants
//! - Evaluation is pure: no I/O, no mutation of the note.
//! - Missing fields behave as empty text / empty label set, never as errors.

use crate::model::note::Note;
use crate::query::ast::QueryExpr;

/// Lower-cased view of one note, built once per note per evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    title: String,
    content: String,
    labels: Vec<String>,
}

impl MatchTarget {
    pub fn new(note: &Note) -> Self {
        Self {
            title: note.title.to_lowercase(),
            content: note.content.to_lowercase(),
            labels: note.labels().map(str::to_lowercase).collect(),
        }
    }

    fn contains_text(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.content.contains(needle)
    }

    fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }
}

impl QueryExpr {
    /// Returns whether `note` satisfies this predicate.
    pub fn matches(&self, note: &Note) -> bool {
        self.matches_target(&MatchTarget::new(note))
    }

    /// Evaluates against a pre-built [`MatchTarget`].
    pub fn matches_target(&self, target: &MatchTarget) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Text(value) => target.contains_text(&value.to_lowercase()),
            Self::Label { name, negated } => {
                target.has_label(&name.trim().to_lowercase()) != *negated
            }
            Self::And(left, right) => left.matches_target(target) && right.matches_target(target),
            Self::Or(left, right) => left.matches_target(target) || right.matches_target(target),
            Self::Not(inner) => !inner.matches_target(target),
            Self::Group(inner) => inner.matches_target(target),
        }
    }
}
