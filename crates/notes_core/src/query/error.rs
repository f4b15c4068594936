//! Query syntax errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Grammar violation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A `"` without its closing quote.
    UnterminatedQuote,
    /// `label:` without a label name.
    EmptyLabel,
    /// `(` without a matching `)`.
    UnclosedGroup,
    /// `)` without a matching `(`.
    UnmatchedClose,
    /// `()` with nothing inside.
    EmptyGroup,
    /// `OR` without a right-hand term.
    DanglingOperator,
    /// A term was expected but an operator or `)` was found.
    MissingOperand,
    /// `-` not followed by a term.
    DanglingNegation,
    /// Too many nested groups or search terms.
    TooComplex,
}

impl SyntaxErrorKind {
    pub fn description(self) -> &'static str {
        match self {
            Self::UnterminatedQuote => "unterminated quoted phrase",
            Self::EmptyLabel => "`label:` requires a label name",
            Self::UnclosedGroup => "unclosed parenthesis",
            Self::UnmatchedClose => "unmatched closing parenthesis",
            Self::EmptyGroup => "empty parentheses",
            Self::DanglingOperator => "`OR` is missing its right-hand term",
            Self::MissingOperand => "expected a search term",
            Self::DanglingNegation => "`-` must be followed by a term",
            Self::TooComplex => "query is too complex",
        }
    }
}

/// Raised when a raw query string violates the grammar.
///
/// `position` is a byte offset into the raw query; `fragment` is the
/// offending token, or the remaining input for unterminated constructs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySyntaxError {
    pub kind: SyntaxErrorKind,
    pub position: usize,
    pub fragment: String,
}

impl QuerySyntaxError {
    pub(crate) fn new(kind: SyntaxErrorKind, position: usize, fragment: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            fragment: fragment.into(),
        }
    }
}

impl Display for QuerySyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.fragment.is_empty() {
            write!(
                f,
                "invalid query at end of input (position {}): {}",
                self.position,
                self.kind.description()
            )
        } else {
            write!(
                f,
                "invalid query at position {} near `{}`: {}",
                self.position,
                self.fragment,
                self.kind.description()
            )
        }
    }
}

impl Error for QuerySyntaxError {}
