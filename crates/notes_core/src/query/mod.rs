//! Gmail-style query engine.
//!
//! # Responsibility
//! - Parse compact search queries (`meeting -label:archived`,
//!   `(label:work OR label:home) "team sync"`) into a boolean AST.
//! - Evaluate the AST over in-memory notes and shape list results.
//!
//! # Invariants
//! - Parsing and evaluation are pure and synchronous.
//! - Malformed queries fail with [`QuerySyntaxError`]; there is no
//!   match-all fallback.

pub mod ast;
pub mod error;
pub mod eval;
mod lexer;
pub mod list;
pub mod parser;

pub use ast::QueryExpr;
pub use error::{QuerySyntaxError, SyntaxErrorKind};
pub use eval::MatchTarget;
pub use list::{
    apply_query, list_notes, list_with, ListError, ListRequest, ListResult, SortDirection,
    SortField, SortSpec, DEFAULT_LIST_LIMIT,
};
pub use parser::{parse_query, MAX_GROUP_DEPTH, MAX_TERMS};
