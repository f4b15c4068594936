//! Filter → sort → limit over a materialized record set.
//!
//! # Responsibility
//! - Run a parsed query over every record the provider returned.
//! - Count matches before truncation.
//! - Apply a stable, deterministic sort by timestamp field.
//!
//! # Invariants
//! - A syntax or sort error yields no results at all.
//! - `total_count` is computed before `limit` is applied.
//! - Equal sort keys keep provider order in both directions.
//! - Input records are never mutated.

use crate::model::note::Note;
use crate::model::timestamp::Timestamp;
use crate::query::ast::QueryExpr;
use crate::query::error::QuerySyntaxError;
use crate::query::eval::MatchTarget;
use crate::query::parser::parse_query;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default number of records returned by list calls.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// List-engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    Syntax(QuerySyntaxError),
    /// Sort field other than `created`/`modified`.
    InvalidSort(String),
}

impl Display for ListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "{err}"),
            Self::InvalidSort(value) => write!(
                f,
                "invalid sort `{value}`; expected created|modified, optionally prefixed with `-`"
            ),
        }
    }
}

impl Error for ListError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::InvalidSort(_) => None,
        }
    }
}

impl From<QuerySyntaxError> for ListError {
    fn from(value: QuerySyntaxError) -> Self {
        Self::Syntax(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Created,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Parsed sort request, e.g. `-modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parses `field` or `-field`; field names are case-insensitive.
    ///
    /// Blank input means "keep provider order" and returns `Ok(None)`.
    pub fn parse(raw: &str) -> Result<Option<Self>, ListError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let (direction, name) = match trimmed.strip_prefix('-') {
            Some(rest) => (SortDirection::Descending, rest),
            None => (SortDirection::Ascending, trimmed),
        };
        let field = match name.to_ascii_lowercase().as_str() {
            "created" => SortField::Created,
            "modified" => SortField::Modified,
            _ => return Err(ListError::InvalidSort(trimmed.to_string())),
        };
        Ok(Some(Self { field, direction }))
    }

    fn key(self, note: &Note) -> Option<Timestamp> {
        match self.field {
            SortField::Created => note.created,
            SortField::Modified => note.modified,
        }
    }

    /// Orders two notes; missing timestamps sort first when ascending.
    pub fn compare(self, left: &Note, right: &Note) -> Ordering {
        let ordering = self.key(left).cmp(&self.key(right));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Engine output: the truncated page plus the un-truncated match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    pub results: Vec<Note>,
    pub total_count: usize,
}

/// Caller-facing list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Parses query and sort without touching any records.
    pub fn compile(&self) -> Result<(QueryExpr, Option<SortSpec>), ListError> {
        let expr = parse_query(&self.query)?;
        let sort = match self.sort.as_deref() {
            Some(raw) => SortSpec::parse(raw)?,
            None => None,
        };
        Ok((expr, sort))
    }
}

/// Parses `query` and `sort`, then filters, sorts and truncates `records`.
///
/// `limit == 0` returns no records but still reports `total_count`.
///
/// # Errors
/// - [`ListError::Syntax`] when the query is malformed.
/// - [`ListError::InvalidSort`] when the sort field is unknown.
pub fn list_notes(
    records: &[Note],
    query: &str,
    sort: Option<&str>,
    limit: usize,
) -> Result<ListResult, ListError> {
    let request = ListRequest {
        query: query.to_string(),
        sort: sort.map(str::to_string),
        limit,
    };
    list_with(records, &request)
}

/// [`list_notes`] driven by a [`ListRequest`].
pub fn list_with(records: &[Note], request: &ListRequest) -> Result<ListResult, ListError> {
    let (expr, sort) = request.compile()?;
    Ok(apply_query(records, &expr, sort, request.limit))
}

/// Runs an already parsed query over `records`.
pub fn apply_query(
    records: &[Note],
    expr: &QueryExpr,
    sort: Option<SortSpec>,
    limit: usize,
) -> ListResult {
    let mut matches = records
        .iter()
        .filter(|note| expr.matches_target(&MatchTarget::new(note)))
        .collect::<Vec<_>>();
    let total_count = matches.len();

    if let Some(spec) = sort {
        // `sort_by` is stable, so ties keep provider order.
        matches.sort_by(|left, right| spec.compare(left, right));
    }

    ListResult {
        results: matches.into_iter().take(limit).cloned().collect(),
        total_count,
    }
}
