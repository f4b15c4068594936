//! Query AST.
//!
//! # Invariants
//! - Every parsed query has exactly one root node.
//! - An empty query is represented by `MatchAll`, never by an empty tree.
//! - Nodes are plain values; nothing is shared or mutated across queries.

use std::fmt::{Display, Formatter};

/// Boolean predicate over a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    /// Root of an empty query; matches every note.
    MatchAll,
    /// Case-insensitive substring of title or content.
    Text(String),
    /// Case-insensitive label membership, inverted when `negated`.
    Label { name: String, negated: bool },
    And(Box<QueryExpr>, Box<QueryExpr>),
    Or(Box<QueryExpr>, Box<QueryExpr>),
    Not(Box<QueryExpr>),
    /// Explicit parentheses; transparent to evaluation.
    Group(Box<QueryExpr>),
}

impl QueryExpr {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self::Label {
            name: name.into(),
            negated: false,
        }
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn group(inner: Self) -> Self {
        Self::Group(Box::new(inner))
    }

    /// Applies the `-` prefix.
    ///
    /// Label terms carry negation inline; every other node is wrapped in `Not`.
    pub fn negated(self) -> Self {
        match self {
            Self::Label { name, negated } => Self::Label {
                name,
                negated: !negated,
            },
            other => Self::Not(Box::new(other)),
        }
    }
}

/// Renders the canonical query string; `parse_query` accepts it back.
impl Display for QueryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchAll => Ok(()),
            Self::Text(value) => write_term(f, value),
            Self::Label { name, negated } => {
                if *negated {
                    f.write_str("-")?;
                }
                f.write_str("label:")?;
                if needs_quotes(name) {
                    write!(f, "\"{name}\"")
                } else {
                    f.write_str(name)
                }
            }
            Self::And(left, right) => {
                write_operand(f, left, false)?;
                f.write_str(" ")?;
                write_operand(f, right, false)
            }
            Self::Or(left, right) => {
                write_operand(f, left, true)?;
                f.write_str(" OR ")?;
                write_operand(f, right, true)
            }
            Self::Not(inner) => {
                f.write_str("-")?;
                match inner.as_ref() {
                    Self::Text(_) | Self::Group(_) => write!(f, "{inner}"),
                    _ => write!(f, "({inner})"),
                }
            }
            Self::Group(inner) => write!(f, "({inner})"),
        }
    }
}

fn write_operand(f: &mut Formatter<'_>, expr: &QueryExpr, in_or: bool) -> std::fmt::Result {
    // An `Or` below an `And` needs parentheses to keep its precedence.
    match expr {
        QueryExpr::Or(..) if !in_or => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

fn write_term(f: &mut Formatter<'_>, value: &str) -> std::fmt::Result {
    let looks_like_syntax = value == "OR"
        || value.starts_with('-')
        || value
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("label:"));
    if looks_like_syntax || needs_quotes(value) {
        write!(f, "\"{value}\"")
    } else {
        f.write_str(value)
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')'))
}

#[cfg(test)]
mod tests {
    use super::QueryExpr;

    #[test]
    fn negating_a_label_flips_the_flag_instead_of_wrapping() {
        assert_eq!(
            QueryExpr::label("archived").negated(),
            QueryExpr::Label {
                name: "archived".to_string(),
                negated: true
            }
        );
        assert_eq!(
            QueryExpr::text("x").negated(),
            QueryExpr::Not(Box::new(QueryExpr::text("x")))
        );
    }

    #[test]
    fn display_keeps_or_precedence_under_and() {
        let expr = QueryExpr::and(
            QueryExpr::or(QueryExpr::text("a"), QueryExpr::text("b")),
            QueryExpr::text("c"),
        );
        assert_eq!(expr.to_string(), "(a OR b) c");
    }

    #[test]
    fn display_quotes_terms_that_would_reparse_differently() {
        let expr = QueryExpr::and(
            QueryExpr::text("exact phrase"),
            QueryExpr::and(QueryExpr::text("OR"), QueryExpr::label("Project X").negated()),
        );
        assert_eq!(expr.to_string(), r#""exact phrase" "OR" -label:"Project X""#);
    }
}
