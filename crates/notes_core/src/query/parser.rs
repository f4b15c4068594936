//! Recursive-descent parser for the Gmail-style query grammar.
//!
//! ```text
//! Expression := OrExpr
//! OrExpr     := AndExpr ("OR" AndExpr)*
//! AndExpr    := Term+
//! Term       := "-"? Primary
//! Primary    := "label:" Name | Phrase | Word | "(" Expression ")"
//! ```
//!
//! # Invariants
//! - Implicit AND binds tighter than `OR`; both are left-associative.
//! - Parser position is a cursor owned by one `Parser` value per call.
//! - Errors point at the token where parsing failed.
//! - Group nesting is capped at [`MAX_GROUP_DEPTH`] and the number of search
//!   terms at [`MAX_TERMS`], so the tree stays shallow enough for recursive
//!   evaluation and drop.

use crate::query::ast::QueryExpr;
use crate::query::error::{QuerySyntaxError, SyntaxErrorKind};
use crate::query::lexer::{tokenize, Token, TokenKind};

/// Maximum number of nested parenthesised groups.
pub const MAX_GROUP_DEPTH: usize = 32;
/// Maximum number of words, phrases and labels in one query.
pub const MAX_TERMS: usize = 256;

/// Parses a raw query string into its AST.
///
/// Empty or whitespace-only input yields [`QueryExpr::MatchAll`].
///
/// # Errors
/// Returns [`QuerySyntaxError`] for unbalanced parentheses, a dangling
/// operator or negation, an empty `label:`, an unterminated quote, or a
/// query exceeding [`MAX_GROUP_DEPTH`] or [`MAX_TERMS`].
pub fn parse_query(raw: &str) -> Result<QueryExpr, QuerySyntaxError> {
    let tokens = tokenize(raw)?;
    if tokens.is_empty() {
        return Ok(QueryExpr::MatchAll);
    }

    Parser {
        source: raw,
        tokens: &tokens,
        cursor: 0,
        depth: 0,
        terms: 0,
    }
    .parse()
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    cursor: usize,
    depth: usize,
    terms: usize,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) if token.kind == TokenKind::RParen => {
                Err(self.error_at(SyntaxErrorKind::UnmatchedClose, token))
            }
            Some(token) => Err(self.error_at(SyntaxErrorKind::MissingOperand, token)),
        }
    }

    fn parse_or(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let mut left = self.parse_and()?;
        while let Some(operator) = self.advance_if(|kind| *kind == TokenKind::Or) {
            if !self.peek().is_some_and(|token| token.kind.starts_term()) {
                return Err(self.error_at(SyntaxErrorKind::DanglingOperator, operator));
            }
            let right = self.parse_and()?;
            left = QueryExpr::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let mut left = self.parse_term()?;
        while self.peek().is_some_and(|token| token.kind.starts_term()) {
            let right = self.parse_term()?;
            left = QueryExpr::and(left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let Some(negation) = self.advance_if(|kind| *kind == TokenKind::Negate) else {
            return self.parse_primary();
        };

        match self.peek() {
            Some(token) if token.kind.starts_term() && token.kind != TokenKind::Negate => {
                Ok(self.parse_primary()?.negated())
            }
            _ => Err(self.error_at(SyntaxErrorKind::DanglingNegation, negation)),
        }
    }

    fn parse_primary(&mut self) -> Result<QueryExpr, QuerySyntaxError> {
        let Some(token) = self.advance() else {
            return Err(self.error_at_end(SyntaxErrorKind::MissingOperand));
        };

        match &token.kind {
            TokenKind::Word(value) | TokenKind::Phrase(value) => {
                self.count_term(token)?;
                Ok(QueryExpr::text(value.clone()))
            }
            TokenKind::Label(name) => {
                self.count_term(token)?;
                Ok(QueryExpr::label(name.clone()))
            }
            TokenKind::LParen => self.parse_group(token),
            TokenKind::Negate => Err(self.error_at(SyntaxErrorKind::DanglingNegation, token)),
            TokenKind::Or | TokenKind::RParen => {
                Err(self.error_at(SyntaxErrorKind::MissingOperand, token))
            }
        }
    }

    /// Parses the body of a group whose `(` was just consumed.
    fn parse_group(&mut self, open: &'a Token) -> Result<QueryExpr, QuerySyntaxError> {
        if let Some(close) = self.advance_if(|kind| *kind == TokenKind::RParen) {
            return Err(QuerySyntaxError::new(
                SyntaxErrorKind::EmptyGroup,
                open.start,
                &self.source[open.start..close.end],
            ));
        }

        if self.depth == MAX_GROUP_DEPTH {
            return Err(self.error_at(SyntaxErrorKind::TooComplex, open));
        }
        self.depth += 1;
        let inner = self.parse_or()?;
        self.depth -= 1;
        if self
            .advance_if(|kind| *kind == TokenKind::RParen)
            .is_none()
        {
            return Err(QuerySyntaxError::new(
                SyntaxErrorKind::UnclosedGroup,
                open.start,
                &self.source[open.start..],
            ));
        }
        Ok(QueryExpr::group(inner))
    }

    fn count_term(&mut self, token: &Token) -> Result<(), QuerySyntaxError> {
        if self.terms == MAX_TERMS {
            return Err(self.error_at(SyntaxErrorKind::TooComplex, token));
        }
        self.terms += 1;
        Ok(())
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(token)
    }

    fn advance_if(&mut self, accept: impl Fn(&TokenKind) -> bool) -> Option<&'a Token> {
        let token = self.peek()?;
        if !accept(&token.kind) {
            return None;
        }
        self.cursor += 1;
        Some(token)
    }

    fn error_at(&self, kind: SyntaxErrorKind, token: &Token) -> QuerySyntaxError {
        QuerySyntaxError::new(kind, token.start, &self.source[token.start..token.end])
    }

    fn error_at_end(&self, kind: SyntaxErrorKind) -> QuerySyntaxError {
        QuerySyntaxError::new(kind, self.source.len(), "")
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_query, MAX_GROUP_DEPTH, MAX_TERMS};
    use crate::query::ast::QueryExpr;
    use crate::query::error::SyntaxErrorKind;

    fn text(value: &str) -> QueryExpr {
        QueryExpr::text(value)
    }

    #[test]
    fn empty_and_blank_queries_match_all() {
        assert_eq!(parse_query("").unwrap(), QueryExpr::MatchAll);
        assert_eq!(parse_query("  \t\n ").unwrap(), QueryExpr::MatchAll);
    }

    #[test]
    fn implicit_and_binds_tighter_than_or() {
        assert_eq!(
            parse_query("a OR b c").unwrap(),
            QueryExpr::or(text("a"), QueryExpr::and(text("b"), text("c")))
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse_query("(a OR b) c").unwrap(),
            QueryExpr::and(
                QueryExpr::group(QueryExpr::or(text("a"), text("b"))),
                text("c")
            )
        );
        assert_ne!(parse_query("(a OR b) c").unwrap(), parse_query("a OR b c").unwrap());
    }

    #[test]
    fn operators_are_left_associative() {
        assert_eq!(
            parse_query("a b c").unwrap(),
            QueryExpr::and(QueryExpr::and(text("a"), text("b")), text("c"))
        );
        assert_eq!(
            parse_query("a OR b OR c").unwrap(),
            QueryExpr::or(QueryExpr::or(text("a"), text("b")), text("c"))
        );
    }

    #[test]
    fn negation_applies_to_a_single_term() {
        assert_eq!(
            parse_query("meeting -label:archived").unwrap(),
            QueryExpr::and(text("meeting"), QueryExpr::label("archived").negated())
        );
        assert_eq!(
            parse_query("-meeting notes").unwrap(),
            QueryExpr::and(QueryExpr::Not(Box::new(text("meeting"))), text("notes"))
        );
        assert_eq!(
            parse_query("-(a OR b)").unwrap(),
            QueryExpr::Not(Box::new(QueryExpr::group(QueryExpr::or(text("a"), text("b")))))
        );
    }

    #[test]
    fn redundant_parentheses_are_legal() {
        assert_eq!(
            parse_query("((a))").unwrap(),
            QueryExpr::group(QueryExpr::group(text("a")))
        );
    }

    #[test]
    fn phrases_are_single_text_terms() {
        assert_eq!(
            parse_query(r#""exact phrase" label:work"#).unwrap(),
            QueryExpr::and(text("exact phrase"), QueryExpr::label("work"))
        );
    }

    #[test]
    fn dangling_or_is_reported_at_the_operator() {
        let err = parse_query("label:work OR").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::DanglingOperator);
        assert_eq!(err.position, 11);
        assert_eq!(err.fragment, "OR");
    }

    #[test]
    fn bare_or_and_leading_or_are_missing_operands() {
        let err = parse_query("OR").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingOperand);
        assert_eq!(err.position, 0);

        let err = parse_query("OR meeting").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingOperand);
    }

    #[test]
    fn unbalanced_parentheses_are_rejected() {
        let err = parse_query("(unclosed").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnclosedGroup);
        assert_eq!(err.position, 0);
        assert_eq!(err.fragment, "(unclosed");

        let err = parse_query("a) b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnmatchedClose);
        assert_eq!(err.position, 1);

        let err = parse_query("a ()").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::EmptyGroup);
        assert_eq!(err.fragment, "()");
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let err = parse_query(r#""unterminated"#).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote);
        assert_eq!(err.position, 0);
    }

    #[test]
    fn negation_without_term_is_rejected() {
        let err = parse_query("a -OR b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::DanglingNegation);
        assert_eq!(err.position, 2);

        let err = parse_query("--a").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::DanglingNegation);
    }

    #[test]
    fn error_message_names_position_and_fragment() {
        let err = parse_query("(a OR b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid query at position 0 near `(a OR b`: unclosed parenthesis"
        );
    }

    #[test]
    fn display_output_reparses_to_the_same_tree() {
        for raw in [
            "meeting -label:archived",
            r#"(label:work OR label:"Project X") "team sync""#,
            "a OR b c",
            r#"-(a OR "OR") "-x""#,
        ] {
            let parsed = parse_query(raw).unwrap();
            assert_eq!(parse_query(&parsed.to_string()).unwrap(), parsed, "{raw}");
        }
    }

    #[test]
    fn nesting_beyond_the_cap_is_rejected() {
        let at_cap = format!("{}a{}", "(".repeat(MAX_GROUP_DEPTH), ")".repeat(MAX_GROUP_DEPTH));
        assert!(parse_query(&at_cap).is_ok());

        let deep = format!("{}a{}", "(".repeat(5000), ")".repeat(5000));
        let err = parse_query(&deep).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::TooComplex);
        assert_eq!(err.position, MAX_GROUP_DEPTH);
        assert_eq!(err.fragment, "(");
    }

    #[test]
    fn term_count_beyond_the_cap_is_rejected() {
        let at_cap = vec!["a"; MAX_TERMS].join(" ");
        assert!(parse_query(&at_cap).is_ok());

        let long = vec!["a"; 20_000].join(" ");
        let err = parse_query(&long).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::TooComplex);
        assert_eq!(err.position, MAX_TERMS * 2);

        let long_or = vec!["label:x"; MAX_TERMS + 1].join(" OR ");
        assert_eq!(
            parse_query(&long_or).unwrap_err().kind,
            SyntaxErrorKind::TooComplex
        );
    }
}
