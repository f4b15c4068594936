//! Query tokenizer.
//!
//! # Invariants
//! - Token offsets are byte offsets into the original query string.
//! - `OR` is only an operator as the exact upper-case token.
//! - The `label:` keyword is matched case-insensitively.

use crate::query::error::{QuerySyntaxError, SyntaxErrorKind};

const LABEL_PREFIX: &str = "label:";
const OR_KEYWORD: &str = "OR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word(String),
    Phrase(String),
    Label(String),
    Or,
    /// `-` glued to the following term.
    Negate,
    LParen,
    RParen,
}

impl TokenKind {
    /// Whether this token can begin a `Term`.
    pub(crate) fn starts_term(&self) -> bool {
        matches!(
            self,
            Self::Word(_) | Self::Phrase(_) | Self::Label(_) | Self::Negate | Self::LParen
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, QuerySyntaxError> {
    Lexer { source, pos: 0 }.run()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, QuerySyntaxError> {
        let mut tokens = Vec::new();
        while let Some(current) = self.peek() {
            if current.is_whitespace() {
                self.bump();
                continue;
            }

            let start = self.pos;
            let kind = match current {
                '(' => {
                    self.bump();
                    TokenKind::LParen
                }
                ')' => {
                    self.bump();
                    TokenKind::RParen
                }
                '"' => TokenKind::Phrase(self.quoted()?),
                '-' if self.negation_follows() => {
                    self.bump();
                    TokenKind::Negate
                }
                _ => self.word()?,
            };
            tokens.push(Token {
                kind,
                start,
                end: self.pos,
            });
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let current = self.peek()?;
        self.pos += current.len_utf8();
        Some(current)
    }

    fn negation_follows(&self) -> bool {
        match self.source[self.pos..].chars().nth(1) {
            Some(next) => !next.is_whitespace() && next != ')',
            None => false,
        }
    }

    /// Reads a `"..."` span starting at the opening quote.
    fn quoted(&mut self) -> Result<String, QuerySyntaxError> {
        let start = self.pos;
        self.bump();
        let body_start = self.pos;
        while let Some(current) = self.peek() {
            if current == '"' {
                let body = self.source[body_start..self.pos].to_string();
                self.bump();
                return Ok(body);
            }
            self.bump();
        }
        Err(QuerySyntaxError::new(
            SyntaxErrorKind::UnterminatedQuote,
            start,
            &self.source[start..],
        ))
    }

    /// Reads a bare word, which may turn out to be `OR` or a `label:` term.
    fn word(&mut self) -> Result<TokenKind, QuerySyntaxError> {
        let source = self.source;
        let start = self.pos;
        while let Some(current) = self.peek() {
            if current.is_whitespace() || matches!(current, '(' | ')' | '"') {
                break;
            }
            self.bump();
        }
        let text = &source[start..self.pos];

        if text == OR_KEYWORD {
            return Ok(TokenKind::Or);
        }

        let is_label = text
            .get(..LABEL_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(LABEL_PREFIX));
        if !is_label {
            return Ok(TokenKind::Word(text.to_string()));
        }

        let mut name = text[LABEL_PREFIX.len()..].to_string();
        if name.is_empty() && self.peek() == Some('"') {
            name = self.quoted()?;
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(QuerySyntaxError::new(
                SyntaxErrorKind::EmptyLabel,
                start,
                &source[start..self.pos],
            ));
        }
        Ok(TokenKind::Label(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{tokenize, TokenKind};
    use crate::query::error::SyntaxErrorKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("query should tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn splits_words_phrases_labels_and_parens() {
        assert_eq!(
            kinds(r#"(label:Work OR "team sync") notes"#),
            vec![
                TokenKind::LParen,
                TokenKind::Label("Work".to_string()),
                TokenKind::Or,
                TokenKind::Phrase("team sync".to_string()),
                TokenKind::RParen,
                TokenKind::Word("notes".to_string()),
            ]
        );
    }

    #[test]
    fn dash_negates_only_when_glued_to_a_term() {
        assert_eq!(
            kinds("-meeting - e-mail"),
            vec![
                TokenKind::Negate,
                TokenKind::Word("meeting".to_string()),
                TokenKind::Word("-".to_string()),
                TokenKind::Word("e-mail".to_string()),
            ]
        );
    }

    #[test]
    fn label_keyword_is_case_insensitive_and_accepts_quoted_names() {
        assert_eq!(
            kinds(r#"LABEL:home label:"Project X""#),
            vec![
                TokenKind::Label("home".to_string()),
                TokenKind::Label("Project X".to_string()),
            ]
        );
    }

    #[test]
    fn only_upper_case_or_is_an_operator() {
        assert_eq!(
            kinds("or Or OR"),
            vec![
                TokenKind::Word("or".to_string()),
                TokenKind::Word("Or".to_string()),
                TokenKind::Or,
            ]
        );
    }

    #[test]
    fn quote_ends_a_bare_word() {
        assert_eq!(
            kinds(r#"foo"bar baz""#),
            vec![
                TokenKind::Word("foo".to_string()),
                TokenKind::Phrase("bar baz".to_string()),
            ]
        );
    }

    #[test]
    fn token_offsets_are_byte_positions() {
        let tokens = tokenize("ünï label:x").expect("query should tokenize");
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[0].end, "ünï".len());
        assert_eq!(tokens[1].start, "ünï ".len());
    }

    #[test]
    fn rejects_unterminated_quote_and_empty_label() {
        let err = tokenize(r#"a "open"#).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote);
        assert_eq!(err.position, 2);
        assert_eq!(err.fragment, "\"open");

        let err = tokenize("label: x").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::EmptyLabel);
        assert_eq!(err.position, 0);

        let err = tokenize(r#"label:"  ""#).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::EmptyLabel);
    }
}
