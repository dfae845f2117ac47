//! Tokenizer for the filter DSL.
//!
//! Non-buffered: the lexer walks the source `&str` on demand via a
//! `char_indices` cursor and hands the parser one [`Token`] at a time,
//! rather than building a `Vec<Token>` up front. Positions are byte offsets
//! into the original source, which [`SyntaxError`] carries back to the
//! caller for diagnostics.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::SyntaxError;

/// A single lexical token, tagged with the byte offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
    /// Byte offset just past this token; used by the parser to detect
    /// whitespace-free adjacency when merging glob fragments.
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Integer(i64),
    /// A quoted string literal (function argument), contents unescaped.
    StringLiteral(String),
    /// A `~pattern~flags` or `/pattern/flags` regex literal.
    RegexLiteral { pattern: String, flags: String },
    Comma,
    Dot,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Minus,
    Star,
    DoubleStar,
    Question,
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Integer(_) => "integer",
            TokenKind::StringLiteral(_) => "string literal",
            TokenKind::RegexLiteral { .. } => "regex literal",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::At => "'@'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::DoubleStar => "'**'",
            TokenKind::Question => "'?'",
            TokenKind::Eof => "end of input",
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Byte offset of the next unconsumed character, or `source.len()` at EOF.
    fn position(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len())
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Produce the next token, or a [`SyntaxError`] on unterminated literals
    /// or unknown characters.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();
        let start = self.position();

        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: start,
                end: start,
            });
        };

        let kind = match c {
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            '.' => {
                self.bump();
                TokenKind::Dot
            }
            '{' => {
                self.bump();
                TokenKind::LBrace
            }
            '}' => {
                self.bump();
                TokenKind::RBrace
            }
            '[' => {
                self.bump();
                TokenKind::LBracket
            }
            ']' => {
                self.bump();
                TokenKind::RBracket
            }
            '(' => {
                self.bump();
                TokenKind::LParen
            }
            ')' => {
                self.bump();
                TokenKind::RParen
            }
            '@' => {
                self.bump();
                TokenKind::At
            }
            '-' => {
                self.bump();
                TokenKind::Minus
            }
            '?' => {
                self.bump();
                TokenKind::Question
            }
            '*' => {
                self.bump();
                if self.peek_char() == Some('*') {
                    self.bump();
                    TokenKind::DoubleStar
                } else {
                    TokenKind::Star
                }
            }
            '"' | '\'' => self.lex_string(c, start)?,
            '~' => self.lex_regex('~', start)?,
            '/' => self.lex_regex('/', start)?,
            c if c.is_ascii_digit() => self.lex_number(start),
            c if c.is_alphabetic() || c == '_' => self.lex_ident(start),
            other => {
                return Err(SyntaxError::new(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };

        let end = self.position();
        Ok(Token { kind, position: start, end })
    }

    fn lex_ident(&mut self, start: usize) -> TokenKind {
        let mut name = String::new();
        while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
            name.push(self.bump().unwrap());
        }
        let _ = start;
        TokenKind::Ident(name)
    }

    fn lex_number(&mut self, start: usize) -> TokenKind {
        let mut digits = String::new();
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            digits.push(self.bump().unwrap());
        }
        let _ = start;
        TokenKind::Integer(digits.parse().unwrap_or(0))
    }

    fn lex_string(&mut self, quote: char, start: usize) -> Result<TokenKind, SyntaxError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(TokenKind::StringLiteral(value)),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(SyntaxError::new(start, "unterminated string literal")),
                },
                Some(c) => value.push(c),
                None => return Err(SyntaxError::new(start, "unterminated string literal")),
            }
        }
    }

    /// `~pattern~flags` or `/pattern/flags`; `delim` is `~` or `/`.
    fn lex_regex(&mut self, delim: char, start: usize) -> Result<TokenKind, SyntaxError> {
        self.bump(); // opening delimiter
        let mut pattern = String::new();
        loop {
            match self.bump() {
                Some(c) if c == delim => break,
                Some('\\') => {
                    pattern.push('\\');
                    match self.bump() {
                        Some(escaped) => pattern.push(escaped),
                        None => return Err(SyntaxError::new(start, "unterminated regex literal")),
                    }
                }
                Some(c) => pattern.push(c),
                None => return Err(SyntaxError::new(start, "unterminated regex literal")),
            }
        }
        let mut flags = String::new();
        while matches!(self.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
            flags.push(self.bump().unwrap());
        }
        Ok(TokenKind::RegexLiteral { pattern, flags })
    }
}
