//! Recursive-descent parser for the filter DSL.
//!
//! One token of lookahead throughout; the only place that needs more than
//! that is glob-fragment merging (`issue*`), which is resolved by comparing
//! byte offsets rather than buffering extra tokens. Grouping
//! (`(a,b)[tail]`) distributes a shared nested/function suffix across each
//! member by deep-cloning the suffix's subtree per member, since the arena's
//! parent pointer is a single-owner relation, not a shared one.

use std::sync::Arc as StdArc;

use regex::Regex;

use crate::ast::{
    Argument, CompiledPattern, ExpressionArena, ExpressionKind, ExpressionNodeData, Filter,
    FunctionCall, LiteralValue, NodeId, Statement,
};
use crate::error::SyntaxError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::view::{NoViews, ViewSource};

/// Parses filter text into a [`Filter`].
///
/// Stateless aside from the injected [`ViewSource`]; safe to share across
/// threads and reuse across many `parse` calls, which is how the parse
/// cache uses it.
pub struct FilterParser {
    view_source: StdArc<dyn ViewSource>,
}

impl Default for FilterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterParser {
    pub fn new() -> Self {
        Self {
            view_source: StdArc::new(NoViews),
        }
    }

    pub fn with_view_source(view_source: StdArc<dyn ViewSource>) -> Self {
        Self { view_source }
    }

    /// Parses `text` into a [`Filter`]. An empty (or whitespace-only) string
    /// is a valid filter with zero statements, matching nothing.
    pub fn parse(&self, text: &str) -> Result<Filter, SyntaxError> {
        if text.trim().is_empty() {
            return Ok(Filter::new(ExpressionArena::default(), Vec::new()));
        }

        let mut arena = ExpressionArena::default();
        let mut state = ParserState::new(text, self.view_source.as_ref())?;
        let roots = state.parse_expression_list(&mut arena)?;
        state.expect_eof()?;

        let statements = roots.into_iter().map(|root| Statement { root }).collect();
        Ok(Filter::new(arena, statements))
    }
}

struct ParserState<'a> {
    lexer: Lexer<'a>,
    current: Token,
    view_source: &'a dyn ViewSource,
}

impl<'a> ParserState<'a> {
    fn new(text: &'a str, view_source: &'a dyn ViewSource) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current, view_source })
    }

    fn bump(&mut self) -> Result<Token, SyntaxError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, SyntaxError> {
        if &self.current.kind == kind {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, SyntaxError> {
        if &self.current.kind == kind {
            self.bump()
        } else {
            Err(SyntaxError::expected(
                self.current.position,
                format!("expected {}, found {}", kind.describe(), self.current.kind.describe()),
                vec![kind.describe()],
            ))
        }
    }

    fn expect_eof(&mut self) -> Result<(), SyntaxError> {
        if self.current.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(SyntaxError::expected(
                self.current.position,
                format!("unexpected trailing {}", self.current.kind.describe()),
                vec![TokenKind::Eof.describe()],
            ))
        }
    }

    /// `expression (',' expression)*`, used both for a top-level filter and
    /// for a nested/group block's contents.
    fn parse_expression_list(&mut self, arena: &mut ExpressionArena) -> Result<Vec<NodeId>, SyntaxError> {
        let mut ids = Vec::new();
        loop {
            ids.extend(self.parse_expression(arena)?);
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(ids)
    }

    /// `['-'] name ['@' funcs] nested? ['@' funcs]`
    fn parse_expression(&mut self, arena: &mut ExpressionArena) -> Result<Vec<NodeId>, SyntaxError> {
        let negated = self.eat(&TokenKind::Minus)?;
        let ids = self.parse_name(arena)?;
        let value_functions = self.parse_optional_funcs()?;
        let nested = self.parse_optional_nested(arena)?;
        let key_functions = if nested.is_some() {
            self.parse_optional_funcs()?
        } else {
            Vec::new()
        };

        for &id in &ids {
            let children: Vec<NodeId> = nested
                .as_ref()
                .map(|n| n.children.iter().map(|&c| clone_subtree(arena, c)).collect())
                .unwrap_or_default();
            for &c in &children {
                arena.set_parent(c, id);
            }

            let data = arena.get_mut(id);
            data.negated = data.negated || negated;
            data.value_functions.extend(value_functions.clone());
            data.key_functions.extend(key_functions.clone());
            if let Some(n) = &nested {
                data.children.extend(children);
                if n.squiggly {
                    data.squiggly = true;
                }
                if n.empty_nested {
                    data.empty_nested = true;
                    data.children.clear();
                }
            }
        }

        Ok(ids)
    }

    /// `name := ident | glob | '*' | '**' | regex | '(' expression (',' expression)* ')'`
    ///
    /// A group form yields one `NodeId` per member; everything else yields
    /// exactly one, except a bare identifier that resolves against the
    /// injected [`ViewSource`], which expands into one node per field.
    fn parse_name(&mut self, arena: &mut ExpressionArena) -> Result<Vec<NodeId>, SyntaxError> {
        match &self.current.kind {
            TokenKind::LParen => {
                self.bump()?;
                let ids = self.parse_expression_list(arena)?;
                self.expect(&TokenKind::RParen)?;
                Ok(ids)
            }
            TokenKind::DoubleStar => {
                self.bump()?;
                Ok(vec![push_leaf(arena, ExpressionKind::AnyDeep, "**".into(), String::new(), None)])
            }
            TokenKind::RegexLiteral { .. } => {
                let TokenKind::RegexLiteral { pattern, flags } = self.bump()?.kind else {
                    unreachable!()
                };
                let regex = compile_regex(&pattern, &flags, self.current.position)?;
                let raw_name: String = pattern.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect();
                Ok(vec![push_leaf(arena, ExpressionKind::Regex, pattern, raw_name, Some(regex))])
            }
            TokenKind::Ident(_) | TokenKind::Star | TokenKind::Question => {
                let (text, has_wildcard) = self.parse_name_fragment()?;
                if text.is_empty() {
                    return Err(SyntaxError::expected(
                        self.current.position,
                        "expected a field name",
                        vec!["identifier", "'*'", "'**'", "regex literal", "'('"],
                    ));
                }
                if text == "*" {
                    return Ok(vec![push_leaf(arena, ExpressionKind::AnyShallow, text, String::new(), None)]);
                }
                if has_wildcard {
                    let regex = compile_glob(&text);
                    let raw_name: String = text.chars().filter(|c| *c != '*' && *c != '?').collect();
                    return Ok(vec![push_leaf(arena, ExpressionKind::Glob, text, raw_name, Some(regex))]);
                }
                if let Some(fields) = self.view_source.resolve(&text) {
                    return Ok(fields
                        .into_iter()
                        .map(|f| push_leaf(arena, ExpressionKind::Exact, f.clone(), f, None))
                        .collect());
                }
                Ok(vec![push_leaf(arena, ExpressionKind::Exact, text.clone(), text, None)])
            }
            _ => Err(SyntaxError::expected(
                self.current.position,
                format!("expected a field name, found {}", self.current.kind.describe()),
                vec!["identifier", "'*'", "'**'", "regex literal", "'('"],
            )),
        }
    }

    /// Merges adjacent (no intervening whitespace) `Ident`/`Star`/`Question`
    /// tokens into one glob fragment, e.g. `issue*` or `*Summary`.
    fn parse_name_fragment(&mut self) -> Result<(String, bool), SyntaxError> {
        let mut out = String::new();
        let mut has_wildcard = false;
        let mut prev_end: Option<usize> = None;

        loop {
            if let Some(end) = prev_end {
                if end != self.current.position {
                    break;
                }
            }
            match &self.current.kind {
                TokenKind::Ident(s) => {
                    out.push_str(s);
                    prev_end = Some(self.current.end);
                    self.bump()?;
                }
                TokenKind::Star => {
                    out.push('*');
                    has_wildcard = true;
                    prev_end = Some(self.current.end);
                    self.bump()?;
                }
                TokenKind::Question => {
                    out.push('?');
                    has_wildcard = true;
                    prev_end = Some(self.current.end);
                    self.bump()?;
                }
                _ => break,
            }
        }

        Ok((out, has_wildcard))
    }

    /// `'@' func ('.' func)*`
    fn parse_optional_funcs(&mut self) -> Result<Vec<FunctionCall>, SyntaxError> {
        if !self.eat(&TokenKind::At)? {
            return Ok(Vec::new());
        }
        let mut calls = vec![self.parse_func()?];
        while self.eat(&TokenKind::Dot)? {
            calls.push(self.parse_func()?);
        }
        Ok(calls)
    }

    fn parse_func(&mut self) -> Result<FunctionCall, SyntaxError> {
        let name = self.expect_ident()?;
        let arguments = if self.eat(&TokenKind::LParen)? {
            let args = if self.current.kind == TokenKind::RParen {
                Vec::new()
            } else {
                let mut args = vec![self.parse_argument()?];
                while self.eat(&TokenKind::Comma)? {
                    args.push(self.parse_argument()?);
                }
                args
            };
            self.expect(&TokenKind::RParen)?;
            args
        } else {
            Vec::new()
        };
        Ok(FunctionCall { name, arguments })
    }

    fn parse_argument(&mut self) -> Result<Argument, SyntaxError> {
        match self.current.kind.clone() {
            TokenKind::StringLiteral(s) => {
                self.bump()?;
                Ok(Argument::Literal(LiteralValue::String(s)))
            }
            TokenKind::Integer(n) => {
                self.bump()?;
                Ok(Argument::Literal(LiteralValue::Integer(n)))
            }
            TokenKind::Ident(name) => {
                self.bump()?;
                match name.as_str() {
                    "true" => Ok(Argument::Literal(LiteralValue::Bool(true))),
                    "false" => Ok(Argument::Literal(LiteralValue::Bool(false))),
                    "null" => Ok(Argument::Literal(LiteralValue::Null)),
                    _ if self.current.kind == TokenKind::LParen => {
                        self.bump()?;
                        let args = if self.current.kind == TokenKind::RParen {
                            Vec::new()
                        } else {
                            let mut args = vec![self.parse_argument()?];
                            while self.eat(&TokenKind::Comma)? {
                                args.push(self.parse_argument()?);
                            }
                            args
                        };
                        self.expect(&TokenKind::RParen)?;
                        Ok(Argument::Call(FunctionCall { name, arguments: args }))
                    }
                    _ => Ok(Argument::Ref(name)),
                }
            }
            _ => Err(SyntaxError::expected(
                self.current.position,
                format!("expected a function argument, found {}", self.current.kind.describe()),
                vec!["string literal", "integer", "identifier"],
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        match self.current.kind.clone() {
            TokenKind::Ident(name) => {
                self.bump()?;
                Ok(name)
            }
            other => Err(SyntaxError::expected(
                self.current.position,
                format!("expected an identifier, found {}", other.describe()),
                vec!["identifier"],
            )),
        }
    }

    /// `nested := '.' expression | '{' filter? '}' | '[' filter? ']'`
    fn parse_optional_nested(&mut self, arena: &mut ExpressionArena) -> Result<Option<NestedBlock>, SyntaxError> {
        match self.current.kind {
            TokenKind::Dot => {
                self.bump()?;
                let children = self.parse_expression(arena)?;
                Ok(Some(NestedBlock { children, squiggly: false, empty_nested: false }))
            }
            TokenKind::LBrace => self.parse_bracketed_nested(arena, &TokenKind::LBrace, &TokenKind::RBrace),
            TokenKind::LBracket => self.parse_bracketed_nested(arena, &TokenKind::LBracket, &TokenKind::RBracket),
            _ => Ok(None),
        }
    }

    fn parse_bracketed_nested(
        &mut self,
        arena: &mut ExpressionArena,
        open: &TokenKind,
        close: &TokenKind,
    ) -> Result<Option<NestedBlock>, SyntaxError> {
        self.expect(open)?;
        if self.eat(close)? {
            return Ok(Some(NestedBlock { children: Vec::new(), squiggly: true, empty_nested: true }));
        }
        let children = self.parse_expression_list(arena)?;
        self.expect(close)?;
        Ok(Some(NestedBlock { children, squiggly: true, empty_nested: false }))
    }
}

struct NestedBlock {
    children: Vec<NodeId>,
    squiggly: bool,
    empty_nested: bool,
}

fn push_leaf(
    arena: &mut ExpressionArena,
    kind: ExpressionKind,
    name: String,
    raw_name: String,
    regex: Option<Regex>,
) -> NodeId {
    arena.push(ExpressionNodeData {
        name,
        raw_name,
        kind,
        negated: false,
        squiggly: false,
        empty_nested: false,
        regex: regex.map(CompiledPattern),
        children: Vec::new(),
        key_functions: Vec::new(),
        value_functions: Vec::new(),
        parent: None,
    })
}

/// Deep-copies a subtree so a distributed group member (`(a,b)[tail]`) gets
/// its own independent copy of the shared suffix rather than a second
/// parent pointer into someone else's nodes.
fn clone_subtree(arena: &mut ExpressionArena, id: NodeId) -> NodeId {
    let data = arena.get(id).clone();
    let old_children = data.children.clone();
    let new_id = arena.push(ExpressionNodeData { children: Vec::new(), parent: None, ..data });
    let new_children: Vec<NodeId> = old_children.iter().map(|&c| clone_subtree(arena, c)).collect();
    for &c in &new_children {
        arena.set_parent(c, new_id);
    }
    arena.get_mut(new_id).children = new_children;
    new_id
}

fn compile_glob(text: &str) -> Regex {
    let mut pattern = String::from("^");
    for c in text.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).expect("glob-derived pattern always compiles")
}

fn compile_regex(pattern: &str, flags: &str, position: usize) -> Result<Regex, SyntaxError> {
    let body = if flags.contains('i') {
        format!("(?i)^(?:{pattern})$")
    } else {
        format!("^(?:{pattern})$")
    };
    Regex::new(&body).map_err(|e| SyntaxError::new(position, format!("invalid regex: {e}")))
}
