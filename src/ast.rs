//! Abstract syntax tree for a parsed filter.
//!
//! The tree is held in a flat arena (`Vec<ExpressionNodeData>`) addressed by
//! [`NodeId`], with children as owned indices and `parent` as a *relation*
//! index rather than a second ownership path — the design note this follows:
//! "never a second ownership path" for the parent back-reference. The arena
//! itself is immutable once built and wrapped in [`triomphe::Arc`] so a
//! [`Filter`] is cheap to clone and safe to share across concurrent walks.

use regex::Regex;
use triomphe::Arc;

/// Index of a node within a [`Filter`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Specificity class of an expression node, driving the matcher's scoring
/// (see the matcher module for the actual numeric scores).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Exact,
    AnyShallow,
    AnyDeep,
    Glob,
    Regex,
}

/// A compiled wildcard/regex pattern attached to `glob`/`regex` nodes.
#[derive(Debug, Clone)]
pub struct CompiledPattern(pub Regex);

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ExpressionNodeData {
    pub name: String,
    pub raw_name: String,
    pub kind: ExpressionKind,
    pub negated: bool,
    pub squiggly: bool,
    pub empty_nested: bool,
    pub regex: Option<CompiledPattern>,
    pub children: Vec<NodeId>,
    pub key_functions: Vec<FunctionCall>,
    pub value_functions: Vec<FunctionCall>,
    pub parent: Option<NodeId>,
}

/// Owns every [`ExpressionNodeData`] reachable from a [`Filter`]'s statements.
#[derive(Debug, Default)]
pub struct ExpressionArena {
    nodes: Vec<ExpressionNodeData>,
}

impl ExpressionArena {
    pub(crate) fn push(&mut self, data: ExpressionNodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &ExpressionNodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut ExpressionNodeData {
        &mut self.nodes[id.0]
    }

    pub(crate) fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A borrowed view of one AST node plus the arena it lives in; the
/// ergonomic handle used by the matcher and walker instead of raw indices.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionNode<'a> {
    arena: &'a ExpressionArena,
    id: NodeId,
}

impl<'a> ExpressionNode<'a> {
    pub(crate) fn new(arena: &'a ExpressionArena, id: NodeId) -> Self {
        Self { arena, id }
    }

    fn data(&self) -> &'a ExpressionNodeData {
        self.arena.get(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn raw_name(&self) -> &'a str {
        &self.data().raw_name
    }

    pub fn kind(&self) -> ExpressionKind {
        self.data().kind
    }

    pub fn negated(&self) -> bool {
        self.data().negated
    }

    pub fn squiggly(&self) -> bool {
        self.data().squiggly
    }

    pub fn empty_nested(&self) -> bool {
        self.data().empty_nested
    }

    /// Whether the walker/matcher should descend into this node's children
    /// at all, as opposed to passing the matched value through unfiltered.
    /// Driven by the presence of children or an explicit empty nested block
    /// (`foo{}`), not by `squiggly()` — a dot-sugar intermediate (`a.b.c`)
    /// has children but is non-`squiggly`, and still must be descended into
    /// for dot-path and brace nesting to behave identically.
    pub fn should_descend(&self) -> bool {
        !self.data().children.is_empty() || self.data().empty_nested
    }

    pub fn regex(&self) -> Option<&'a Regex> {
        self.data().regex.as_ref().map(|p| &p.0)
    }

    pub fn key_functions(&self) -> &'a [FunctionCall] {
        &self.data().key_functions
    }

    pub fn value_functions(&self) -> &'a [FunctionCall] {
        &self.data().value_functions
    }

    pub fn children(&self) -> impl Iterator<Item = ExpressionNode<'a>> + 'a {
        let arena = self.arena;
        self.data().children.iter().map(move |&id| ExpressionNode::new(arena, id))
    }

    pub fn parent(&self) -> Option<ExpressionNode<'a>> {
        self.data().parent.map(|id| ExpressionNode::new(self.arena, id))
    }
}

/// `name: args` call attached to an expression's key/value function list.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<Argument>,
}

/// A non-literal, host-agnostic scalar usable as a function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    Bool(bool),
    Null,
}

/// One argument to a [`FunctionCall`]. The engine never interprets argument
/// semantics beyond this shape — it passes them verbatim to the invoker.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(LiteralValue),
    Ref(String),
    Call(FunctionCall),
}

/// One top-level comma-separated branch of a filter.
#[derive(Debug, Clone, Copy)]
pub struct Statement {
    pub(crate) root: NodeId,
}

/// A fully parsed filter: an ordered sequence of [`Statement`]s sharing one
/// immutable arena. Statements combine by set-union over matched paths.
#[derive(Debug, Clone)]
pub struct Filter {
    pub(crate) arena: Arc<ExpressionArena>,
    pub(crate) statements: Vec<Statement>,
}

impl Filter {
    pub(crate) fn new(arena: ExpressionArena, statements: Vec<Statement>) -> Self {
        Self {
            arena: Arc::new(arena),
            statements,
        }
    }

    pub fn statements(&self) -> impl Iterator<Item = ExpressionNode<'_>> {
        self.statements.iter().map(|s| ExpressionNode::new(&self.arena, s.root))
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }
}

impl PartialEq for Filter {
    /// Structural equality: same shape, independent of arena identity. Used
    /// by the parse-cache-transparency property (`parse(s) == parse(s)`).
    fn eq(&self, other: &Self) -> bool {
        if self.statements.len() != other.statements.len() {
            return false;
        }
        self.statements()
            .zip(other.statements())
            .all(|(a, b)| expression_eq(a, b))
    }
}

fn expression_eq(a: ExpressionNode<'_>, b: ExpressionNode<'_>) -> bool {
    if a.name() != b.name()
        || a.kind() != b.kind()
        || a.negated() != b.negated()
        || a.should_descend() != b.should_descend()
        || a.key_functions() != b.key_functions()
        || a.value_functions() != b.value_functions()
    {
        return false;
    }
    let a_children: Vec<_> = a.children().collect();
    let b_children: Vec<_> = b.children().collect();
    a_children.len() == b_children.len()
        && a_children.into_iter().zip(b_children).all(|(x, y)| expression_eq(x, y))
}
