//! Host-agnostic capability surface the walker needs from a JSON tree.
//!
//! The engine never depends on `serde_json` directly in its core modules —
//! only on this trait. A host embeds its own document representation by
//! implementing [`JsonNode`] once; the bundled `serde_json::Value` adapter
//! in [`crate::json_value`] (feature `serde_json`, on by default) is just
//! the reference implementation, not a privileged one.

use crate::ast::LiteralValue;

/// A node's structural shape, with immediate children still in the host's
/// own representation.
pub enum NodeShape<N> {
    Object(Vec<(String, N)>),
    Array(Vec<N>),
    Scalar,
}

pub trait JsonNode: Clone {
    /// Inspects this node's current shape.
    fn value(&self) -> NodeShape<Self>;

    /// Rebuilds a node as a string scalar holding `s`, preserving whatever
    /// host-specific wrapper a string value needs. Used by value/key
    /// functions to produce their rewritten output.
    fn transform(&self, s: String) -> Self;

    /// Builds a node from a shape, the inverse direction of [`Self::value`].
    fn create(shape: NodeShape<Self>) -> Self;

    /// Materializes a DSL literal (a function argument, or a `default(...)`
    /// replacement) as a node in the host representation.
    fn from_literal(value: &LiteralValue) -> Self;

    /// Borrows this node's string payload, if it is a string scalar.
    fn as_str(&self) -> Option<&str>;

    /// True for a JSON `null` (or the host's equivalent absent-value marker).
    fn is_null(&self) -> bool;
}
