//! Depth-first tree walk that applies a parsed [`Filter`] to a host document.
//!
//! Arrays are transparent to matching: stepping into an array element does
//! not consume a level of the [`MatcherState`] frontier, since the DSL
//! addresses properties by name, not by position. Everything else mirrors
//! the matcher's own outcome trichotomy: `NeverMatch`/`Exclude` drop the
//! property and its subtree without recursing; `Include` recurses whenever
//! the winning node has children or an explicit empty nested block
//! (`should_descend()`) — true for both `a{b}` and its dot-sugar `a.b` —
//! otherwise the value is copied through unchanged.

use crate::ast::{ExpressionNode, Filter};
use crate::error::FilterResult;
use crate::function::{FunctionInvoker, NodeContext};
use crate::matcher::{MatchOutcome, MatcherState};
use crate::node::{JsonNode, NodeShape};

/// Applies `filter` to `root`, returning a new document holding only the
/// included properties with key/value functions applied.
pub fn apply<N, F>(root: &N, filter: &Filter, invoker: &F) -> FilterResult<N>
where
    N: JsonNode,
    F: FunctionInvoker<N>,
{
    let mut path = Vec::new();
    walk_value(root, filter, &MatcherState::root(filter), &mut path, invoker)
}

fn walk_value<N, F>(value: &N, filter: &Filter, state: &MatcherState, path: &mut Vec<String>, invoker: &F) -> FilterResult<N>
where
    N: JsonNode,
    F: FunctionInvoker<N>,
{
    match value.value() {
        NodeShape::Object(entries) => {
            let filtered = walk_object(value, &entries, filter, state, path, invoker)?;
            Ok(N::create(NodeShape::Object(filtered)))
        }
        NodeShape::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(walk_value(item, filter, state, path, invoker)?);
            }
            Ok(N::create(NodeShape::Array(out)))
        }
        NodeShape::Scalar => Ok(value.clone()),
    }
}

fn walk_object<N, F>(
    container: &N,
    entries: &[(String, N)],
    filter: &Filter,
    state: &MatcherState,
    path: &mut Vec<String>,
    invoker: &F,
) -> FilterResult<Vec<(String, N)>>
where
    N: JsonNode,
    F: FunctionInvoker<N>,
{
    let mut out = Vec::new();
    for (key, value) in entries {
        let (outcome, next_state) = state.step(key, filter);
        let node = match outcome {
            MatchOutcome::NeverMatch | MatchOutcome::Exclude => continue,
            MatchOutcome::Include(node) => node,
        };

        path.push(key.clone());

        let mut new_value = if node.should_descend() {
            walk_value(value, filter, &next_state, path, invoker)?
        } else {
            value.clone()
        };
        new_value = apply_value_functions(new_value, &node, container, path, invoker)?;

        let new_key = apply_key_functions(key, &node, container, path, invoker)?;

        path.pop();
        out.push((new_key, new_value));
    }
    Ok(out)
}

fn apply_value_functions<N, F>(
    mut value: N,
    node: &ExpressionNode<'_>,
    parent: &N,
    path: &[String],
    invoker: &F,
) -> FilterResult<N>
where
    N: JsonNode,
    F: FunctionInvoker<N>,
{
    let context = NodeContext {
        path: path.to_vec(),
        key: path.last().cloned().unwrap_or_default(),
        parent: Some(parent.clone()),
    };
    for call in node.value_functions() {
        value = invoker.invoke(call, &value, &context)?;
    }
    Ok(value)
}

fn apply_key_functions<N, F>(
    key: &str,
    node: &ExpressionNode<'_>,
    parent: &N,
    path: &[String],
    invoker: &F,
) -> FilterResult<String>
where
    N: JsonNode,
    F: FunctionInvoker<N>,
{
    if node.key_functions().is_empty() {
        return Ok(key.to_string());
    }
    let context = NodeContext { path: path.to_vec(), key: key.to_string(), parent: Some(parent.clone()) };
    let mut as_node = N::from_literal(&crate::ast::LiteralValue::String(key.to_string()));
    for call in node.key_functions() {
        as_node = invoker.invoke(call, &as_node, &context)?;
    }
    Ok(as_node.as_str().map(str::to_string).unwrap_or_else(|| key.to_string()))
}
