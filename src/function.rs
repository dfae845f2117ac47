//! External function invocation.
//!
//! The engine knows nothing about what `@mask` or `@upper` actually do —
//! it only knows how to parse a [`FunctionCall`] and, at walk time, hand it
//! to an injected [`FunctionInvoker`]. [`BuiltinFunctions`] is a small
//! reference registry covering the handful of string transforms the
//! testable-property scenarios exercise; hosts are expected to bring their
//! own registry for anything domain-specific and can wrap or fall back to
//! this one.

use crate::ast::{Argument, FunctionCall, LiteralValue};
use crate::error::{FilterError, FilterResult, FunctionError};
use crate::node::JsonNode;

/// Where a function call is being evaluated: the path to the property
/// (key functions see the pre-rename key; value functions see the
/// containing property's key), the original key name, and the enclosing
/// node a host invoker may need for context-dependent transforms (e.g. a
/// `mask` that only applies given a sibling field's value).
#[derive(Clone)]
pub struct NodeContext<N> {
    pub path: Vec<String>,
    pub key: String,
    pub parent: Option<N>,
}

impl<N> std::fmt::Debug for NodeContext<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("path", &self.path)
            .field("key", &self.key)
            .field("parent", &self.parent.is_some())
            .finish()
    }
}

/// Invokes a named function against a node, producing its replacement.
/// Implemented once per host and injected into the engine at construction.
pub trait FunctionInvoker<N> {
    fn invoke(&self, call: &FunctionCall, input: &N, context: &NodeContext<N>) -> FilterResult<N>;
}

/// A small set of string functions good enough to exercise the engine
/// end-to-end without a host-supplied registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFunctions;

impl<N: JsonNode> FunctionInvoker<N> for BuiltinFunctions {
    fn invoke(&self, call: &FunctionCall, input: &N, _context: &NodeContext<N>) -> FilterResult<N> {
        match call.name.as_str() {
            "upper" => {
                let s = input.as_str().unwrap_or_default();
                Ok(input.transform(s.to_uppercase()))
            }
            "lower" => {
                let s = input.as_str().unwrap_or_default();
                Ok(input.transform(s.to_lowercase()))
            }
            "truncate" => {
                let n = expect_integer_arg(call, 0)? as usize;
                let s = input.as_str().unwrap_or_default();
                Ok(input.transform(s.chars().take(n).collect()))
            }
            "mask" => {
                let replacement = expect_string_arg(call, 0)?;
                Ok(input.transform(replacement))
            }
            "default" => {
                if input.is_null() {
                    let literal = expect_literal_arg(call, 0)?;
                    Ok(N::from_literal(literal))
                } else {
                    Ok(input.clone())
                }
            }
            other => Err(FilterError::Function(FunctionError::UnknownFunction(other.to_string()))),
        }
    }
}

fn invocation_failed(call: &FunctionCall, message: impl Into<String>) -> FilterError {
    FilterError::Function(FunctionError::InvocationFailed {
        name: call.name.clone(),
        message: message.into(),
    })
}

fn expect_literal_arg(call: &FunctionCall, index: usize) -> FilterResult<&LiteralValue> {
    match call.arguments.get(index) {
        Some(Argument::Literal(v)) => Ok(v),
        Some(_) => Err(invocation_failed(call, format!("argument {index} must be a literal"))),
        None => Err(invocation_failed(call, format!("missing argument {index}"))),
    }
}

fn expect_integer_arg(call: &FunctionCall, index: usize) -> FilterResult<i64> {
    match expect_literal_arg(call, index)? {
        LiteralValue::Integer(n) => Ok(*n),
        _ => Err(invocation_failed(call, format!("argument {index} must be an integer"))),
    }
}

fn expect_string_arg(call: &FunctionCall, index: usize) -> FilterResult<String> {
    match expect_literal_arg(call, index)? {
        LiteralValue::String(s) => Ok(s.clone()),
        _ => Err(invocation_failed(call, format!("argument {index} must be a string"))),
    }
}
