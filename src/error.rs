//! Centralized error handling for the filter engine.
//!
//! Mirrors the layered error hierarchy pattern of the crate this
//! implementation follows the idiom of: small, focused error enums for each
//! subsystem, rolled up into one top-level type via `#[from]` so callers can
//! match on a single `FilterError` while still downcasting to the specific
//! kind when they need position or field detail.

use thiserror::Error;

/// Convenience alias for results returned by the public engine API.
pub type FilterResult<T> = Result<T, FilterError>;

/// Top-level error type for the filter engine.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Malformed filter text; carries position and message. Not retried.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// Unknown function name or invocation failure from the external invoker.
    #[error("function error: {0}")]
    Function(#[from] FunctionError),

    /// Internal invariant violation in the matcher. Indicates a bug.
    #[error("internal matcher error: {0}")]
    Match(#[from] MatchError),

    /// Failure loading `EngineConfig` from a layered source.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Malformed filter text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {position}")]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
    /// Token kinds that would have been accepted at `position`, for diagnostics.
    pub expected: Vec<&'static str>,
}

impl SyntaxError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn expected(position: usize, message: impl Into<String>, expected: Vec<&'static str>) -> Self {
        Self {
            position,
            message: message.into(),
            expected,
        }
    }
}

/// Failure from the external function invoker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' failed: {message}")]
    InvocationFailed { name: String, message: String },
}

/// Internal invariant violation. Indicates a bug in the matcher, not bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("expression node '{0}' has no children but descent was attempted")]
    DescentOnLeaf(String),

    #[error("inconsistent expression tree: {0}")]
    InconsistentTree(String),
}

/// Failure assembling `EngineConfig` from file/env sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}
