//! A JSON property-filter engine: parses a small DSL describing which
//! properties of a document tree to keep, drop, rename, or rewrite, and
//! applies it to a document at serialization time.
//!
//! The core (`ast`, `lexer`, `parser`, `matcher`, `walker`, `node`) never
//! depends on a concrete JSON representation — a host implements
//! [`node::JsonNode`] once for its own document type. The `serde_json`
//! feature (on by default) bundles a reference adapter over
//! `serde_json::Value` so the engine works out of the box.

pub mod ast;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod function;
pub mod lexer;
pub mod matcher;
pub mod node;
pub mod parser;
pub mod view;
pub mod walker;

#[cfg(feature = "serde_json")]
pub mod json_value;

pub use ast::Filter;
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{ConfigError, FilterError, FilterResult, FunctionError, MatchError, SyntaxError};
pub use function::{BuiltinFunctions, FunctionInvoker, NodeContext};
pub use node::{JsonNode, NodeShape};
pub use parser::FilterParser;
pub use view::{NoViews, ViewSource};

#[cfg(feature = "serde_json")]
pub use json_value::JsonValueNode;
