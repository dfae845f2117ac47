//! Public entry point tying parser, cache, matcher/walker, and the
//! function/view hooks together behind one handle.

use std::sync::Arc;

use tracing::debug;

use crate::ast::Filter;
use crate::cache::ParseCache;
use crate::config::EngineConfig;
use crate::error::FilterResult;
use crate::function::{BuiltinFunctions, FunctionInvoker};
use crate::node::{JsonNode, NodeShape};
use crate::parser::FilterParser;
use crate::view::{NoViews, ViewSource};
use crate::walker;

/// A constructed engine: parser + cache + injected hooks, reusable and
/// `Send + Sync` as long as `N` is.
pub struct Engine<N> {
    cache: ParseCache,
    invoker: Arc<dyn FunctionInvoker<N> + Send + Sync>,
    config: EngineConfig,
}

impl<N> Engine<N>
where
    N: JsonNode,
    BuiltinFunctions: FunctionInvoker<N>,
{
    /// An engine with default configuration, no views, and the built-in
    /// function registry.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }
}

impl<N> Default for Engine<N>
where
    N: JsonNode,
    BuiltinFunctions: FunctionInvoker<N>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N: JsonNode> Engine<N> {
    /// A builder that starts with no function registry at all — a host
    /// that wants anything other than the bare built-ins must call
    /// [`EngineBuilder::function_invoker`] before `build()`. Use
    /// [`Engine::new`] instead if the built-ins are enough.
    pub fn builder() -> EngineBuilder<N> {
        EngineBuilder::default_with(Arc::new(NoFallbackInvoker))
    }

    /// Parses filter text, transparently going through the parse cache.
    pub fn parse(&self, text: &str) -> FilterResult<Filter> {
        Ok(self.cache.parse(text)?)
    }

    /// Applies one filter to `root`.
    pub fn apply_one(&self, root: &N, filter_text: &str) -> FilterResult<N> {
        let filter = self.parse(filter_text)?;
        debug!(statements = filter.statement_count(), nodes = filter.node_count(), "[ENGINE_APPLY] applying filter");
        walker::apply(root, &filter, self.invoker.as_ref())
    }

    /// Applies several filters to `root` and combines their results by
    /// structural union: a property survives if *any* filter includes it,
    /// and where two filters both include an object/array property their
    /// sub-results are merged recursively rather than one replacing the
    /// other.
    pub fn apply(&self, root: &N, filter_texts: &[&str]) -> FilterResult<N> {
        if filter_texts.is_empty() {
            return self.apply_one(root, "");
        }
        let mut merged: Option<N> = None;
        for text in filter_texts {
            let result = self.apply_one(root, text)?;
            merged = Some(match merged {
                None => result,
                Some(acc) => merge_nodes(acc, result),
            });
        }
        Ok(merged.expect("filter_texts is non-empty"))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Builder for [`Engine`]; lets a host inject its own view resolver and/or
/// function registry before any parsing happens.
pub struct EngineBuilder<N> {
    view_source: Arc<dyn ViewSource>,
    invoker: Arc<dyn FunctionInvoker<N> + Send + Sync>,
    config: EngineConfig,
}

impl<N> EngineBuilder<N>
where
    N: JsonNode,
    BuiltinFunctions: FunctionInvoker<N>,
{
    pub fn new() -> Self {
        Self::default_with(Arc::new(BuiltinFunctions))
    }
}

impl<N: JsonNode> EngineBuilder<N> {
    fn default_with(invoker: Arc<dyn FunctionInvoker<N> + Send + Sync>) -> Self {
        Self { view_source: Arc::new(NoViews), invoker, config: EngineConfig::default() }
    }

    pub fn view_source(mut self, view_source: Arc<dyn ViewSource>) -> Self {
        self.view_source = view_source;
        self
    }

    pub fn function_invoker(mut self, invoker: Arc<dyn FunctionInvoker<N> + Send + Sync>) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Engine<N> {
        let parser = FilterParser::with_view_source(self.view_source);
        Engine {
            cache: ParseCache::new(parser, &self.config),
            invoker: self.invoker,
            config: self.config,
        }
    }
}

/// Placeholder invoker used only as `Engine::builder()`'s starting point
/// when the host hasn't picked a registry yet; any real `apply` call must
/// go through `function_invoker` first or building panics with a clear
/// unknown-function error instead of silently doing nothing.
struct NoFallbackInvoker;

impl<N> FunctionInvoker<N> for NoFallbackInvoker {
    fn invoke(
        &self,
        call: &crate::ast::FunctionCall,
        _input: &N,
        _context: &crate::function::NodeContext<N>,
    ) -> FilterResult<N> {
        Err(crate::error::FunctionError::UnknownFunction(call.name.clone()).into())
    }
}

fn merge_nodes<N: JsonNode>(a: N, b: N) -> N {
    match (a.value(), b.value()) {
        (NodeShape::Object(a_entries), NodeShape::Object(b_entries)) => {
            let mut merged: Vec<(String, N)> = a_entries;
            for (key, b_value) in b_entries {
                if let Some(existing) = merged.iter_mut().find(|(k, _)| *k == key) {
                    existing.1 = merge_nodes(existing.1.clone(), b_value);
                } else {
                    merged.push((key, b_value));
                }
            }
            N::create(NodeShape::Object(merged))
        }
        (NodeShape::Array(a_items), NodeShape::Array(b_items)) => {
            let merged = a_items
                .into_iter()
                .zip(b_items)
                .map(|(x, y)| merge_nodes(x, y))
                .collect();
            N::create(NodeShape::Array(merged))
        }
        (NodeShape::Scalar, _) if a.is_null() => b,
        _ => a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_value::JsonValueNode;
    use serde_json::json;

    #[test]
    fn apply_one_filters_and_reshapes() {
        let engine: Engine<JsonValueNode> = Engine::new();
        let root = JsonValueNode::from(json!({"id": 1, "name": "ada", "secret": "x"}));
        let out = engine.apply_one(&root, "id,name@upper").unwrap();
        assert_eq!(out.0, json!({"id": 1, "name": "ADA"}));
    }

    #[test]
    fn apply_unions_across_multiple_filters() {
        let engine: Engine<JsonValueNode> = Engine::new();
        let root = JsonValueNode::from(json!({"id": 1, "name": "ada", "secret": "x"}));
        let out = engine.apply(&root, &["id", "name"]).unwrap();
        assert_eq!(out.0, json!({"id": 1, "name": "ada"}));
    }

    #[test]
    fn apply_with_no_filters_yields_empty_object() {
        let engine: Engine<JsonValueNode> = Engine::new();
        let root = JsonValueNode::from(json!({"id": 1}));
        let out = engine.apply(&root, &[]).unwrap();
        assert_eq!(out.0, json!({}));
    }

    #[test]
    fn builder_without_function_invoker_has_no_registry() {
        let engine: Engine<JsonValueNode> = Engine::builder().build();
        let root = JsonValueNode::from(json!({"name": "ada"}));
        // No function_invoker() call was made, so this fails with an
        // unknown-function error rather than silently passing "ada" through.
        let err = engine.apply_one(&root, "name@upper").unwrap_err();
        assert!(matches!(err, crate::error::FilterError::Function(_)));
    }

    #[test]
    fn builder_with_view_source_expands_bare_identifiers() {
        let views: Arc<dyn ViewSource> = Arc::new(|name: &str| -> Option<Vec<String>> {
            (name == "summary").then(|| vec!["id".to_string()])
        });
        let engine: Engine<JsonValueNode> = Engine::builder().view_source(views).build();
        let root = JsonValueNode::from(json!({"id": 1, "name": "ada"}));
        let out = engine.apply_one(&root, "summary").unwrap();
        assert_eq!(out.0, json!({"id": 1}));
    }
}
