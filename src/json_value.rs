//! Reference [`JsonNode`] adapter over `serde_json::Value`.
//!
//! Bundled behind the `serde_json` feature (on by default) so the engine is
//! usable out of the box, but it is not privileged: a host with its own
//! document type implements [`JsonNode`] directly instead of round-tripping
//! through this one.

use serde_json::{Map, Number, Value};

use crate::ast::LiteralValue;
use crate::node::{JsonNode, NodeShape};

/// Thin newtype over `serde_json::Value` so the engine's generic `JsonNode`
/// impl doesn't collide with anyone else's.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValueNode(pub Value);

impl From<Value> for JsonValueNode {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<JsonValueNode> for Value {
    fn from(node: JsonValueNode) -> Self {
        node.0
    }
}

impl JsonNode for JsonValueNode {
    fn value(&self) -> NodeShape<Self> {
        match &self.0 {
            Value::Object(map) => {
                NodeShape::Object(map.iter().map(|(k, v)| (k.clone(), JsonValueNode(v.clone()))).collect())
            }
            Value::Array(items) => NodeShape::Array(items.iter().map(|v| JsonValueNode(v.clone())).collect()),
            _ => NodeShape::Scalar,
        }
    }

    fn transform(&self, s: String) -> Self {
        JsonValueNode(Value::String(s))
    }

    fn create(shape: NodeShape<Self>) -> Self {
        match shape {
            NodeShape::Object(entries) => {
                let map: Map<String, Value> = entries.into_iter().map(|(k, v)| (k, v.0)).collect();
                JsonValueNode(Value::Object(map))
            }
            NodeShape::Array(items) => JsonValueNode(Value::Array(items.into_iter().map(|v| v.0).collect())),
            NodeShape::Scalar => JsonValueNode(Value::Null),
        }
    }

    fn from_literal(value: &LiteralValue) -> Self {
        JsonValueNode(match value {
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Integer(n) => Value::Number(Number::from(*n)),
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Null => Value::Null,
        })
    }

    fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_round_trips_through_shape() {
        let node = JsonValueNode::from(json!({"a": 1, "b": "two"}));
        let NodeShape::Object(entries) = node.value() else { panic!("expected object") };
        assert_eq!(entries.len(), 2);
        let rebuilt = JsonValueNode::create(NodeShape::Object(entries));
        assert_eq!(rebuilt.0, node.0);
    }

    #[test]
    fn array_round_trips_through_shape() {
        let node = JsonValueNode::from(json!([1, 2, 3]));
        let NodeShape::Array(items) = node.value() else { panic!("expected array") };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn scalar_has_no_children() {
        let node = JsonValueNode::from(json!(42));
        assert!(matches!(node.value(), NodeShape::Scalar));
    }
}
