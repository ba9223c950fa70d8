use serde_json::{Map, Value};

use super::{EntryStream, NodeKind, NodeStream, Number, Operations};
use crate::result::CodecResult;

/// Algebra over `serde_json::Value`.
///
/// JSON objects only have string keys, so [`Operations::from_map`] renders
/// any other key node as its JSON text. Non-finite floats become `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOps;

fn key_text(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Operations for JsonOps {
    type Node = Value;

    fn blank(&self) -> Value {
        Value::Null
    }

    fn from_number(&self, value: Number) -> Value {
        match value {
            Number::Int(v) => Value::from(v),
            Number::UInt(v) => Value::from(v),
            Number::Float(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        }
    }

    fn from_bool(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn from_string(&self, value: &str) -> Value {
        Value::String(value.to_owned())
    }

    fn from_list(&self, items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn from_map(&self, entries: Vec<(Value, Value)>) -> Value {
        let mut object = Map::with_capacity(entries.len());
        for (key, value) in entries {
            object.insert(key_text(key), value);
        }
        Value::Object(object)
    }

    fn kind(&self, node: &Value) -> NodeKind {
        match node {
            Value::Null => NodeKind::Blank,
            Value::Bool(_) => NodeKind::Bool,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::List,
            Value::Object(_) => NodeKind::Map,
        }
    }

    fn to_number(&self, node: &Value) -> CodecResult<Number> {
        let Value::Number(n) = node else {
            return self.mismatch(NodeKind::Number, node);
        };
        if let Some(v) = n.as_i64() {
            CodecResult::success(Number::Int(v))
        } else if let Some(v) = n.as_u64() {
            CodecResult::success(Number::UInt(v))
        } else if let Some(v) = n.as_f64() {
            CodecResult::success(Number::Float(v))
        } else {
            let text = n.to_string();
            CodecResult::error(move || format!("unrepresentable number {text}"))
        }
    }

    fn to_bool(&self, node: &Value) -> CodecResult<bool> {
        match node {
            Value::Bool(b) => CodecResult::success(*b),
            Value::Number(_) => self.to_number(node).map(|n| !n.is_zero()),
            other => self.mismatch(NodeKind::Bool, other),
        }
    }

    fn to_string(&self, node: &Value) -> CodecResult<String> {
        match node {
            Value::String(s) => CodecResult::success(s.clone()),
            other => self.mismatch(NodeKind::String, other),
        }
    }

    fn to_stream<'a>(&self, node: &'a Value) -> CodecResult<NodeStream<'a, Value>> {
        match node {
            Value::Array(items) => CodecResult::success(Box::new(items.iter().cloned())),
            other => self.mismatch(NodeKind::List, other),
        }
    }

    fn to_entry_stream<'a>(&self, node: &'a Value) -> CodecResult<EntryStream<'a, Value>> {
        match node {
            Value::Object(object) => CodecResult::success(Box::new(
                object
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), v.clone())),
            )),
            other => self.mismatch(NodeKind::Map, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_keep_their_width() {
        let ops = JsonOps;
        assert_eq!(ops.to_number(&json!(-3)).into_result(), Some(Number::Int(-3)));
        assert_eq!(
            ops.to_number(&json!(u64::MAX)).into_result(),
            Some(Number::UInt(u64::MAX))
        );
        assert_eq!(ops.to_number(&json!(1.5)).into_result(), Some(Number::Float(1.5)));
        assert_eq!(ops.from_number(Number::Float(f64::NAN)), Value::Null);
    }

    #[test]
    fn wrong_kind_names_both_kinds() {
        let ops = JsonOps;
        let result = ops.to_string(&json!([1, 2]));
        assert_eq!(
            result.message().map(|m| m.text().to_owned()),
            Some("expected string, found list".to_owned())
        );
        let result = ops.to_map(&json!("x"));
        assert!(!result.has_value());
    }

    #[test]
    fn map_keys_are_rendered_as_text() {
        let ops = JsonOps;
        let node = ops.from_map(vec![
            (ops.from_string("a"), ops.from_number(Number::Int(1))),
            (ops.from_number(Number::Int(2)), ops.from_bool(true)),
        ]);
        assert_eq!(node, json!({"a": 1, "2": true}));
    }

    #[test]
    fn entries_come_back_in_document_order() {
        let ops = JsonOps;
        let node = json!({"z": 1, "a": 2, "m": 3});
        let keys: Vec<_> = ops
            .to_map(&node)
            .into_result()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![json!("z"), json!("a"), json!("m")]);
    }

    #[test]
    fn bool_accepts_numbers() {
        let ops = JsonOps;
        assert_eq!(ops.to_bool(&json!(true)).into_result(), Some(true));
        assert_eq!(ops.to_bool(&json!(0)).into_result(), Some(false));
        assert!(!ops.to_bool(&json!("yes")).has_value());
    }
}
