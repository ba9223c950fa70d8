use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;

use super::Codec;
use crate::error::CodecError;
use crate::ops::{NodeKind, Operations};
use crate::result::{CodecResult, absorb, collect_outcome};

/// Codec for `IndexMap<K, V>`.
///
/// Entries keep document order. Keys that collide after decoding overwrite
/// the earlier entry; that is not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapCodec<K, V> {
    keys: K,
    values: V,
}

impl<K, V> MapCodec<K, V> {
    pub const fn new(keys: K, values: V) -> Self {
        Self { keys, values }
    }
}

/// Lazily rendered `key "pos"` label for an entry message.
fn entry_label<O: Operations>(ops: &O, key: &O::Node) -> impl FnOnce() -> String + Send + 'static {
    let text = ops.to_string(key).into_result();
    let node = key.clone();
    move || match text {
        Some(text) => format!("key {text:?}"),
        None => format!("key {node:?}"),
    }
}

impl<K, V> Codec for MapCodec<K, V>
where
    K: Codec,
    V: Codec,
    K::Value: Hash + Eq + Debug,
{
    type Value = IndexMap<K::Value, V::Value>;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<Self::Value> {
        ops.to_entry_stream(input).flat_map(|entries| {
            let mut out = IndexMap::new();
            let mut errors = Vec::new();
            for (key_node, value_node) in entries {
                let key = match self.keys.decode(ops, &key_node) {
                    CodecResult::Success(key) => Some(key),
                    failed => absorb(failed.context(entry_label(ops, &key_node)), &mut errors),
                };
                let value = match self.values.decode(ops, &value_node) {
                    CodecResult::Success(value) => Some(value),
                    failed => absorb(failed.context(entry_label(ops, &key_node)), &mut errors),
                };
                if let (Some(key), Some(value)) = (key, value) {
                    out.insert(key, value);
                }
            }
            collect_outcome(out, errors)
        })
    }

    fn encode_onto<O: Operations>(
        &self,
        ops: &O,
        value: &Self::Value,
        prefix: O::Node,
    ) -> CodecResult<O::Node> {
        let mut entries = match ops.kind(&prefix) {
            NodeKind::Blank => Vec::with_capacity(value.len()),
            NodeKind::Map => ops.to_map(&prefix).into_result().unwrap_or_default(),
            found => {
                return CodecResult::fail(CodecError::UnsupportedPrefix {
                    type_name: self.type_name(),
                    found,
                });
            }
        };
        let mut errors = Vec::new();
        for (key, value) in value {
            let key = match self.keys.encode(ops, key) {
                CodecResult::Success(node) => Some(node),
                failed => {
                    let label = format!("key {key:?}");
                    absorb(failed.context(move || label), &mut errors)
                }
            };
            let Some(key) = key else {
                continue;
            };
            let encoded = match self.values.encode(ops, value) {
                CodecResult::Success(node) => Some(node),
                failed => absorb(failed.context(entry_label(ops, &key)), &mut errors),
            };
            if let Some(node) = encoded {
                entries.push((key, node));
            }
        }
        collect_outcome(ops.from_map(entries), errors)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::codec::{I32, STRING};
    use crate::ops::{JsonOps, ObjectNode, ObjectOps};

    #[test]
    fn decodes_in_document_order() {
        let codec = STRING.map_of(I32);
        let map = codec
            .decode(&JsonOps, &json!({"b": 2, "a": 1}))
            .into_result()
            .unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn bad_values_are_located_by_key() {
        let codec = STRING.map_of(I32);
        let result = codec.decode(&JsonOps, &json!({"a": 1, "b": "x"}));
        let map = result.value().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], 1);
        assert_eq!(
            result.message().unwrap().text(),
            "key \"b\": expected number, found string"
        );
    }

    #[test]
    fn colliding_keys_keep_the_last_value() {
        let codec = I32.map_of(STRING);
        let node = ObjectNode::Map(vec![
            (ObjectNode::Int(1), "first".into()),
            (ObjectNode::Float(1.0.into()), "second".into()),
        ]);
        let map = codec.decode(&ObjectOps, &node).into_result().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], "second");
    }

    /// Writes even keys only.
    struct EvenKeys;

    impl Codec for EvenKeys {
        type Value = i32;

        fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<i32> {
            I32.decode(ops, input)
        }

        fn encode_onto<O: Operations>(&self, ops: &O, value: &i32, prefix: O::Node) -> CodecResult<O::Node> {
            let value = *value;
            if value % 2 != 0 {
                return CodecResult::error(move || format!("{value} is odd"));
            }
            I32.encode_onto(ops, &value, prefix)
        }
    }

    #[test]
    fn keys_that_fail_to_encode_are_located() {
        let codec = EvenKeys.map_of(STRING);
        let value: IndexMap<i32, String> =
            [(1, "a".to_owned()), (2, "b".to_owned())].into_iter().collect();
        let result = codec.encode(&JsonOps, &value);
        assert_eq!(result.value(), Some(&json!({"2": "b"})));
        assert_eq!(result.message().unwrap().text(), "key 1: 1 is odd");
    }

    #[test]
    fn encode_merges_into_a_map_prefix() {
        let codec = STRING.map_of(I32);
        let value: IndexMap<String, i32> = [("b".to_owned(), 2)].into_iter().collect();
        let node = codec.encode_onto(&JsonOps, &value, json!({"a": 1})).into_result();
        assert_eq!(node, Some(json!({"a": 1, "b": 2})));
    }
}
