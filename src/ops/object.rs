use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use super::{EntryStream, NodeKind, NodeStream, Number, Operations};
use crate::result::CodecResult;

/// Plain in-memory tree, with no format attached.
///
/// Maps keep insertion order and may be keyed by any node; a repeated key
/// replaces the earlier value in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ObjectNode {
    #[default]
    Blank,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(OrderedFloat<f64>),
    String(String),
    List(Vec<ObjectNode>),
    Map(Vec<(ObjectNode, ObjectNode)>),
}

impl ObjectNode {
    /// Builds a map node, collapsing repeated keys.
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ObjectNode, ObjectNode)>,
    {
        let mut out = IndexMap::new();
        for (key, value) in entries {
            out.insert(key, value);
        }
        ObjectNode::Map(out.into_iter().collect())
    }

    /// Looks up a string key in a map node.
    pub fn get(&self, key: &str) -> Option<&ObjectNode> {
        match self {
            ObjectNode::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                ObjectNode::String(s) if s == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ObjectNode::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ObjectNode {
    fn from(value: &str) -> Self {
        ObjectNode::String(value.to_owned())
    }
}

impl From<String> for ObjectNode {
    fn from(value: String) -> Self {
        ObjectNode::String(value)
    }
}

impl From<bool> for ObjectNode {
    fn from(value: bool) -> Self {
        ObjectNode::Bool(value)
    }
}

impl From<i64> for ObjectNode {
    fn from(value: i64) -> Self {
        ObjectNode::Int(value)
    }
}

impl From<f64> for ObjectNode {
    fn from(value: f64) -> Self {
        ObjectNode::Float(OrderedFloat(value))
    }
}

impl From<Vec<ObjectNode>> for ObjectNode {
    fn from(value: Vec<ObjectNode>) -> Self {
        ObjectNode::List(value)
    }
}

/// Algebra over [`ObjectNode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectOps;

impl Operations for ObjectOps {
    type Node = ObjectNode;

    fn blank(&self) -> ObjectNode {
        ObjectNode::Blank
    }

    fn from_number(&self, value: Number) -> ObjectNode {
        match value {
            Number::Int(v) => ObjectNode::Int(v),
            Number::UInt(v) => ObjectNode::UInt(v),
            Number::Float(v) => ObjectNode::Float(OrderedFloat(v)),
        }
    }

    fn from_bool(&self, value: bool) -> ObjectNode {
        ObjectNode::Bool(value)
    }

    fn from_string(&self, value: &str) -> ObjectNode {
        ObjectNode::String(value.to_owned())
    }

    fn from_list(&self, items: Vec<ObjectNode>) -> ObjectNode {
        ObjectNode::List(items)
    }

    fn from_map(&self, entries: Vec<(ObjectNode, ObjectNode)>) -> ObjectNode {
        ObjectNode::map(entries)
    }

    fn kind(&self, node: &ObjectNode) -> NodeKind {
        match node {
            ObjectNode::Blank => NodeKind::Blank,
            ObjectNode::Bool(_) => NodeKind::Bool,
            ObjectNode::Int(_) | ObjectNode::UInt(_) | ObjectNode::Float(_) => NodeKind::Number,
            ObjectNode::String(_) => NodeKind::String,
            ObjectNode::List(_) => NodeKind::List,
            ObjectNode::Map(_) => NodeKind::Map,
        }
    }

    fn to_number(&self, node: &ObjectNode) -> CodecResult<Number> {
        match node {
            ObjectNode::Int(v) => CodecResult::success(Number::Int(*v)),
            ObjectNode::UInt(v) => CodecResult::success(Number::UInt(*v)),
            ObjectNode::Float(v) => CodecResult::success(Number::Float(v.into_inner())),
            other => self.mismatch(NodeKind::Number, other),
        }
    }

    fn to_bool(&self, node: &ObjectNode) -> CodecResult<bool> {
        match node {
            ObjectNode::Bool(b) => CodecResult::success(*b),
            ObjectNode::Int(_) | ObjectNode::UInt(_) | ObjectNode::Float(_) => {
                self.to_number(node).map(|n| !n.is_zero())
            }
            other => self.mismatch(NodeKind::Bool, other),
        }
    }

    fn to_string(&self, node: &ObjectNode) -> CodecResult<String> {
        match node {
            ObjectNode::String(s) => CodecResult::success(s.clone()),
            other => self.mismatch(NodeKind::String, other),
        }
    }

    fn to_stream<'a>(&self, node: &'a ObjectNode) -> CodecResult<NodeStream<'a, ObjectNode>> {
        match node {
            ObjectNode::List(items) => CodecResult::success(Box::new(items.iter().cloned())),
            other => self.mismatch(NodeKind::List, other),
        }
    }

    fn to_entry_stream<'a>(
        &self,
        node: &'a ObjectNode,
    ) -> CodecResult<EntryStream<'a, ObjectNode>> {
        match node {
            ObjectNode::Map(entries) => CodecResult::success(Box::new(entries.iter().cloned())),
            other => self.mismatch(NodeKind::Map, other),
        }
    }
}
