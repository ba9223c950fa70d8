//! The operations algebra: everything a codec knows about a concrete tree.
//!
//! An [`Operations`] value builds and inspects nodes of one tree type
//! (`serde_json::Value`, [`ObjectNode`], ...). Codecs are written once
//! against this trait and work with every implementation. Extractors never
//! panic on the wrong kind of node; they return a failed [`CodecResult`]
//! whose message names the expected and the actual kind.
pub mod number;
pub mod json;
pub mod object;

use std::fmt;

use crate::result::CodecResult;

pub use json::JsonOps;
pub use number::Number;
pub use object::{ObjectNode, ObjectOps};

/// Child nodes of a list, borrowed from the tree they came from.
pub type NodeStream<'a, N> = Box<dyn Iterator<Item = N> + 'a>;

/// Key/value pairs of a map, in document order.
pub type EntryStream<'a, N> = Box<dyn Iterator<Item = (N, N)> + 'a>;

/// Coarse classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Blank,
    Bool,
    Number,
    String,
    List,
    Map,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Blank => "blank",
            NodeKind::Bool => "bool",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::List => "list",
            NodeKind::Map => "map",
        })
    }
}

pub trait Operations {
    type Node: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    // ------------------------------ Constructors ------------------------------ //

    /// The canonical absent node (`null` for JSON).
    fn blank(&self) -> Self::Node;

    fn from_number(&self, value: Number) -> Self::Node;

    /// Trees without a native boolean store `0` / `1`.
    fn from_bool(&self, value: bool) -> Self::Node {
        self.from_number(Number::Int(i64::from(value)))
    }

    fn from_string(&self, value: &str) -> Self::Node;

    fn from_list(&self, items: Vec<Self::Node>) -> Self::Node;

    fn from_map(&self, entries: Vec<(Self::Node, Self::Node)>) -> Self::Node;

    fn empty_list(&self) -> Self::Node {
        self.from_list(Vec::new())
    }

    fn empty_map(&self) -> Self::Node {
        self.from_map(Vec::new())
    }

    // ------------------------------- Extractors ------------------------------- //

    fn kind(&self, node: &Self::Node) -> NodeKind;

    fn to_number(&self, node: &Self::Node) -> CodecResult<Number>;

    /// Accepts any number, non-zero meaning `true`.
    fn to_bool(&self, node: &Self::Node) -> CodecResult<bool> {
        match self.kind(node) {
            NodeKind::Number => self.to_number(node).map(|n| !n.is_zero()),
            found => CodecResult::mismatch(NodeKind::Bool, found),
        }
    }

    fn to_string(&self, node: &Self::Node) -> CodecResult<String>;

    fn to_stream<'a>(&self, node: &'a Self::Node) -> CodecResult<NodeStream<'a, Self::Node>>;

    fn to_entry_stream<'a>(&self, node: &'a Self::Node)
    -> CodecResult<EntryStream<'a, Self::Node>>;

    fn to_list(&self, node: &Self::Node) -> CodecResult<Vec<Self::Node>> {
        self.to_stream(node).map(|items| items.collect())
    }

    fn to_map(&self, node: &Self::Node) -> CodecResult<Vec<(Self::Node, Self::Node)>> {
        self.to_entry_stream(node).map(|entries| entries.collect())
    }

    /// Shape-mismatch failure for `node`.
    fn mismatch<T>(&self, expected: NodeKind, node: &Self::Node) -> CodecResult<T> {
        CodecResult::mismatch(expected, self.kind(node))
    }

    // ------------------------------- Conversion ------------------------------- //

    /// Re-expresses `node` in another algebra by structural deep copy.
    fn convert<O: Operations>(&self, other: &O, node: &Self::Node) -> O::Node {
        match self.kind(node) {
            NodeKind::Blank => other.blank(),
            NodeKind::Bool => self
                .to_bool(node)
                .into_result()
                .map_or_else(|| other.blank(), |b| other.from_bool(b)),
            NodeKind::Number => self
                .to_number(node)
                .into_result()
                .map_or_else(|| other.blank(), |n| other.from_number(n)),
            NodeKind::String => self
                .to_string(node)
                .into_result()
                .map_or_else(|| other.blank(), |s| other.from_string(&s)),
            NodeKind::List => self.convert_list(other, node),
            NodeKind::Map => self.convert_map(other, node),
        }
    }

    fn convert_list<O: Operations>(&self, other: &O, node: &Self::Node) -> O::Node {
        match self.to_stream(node) {
            CodecResult::Success(items) => {
                other.from_list(items.map(|item| self.convert(other, &item)).collect())
            }
            CodecResult::Partial(_) => other.empty_list(),
        }
    }

    fn convert_map<O: Operations>(&self, other: &O, node: &Self::Node) -> O::Node {
        match self.to_entry_stream(node) {
            CodecResult::Success(entries) => other.from_map(
                entries
                    .map(|(k, v)| (self.convert(other, &k), self.convert(other, &v)))
                    .collect(),
            ),
            CodecResult::Partial(_) => other.empty_map(),
        }
    }
}
