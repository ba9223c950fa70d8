use super::Codec;
use crate::error::CodecError;
use crate::ops::{NodeKind, Operations};
use crate::result::{CodecResult, absorb, collect_outcome};

/// Codec for `Vec<T>` over any element codec.
///
/// A bad element never sinks the whole list: it is dropped (or kept in its
/// degraded form), its message is recorded under `[index]`, and the rest of
/// the list still comes back as a partial value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec<C> {
    element: C,
}

impl<C> ListCodec<C> {
    pub const fn new(element: C) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &C {
        &self.element
    }
}

impl<C: Codec> Codec for ListCodec<C> {
    type Value = Vec<C::Value>;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<Self::Value> {
        ops.to_stream(input).flat_map(|items| {
            let mut values = Vec::new();
            let mut errors = Vec::new();
            for (index, item) in items.enumerate() {
                let decoded = self
                    .element
                    .decode(ops, &item)
                    .context(move || format!("[{index}]"));
                values.extend(absorb(decoded, &mut errors));
            }
            collect_outcome(values, errors)
        })
    }

    fn encode_onto<O: Operations>(
        &self,
        ops: &O,
        value: &Self::Value,
        prefix: O::Node,
    ) -> CodecResult<O::Node> {
        let mut items = match ops.kind(&prefix) {
            NodeKind::Blank => Vec::with_capacity(value.len()),
            NodeKind::List => ops.to_list(&prefix).into_result().unwrap_or_default(),
            found => {
                return CodecResult::fail(CodecError::UnsupportedPrefix {
                    type_name: self.type_name(),
                    found,
                });
            }
        };
        let mut errors = Vec::new();
        for (index, element) in value.iter().enumerate() {
            let encoded = self
                .element
                .encode(ops, element)
                .context(move || format!("[{index}]"));
            items.extend(absorb(encoded, &mut errors));
        }
        collect_outcome(ops.from_list(items), errors)
    }
}
