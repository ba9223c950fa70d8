//! Bidirectional codecs between domain values and algebra trees.
//!
//! A [`Codec`] is generic over the algebra at each call, not at construction,
//! so one codec instance serves JSON, plain object trees, or any other
//! [`Operations`] implementation.
pub mod primitive;
pub mod list;
pub mod map;
pub mod enumeration;
pub mod record;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::ops::Operations;
use crate::result::CodecResult;

pub use enumeration::{EnumCodec, NamedEnum, normalize_name};
pub use list::ListCodec;
pub use map::MapCodec;
pub use primitive::{
    BOOL, F32, F64, I8, I16, I32, I64, Primitive, PrimitiveCodec, STRING, U8, U16, U32, U64,
};
pub use record::{
    DerivedRecordCodec, Field, FieldSet, OptionalField, Record, RecordCodec, RecordCodecBuilder,
    RequiredField,
};

pub trait Codec: Send + Sync {
    type Value;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<Self::Value>;

    /// Encodes `value`, merging into `prefix` where the codec supports it.
    ///
    /// Scalars only accept a blank prefix; lists append, maps and records merge.
    fn encode_onto<O: Operations>(
        &self,
        ops: &O,
        value: &Self::Value,
        prefix: O::Node,
    ) -> CodecResult<O::Node>;

    fn encode<O: Operations>(&self, ops: &O, value: &Self::Value) -> CodecResult<O::Node> {
        self.encode_onto(ops, value, ops.blank())
    }

    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str {
        short_type_name::<Self::Value>()
    }

    fn list(self) -> ListCodec<Self>
    where
        Self: Sized,
    {
        ListCodec::new(self)
    }

    /// A map codec keyed by this codec.
    fn map_of<V: Codec>(self, values: V) -> MapCodec<Self, V>
    where
        Self: Sized,
        Self::Value: Hash + Eq + Debug,
    {
        MapCodec::new(self, values)
    }
}

impl<C: Codec> Codec for Arc<C> {
    type Value = C::Value;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<C::Value> {
        (**self).decode(ops, input)
    }

    fn encode_onto<O: Operations>(
        &self,
        ops: &O,
        value: &C::Value,
        prefix: O::Node,
    ) -> CodecResult<O::Node> {
        (**self).encode_onto(ops, value, prefix)
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

impl<C: Codec> Codec for &C {
    type Value = C::Value;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<C::Value> {
        (**self).decode(ops, input)
    }

    fn encode_onto<O: Operations>(
        &self,
        ops: &O,
        value: &C::Value,
        prefix: O::Node,
    ) -> CodecResult<O::Node> {
        (**self).encode_onto(ops, value, prefix)
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

/// `Attribute` rather than `tree_codec::shader::Attribute`; generic types keep their full path.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}
