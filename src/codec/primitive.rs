use std::fmt;
use std::marker::PhantomData;

use super::Codec;
use crate::error::CodecError;
use crate::ops::{NodeKind, Number, Operations};
use crate::result::CodecResult;

/// A scalar that maps onto exactly one node kind.
pub trait Primitive: Sized + Send + Sync + 'static {
    const NAME: &'static str;

    fn into_node<O: Operations>(&self, ops: &O) -> O::Node;

    fn from_node<O: Operations>(ops: &O, node: &O::Node) -> CodecResult<Self>;
}

macro_rules! integer_primitive {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const NAME: &'static str = $name;

                fn into_node<O: Operations>(&self, ops: &O) -> O::Node {
                    ops.from_number(Number::from(*self))
                }

                fn from_node<O: Operations>(ops: &O, node: &O::Node) -> CodecResult<Self> {
                    ops.to_number(node).flat_map(|value| match value.to_integer::<$ty>() {
                        Some(v) => CodecResult::success(v),
                        None => CodecResult::fail(CodecError::NumberOutOfRange {
                            value,
                            target: $name,
                        }),
                    })
                }
            }
        )*
    };
}

integer_primitive! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
}

impl Primitive for f32 {
    const NAME: &'static str = "f32";

    fn into_node<O: Operations>(&self, ops: &O) -> O::Node {
        ops.from_number(Number::from(*self))
    }

    fn from_node<O: Operations>(ops: &O, node: &O::Node) -> CodecResult<Self> {
        ops.to_number(node).flat_map(|value| match value.to_f32() {
            Some(v) => CodecResult::success(v),
            None => CodecResult::fail(CodecError::NumberOutOfRange {
                value,
                target: Self::NAME,
            }),
        })
    }
}

impl Primitive for f64 {
    const NAME: &'static str = "f64";

    fn into_node<O: Operations>(&self, ops: &O) -> O::Node {
        ops.from_number(Number::from(*self))
    }

    fn from_node<O: Operations>(ops: &O, node: &O::Node) -> CodecResult<Self> {
        ops.to_number(node).map(Number::to_f64)
    }
}

impl Primitive for bool {
    const NAME: &'static str = "bool";

    fn into_node<O: Operations>(&self, ops: &O) -> O::Node {
        ops.from_bool(*self)
    }

    fn from_node<O: Operations>(ops: &O, node: &O::Node) -> CodecResult<Self> {
        ops.to_bool(node)
    }
}

impl Primitive for String {
    const NAME: &'static str = "string";

    fn into_node<O: Operations>(&self, ops: &O) -> O::Node {
        ops.from_string(self)
    }

    fn from_node<O: Operations>(ops: &O, node: &O::Node) -> CodecResult<Self> {
        ops.to_string(node)
    }
}

/// Codec for one [`Primitive`]. Never yields a partial value.
pub struct PrimitiveCodec<P>(PhantomData<fn() -> P>);

impl<P> PrimitiveCodec<P> {
    pub const fn new() -> Self {
        PrimitiveCodec(PhantomData)
    }
}

impl<P> Clone for PrimitiveCodec<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PrimitiveCodec<P> {}

impl<P> Default for PrimitiveCodec<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> fmt::Debug for PrimitiveCodec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimitiveCodec<{}>", P::NAME)
    }
}

impl<P: Primitive> Codec for PrimitiveCodec<P> {
    type Value = P;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<P> {
        P::from_node(ops, input)
    }

    fn encode_onto<O: Operations>(&self, ops: &O, value: &P, prefix: O::Node) -> CodecResult<O::Node> {
        match ops.kind(&prefix) {
            NodeKind::Blank => CodecResult::success(value.into_node(ops)),
            found => CodecResult::fail(CodecError::UnsupportedPrefix {
                type_name: P::NAME,
                found,
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        P::NAME
    }
}

pub const I8: PrimitiveCodec<i8> = PrimitiveCodec::new();
pub const I16: PrimitiveCodec<i16> = PrimitiveCodec::new();
pub const I32: PrimitiveCodec<i32> = PrimitiveCodec::new();
pub const I64: PrimitiveCodec<i64> = PrimitiveCodec::new();
pub const U8: PrimitiveCodec<u8> = PrimitiveCodec::new();
pub const U16: PrimitiveCodec<u16> = PrimitiveCodec::new();
pub const U32: PrimitiveCodec<u32> = PrimitiveCodec::new();
pub const U64: PrimitiveCodec<u64> = PrimitiveCodec::new();
pub const F32: PrimitiveCodec<f32> = PrimitiveCodec::new();
pub const F64: PrimitiveCodec<f64> = PrimitiveCodec::new();
pub const BOOL: PrimitiveCodec<bool> = PrimitiveCodec::new();
pub const STRING: PrimitiveCodec<String> = PrimitiveCodec::new();

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ops::{JsonOps, ObjectNode, ObjectOps};

    #[test]
    fn scalars_survive_both_algebras() {
        let node = I32.encode(&JsonOps, &-42).into_result().unwrap();
        assert_eq!(node, json!(-42));
        assert_eq!(I32.decode(&JsonOps, &node).into_result(), Some(-42));

        let node = STRING.encode(&ObjectOps, &"hi".to_owned()).into_result().unwrap();
        assert_eq!(node, ObjectNode::from("hi"));
        assert_eq!(STRING.decode(&ObjectOps, &node).into_result().as_deref(), Some("hi"));

        let node = F64.encode(&JsonOps, &0.25).into_result().unwrap();
        assert_eq!(F64.decode(&JsonOps, &node).into_result(), Some(0.25));
    }

    #[test]
    fn narrowing_out_of_range_fails_without_a_value() {
        let result = U8.decode(&JsonOps, &json!(300));
        assert!(!result.has_value());
        assert_eq!(
            result.message().unwrap().text(),
            "number 300 is out of range for u8"
        );
        assert!(!I32.decode(&JsonOps, &json!(1.5)).has_value());
    }

    #[test]
    fn wrong_kind_is_a_shape_mismatch() {
        let result = BOOL.decode(&JsonOps, &json!("true"));
        assert_eq!(result.message().unwrap().text(), "expected bool, found string");
    }

    #[test]
    fn prefix_must_be_blank() {
        let result = I64.encode_onto(&JsonOps, &1, json!({"a": 1}));
        assert_eq!(
            result.message().unwrap().text(),
            "i64 can not be encoded onto a map prefix"
        );
    }
}
