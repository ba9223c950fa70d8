//! Codecs for fixed-shape records built from named field descriptors.
//!
//! ```
//! use tree_codec::codec::{Codec, RecordCodecBuilder, I32, STRING};
//! use tree_codec::ops::JsonOps;
//!
//! struct Point { x: i32, y: i32, label: Option<String> }
//!
//! let codec = RecordCodecBuilder::<Point>::new()
//!     .required("x", I32, |p| &p.x)
//!     .required("y", I32, |p| &p.y)
//!     .optional("label", STRING, |p| p.label.as_ref())
//!     .build(|(x, y, label)| Ok(Point { x, y, label }))
//!     .unwrap();
//!
//! let point = codec.decode(&JsonOps, &serde_json::json!({"x": 1, "y": 2})).into_result().unwrap();
//! assert_eq!((point.x, point.y, point.label), (1, 2, None));
//! ```
use std::marker::PhantomData;

use super::{Codec, short_type_name};
use crate::error::{BuildError, CodecError};
use crate::ops::{NodeKind, Operations};
use crate::result::{CodecResult, Message, absorb, collect_outcome};

type Getter<T, V> = Box<dyn Fn(&T) -> &V + Send + Sync>;
type OptionalGetter<T, V> = Box<dyn Fn(&T) -> Option<&V> + Send + Sync>;
type Factory<T, A> = Box<dyn Fn(A) -> anyhow::Result<T> + Send + Sync>;

/// One named component of a record.
pub trait Field<T>: Send + Sync {
    type Value;

    fn name(&self) -> &'static str;

    /// `node` is `None` when the key is absent from the map.
    fn decode_field<O: Operations>(&self, ops: &O, node: Option<&O::Node>) -> CodecResult<Self::Value>;

    /// `None` when there is nothing to write.
    fn encode_field<O: Operations>(&self, ops: &O, record: &T) -> Option<CodecResult<O::Node>>;
}

pub struct RequiredField<T, C: Codec> {
    name: &'static str,
    codec: C,
    getter: Getter<T, C::Value>,
}

impl<T, C: Codec> Field<T> for RequiredField<T, C> {
    type Value = C::Value;

    fn name(&self) -> &'static str {
        self.name
    }

    fn decode_field<O: Operations>(&self, ops: &O, node: Option<&O::Node>) -> CodecResult<C::Value> {
        let name = self.name;
        match node {
            None => CodecResult::fail(CodecError::MissingRequiredField(name.to_owned())),
            Some(node) => self.codec.decode(ops, node).context(move || name.to_owned()),
        }
    }

    fn encode_field<O: Operations>(&self, ops: &O, record: &T) -> Option<CodecResult<O::Node>> {
        let name = self.name;
        let value = (self.getter)(record);
        Some(self.codec.encode(ops, value).context(move || name.to_owned()))
    }
}

/// A field that may be absent; a blank node counts as absent.
pub struct OptionalField<T, C: Codec> {
    name: &'static str,
    codec: C,
    getter: OptionalGetter<T, C::Value>,
}

impl<T, C: Codec> Field<T> for OptionalField<T, C> {
    type Value = Option<C::Value>;

    fn name(&self) -> &'static str {
        self.name
    }

    fn decode_field<O: Operations>(
        &self,
        ops: &O,
        node: Option<&O::Node>,
    ) -> CodecResult<Option<C::Value>> {
        let name = self.name;
        match node {
            Some(node) if ops.kind(node) != NodeKind::Blank => self
                .codec
                .decode(ops, node)
                .map(Some)
                .context(move || name.to_owned()),
            _ => CodecResult::success(None),
        }
    }

    fn encode_field<O: Operations>(&self, ops: &O, record: &T) -> Option<CodecResult<O::Node>> {
        let name = self.name;
        (self.getter)(record).map(|value| self.codec.encode(ops, value).context(move || name.to_owned()))
    }
}

fn lookup<'e, O: Operations>(
    ops: &O,
    entries: &'e [(O::Node, O::Node)],
    name: &str,
) -> Option<&'e O::Node> {
    let key = ops.from_string(name);
    entries.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| v)
}

/// An ordered set of fields, stored as a flat tuple.
pub trait FieldSet<T>: Send + Sync {
    /// Decoded values, one per field in declaration order.
    type Values;

    fn names(&self) -> Vec<&'static str>;

    /// `None` if any field produced no value at all.
    fn decode_fields<O: Operations>(
        &self,
        ops: &O,
        entries: &[(O::Node, O::Node)],
        errors: &mut Vec<Message>,
    ) -> Option<Self::Values>;

    fn encode_fields<O: Operations>(
        &self,
        ops: &O,
        record: &T,
        out: &mut Vec<(O::Node, O::Node)>,
        errors: &mut Vec<Message>,
    );
}

/// Type-level push onto the end of a tuple.
pub trait Append<Next> {
    type Output;

    fn append(self, next: Next) -> Self::Output;
}

macro_rules! impl_field_set {
    ($($F:ident $f:ident),*) => {
        impl<T, $($F: Field<T>),*> FieldSet<T> for ($($F,)*) {
            type Values = ($($F::Value,)*);

            fn names(&self) -> Vec<&'static str> {
                let ($($f,)*) = self;
                vec![$($f.name()),*]
            }

            #[allow(unused_variables)]
            fn decode_fields<O: Operations>(
                &self,
                ops: &O,
                entries: &[(O::Node, O::Node)],
                errors: &mut Vec<Message>,
            ) -> Option<Self::Values> {
                let ($($f,)*) = self;
                $(
                    let $f = absorb($f.decode_field(ops, lookup(ops, entries, $f.name())), errors);
                )*
                Some(($($f?,)*))
            }

            #[allow(unused_variables)]
            fn encode_fields<O: Operations>(
                &self,
                ops: &O,
                record: &T,
                out: &mut Vec<(O::Node, O::Node)>,
                errors: &mut Vec<Message>,
            ) {
                let ($($f,)*) = self;
                $(
                    if let Some(node) = $f.encode_field(ops, record).and_then(|r| absorb(r, errors)) {
                        out.push((ops.from_string($f.name()), node));
                    }
                )*
            }
        }

        impl<$($F,)* Next> Append<Next> for ($($F,)*) {
            type Output = ($($F,)* Next,);

            fn append(self, next: Next) -> Self::Output {
                let ($($f,)*) = self;
                ($($f,)* next,)
            }
        }
    };
}

macro_rules! field_sets {
    () => {
        impl_field_set!();
    };
    ($F:ident $f:ident $(, $rest:ident $r:ident)*) => {
        impl_field_set!($F $f $(, $rest $r)*);
        field_sets!($($rest $r),*);
    };
}

field_sets!(
    F0 f0, F1 f1, F2 f2, F3 f3, F4 f4, F5 f5,
    F6 f6, F7 f7, F8 f8, F9 f9, F10 f10, F11 f11
);

/// Collects field descriptors for a record `T`; finish with [`build`](Self::build).
pub struct RecordCodecBuilder<T, F = ()> {
    fields: F,
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordCodecBuilder<T> {
    pub fn new() -> Self {
        Self {
            fields: (),
            _record: PhantomData,
        }
    }
}

impl<T> Default for RecordCodecBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> RecordCodecBuilder<T, F> {
    pub fn required<C, G>(
        self,
        name: &'static str,
        codec: C,
        getter: G,
    ) -> RecordCodecBuilder<T, F::Output>
    where
        C: Codec,
        G: Fn(&T) -> &C::Value + Send + Sync + 'static,
        F: Append<RequiredField<T, C>>,
    {
        let field = RequiredField {
            name,
            codec,
            getter: Box::new(getter),
        };
        RecordCodecBuilder {
            fields: self.fields.append(field),
            _record: PhantomData,
        }
    }

    pub fn optional<C, G>(
        self,
        name: &'static str,
        codec: C,
        getter: G,
    ) -> RecordCodecBuilder<T, F::Output>
    where
        C: Codec,
        G: Fn(&T) -> Option<&C::Value> + Send + Sync + 'static,
        F: Append<OptionalField<T, C>>,
    {
        let field = OptionalField {
            name,
            codec,
            getter: Box::new(getter),
        };
        RecordCodecBuilder {
            fields: self.fields.append(field),
            _record: PhantomData,
        }
    }

    /// Binds the constructor. It receives the decoded fields as a tuple in
    /// declaration order, optional ones as `Option`.
    pub fn build<G>(self, factory: G) -> Result<RecordCodec<T, F>, BuildError>
    where
        F: FieldSet<T>,
        G: Fn(F::Values) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let type_name = short_type_name::<T>();
        let names = self.fields.names();
        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                return Err(BuildError::DuplicateField {
                    type_name,
                    field: *name,
                });
            }
        }
        Ok(RecordCodec {
            fields: self.fields,
            factory: Box::new(factory),
            type_name,
        })
    }
}

pub struct RecordCodec<T, F: FieldSet<T>> {
    fields: F,
    factory: Factory<T, F::Values>,
    type_name: &'static str,
}

impl<T, F: FieldSet<T>> RecordCodec<T, F> {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.names()
    }
}

impl<T, F: FieldSet<T>> std::fmt::Debug for RecordCodec<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCodec")
            .field("type", &self.type_name)
            .field("fields", &self.fields.names())
            .finish()
    }
}

impl<T, F: FieldSet<T>> Codec for RecordCodec<T, F> {
    type Value = T;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<T> {
        ops.to_map(input).flat_map(|entries| {
            let mut errors = Vec::new();
            let Some(values) = self.fields.decode_fields(ops, &entries, &mut errors) else {
                return CodecResult::from_parts(None, Message::join(errors));
            };
            match (self.factory)(values) {
                Ok(record) => collect_outcome(record, errors),
                Err(err) => {
                    errors.push(Message::from_error(CodecError::ConstructionFailed {
                        type_name: self.type_name,
                        reason: format!("{err:#}"),
                    }));
                    CodecResult::from_parts(None, Message::join(errors))
                }
            }
        })
    }

    fn encode_onto<O: Operations>(&self, ops: &O, value: &T, prefix: O::Node) -> CodecResult<O::Node> {
        let mut entries = match ops.kind(&prefix) {
            NodeKind::Blank => Vec::new(),
            NodeKind::Map => ops.to_map(&prefix).into_result().unwrap_or_default(),
            found => {
                return CodecResult::fail(CodecError::UnsupportedPrefix {
                    type_name: self.type_name,
                    found,
                });
            }
        };
        let mut errors = Vec::new();
        self.fields.encode_fields(ops, value, &mut entries, &mut errors);
        collect_outcome(ops.from_map(entries), errors)
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A record whose field set is fixed at compile time, as declared by
/// [`record!`](crate::record).
pub trait Record: Sized {
    type Fields: FieldSet<Self>;
}

/// Codec of a declared [`Record`].
///
/// Names the codec type of a record, so a record that reaches itself through
/// its fields still has a finite codec type. Such a record is then rejected
/// when it is derived, not when it is compiled.
pub struct DerivedRecordCodec<T: Record>(RecordCodec<T, T::Fields>);

impl<T: Record> DerivedRecordCodec<T> {
    pub fn new(codec: RecordCodec<T, T::Fields>) -> Self {
        Self(codec)
    }
}

impl<T: Record> std::ops::Deref for DerivedRecordCodec<T> {
    type Target = RecordCodec<T, T::Fields>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Record> std::fmt::Debug for DerivedRecordCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Record> Codec for DerivedRecordCodec<T> {
    type Value = T;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<T> {
        self.0.decode(ops, input)
    }

    fn encode_onto<O: Operations>(&self, ops: &O, value: &T, prefix: O::Node) -> CodecResult<O::Node> {
        self.0.encode_onto(ops, value, prefix)
    }

    fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}
