use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use super::{Codec, short_type_name};
use crate::error::{BuildError, CodecError};
use crate::ops::{NodeKind, Operations};
use crate::result::CodecResult;

/// A fieldless enum with a fixed, declared set of constants.
///
/// Usually implemented through [`codec_enum!`](crate::codec_enum).
pub trait NamedEnum: Copy + Eq + Hash + Send + Sync + 'static {
    const VARIANTS: &'static [Self];

    /// The declared name of the constant, in any case.
    fn variant_name(self) -> &'static str;
}

/// `TriangleFan`, `TRIANGLE_FAN` and `triangle_fan` all become `triangle_fan`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if ch.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
        prev = Some(ch);
    }
    out
}

struct EnumTable<E> {
    by_name: HashMap<String, E>,
    names: HashMap<E, Arc<str>>,
}

impl<E: NamedEnum> EnumTable<E> {
    fn build() -> Result<Self, BuildError> {
        let mut by_name = HashMap::with_capacity(E::VARIANTS.len());
        let mut names = HashMap::with_capacity(E::VARIANTS.len());
        for &variant in E::VARIANTS {
            let name = normalize_name(variant.variant_name());
            if by_name.insert(name.clone(), variant).is_some() {
                return Err(BuildError::AmbiguousVariant {
                    type_name: short_type_name::<E>(),
                    name,
                });
            }
            names.insert(variant, Arc::from(name));
        }
        Ok(Self { by_name, names })
    }
}

// One table per enum type for the life of the process.
static TABLES: Lazy<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(Default::default);

/// String codec for a [`NamedEnum`].
pub struct EnumCodec<E> {
    table: Arc<EnumTable<E>>,
}

impl<E> Clone for EnumCodec<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<E: NamedEnum> std::fmt::Debug for EnumCodec<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumCodec")
            .field("type", &short_type_name::<E>())
            .field("variants", &self.table.by_name.len())
            .finish()
    }
}

impl<E: NamedEnum> EnumCodec<E> {
    /// Fails when two constants normalise to the same name.
    pub fn try_new() -> Result<Self, BuildError> {
        let mut tables = TABLES.lock().unwrap_or_else(PoisonError::into_inner);
        let key = TypeId::of::<E>();
        if let Some(existing) = tables.get(&key) {
            if let Ok(table) = Arc::clone(existing).downcast::<EnumTable<E>>() {
                return Ok(Self { table });
            }
        }
        let table = Arc::new(EnumTable::<E>::build()?);
        tables.insert(key, table.clone());
        Ok(Self { table })
    }

    /// Wire name of `value`.
    pub fn name_of(&self, value: E) -> Option<&str> {
        self.table.names.get(&value).map(|name| &**name)
    }

    pub fn value_of(&self, name: &str) -> Option<E> {
        self.table.by_name.get(&normalize_name(name)).copied()
    }
}

impl<E: NamedEnum> Codec for EnumCodec<E> {
    type Value = E;

    fn decode<O: Operations>(&self, ops: &O, input: &O::Node) -> CodecResult<E> {
        ops.to_string(input).flat_map(|name| match self.value_of(&name) {
            Some(value) => CodecResult::success(value),
            None => CodecResult::fail(CodecError::UnknownVariant {
                type_name: self.type_name(),
                value: name,
            }),
        })
    }

    fn encode_onto<O: Operations>(&self, ops: &O, value: &E, prefix: O::Node) -> CodecResult<O::Node> {
        let found = ops.kind(&prefix);
        if found != NodeKind::Blank {
            return CodecResult::fail(CodecError::UnsupportedPrefix {
                type_name: self.type_name(),
                found,
            });
        }
        match self.name_of(*value) {
            Some(name) => CodecResult::success(ops.from_string(name)),
            None => {
                let declared = value.variant_name();
                CodecResult::error(move || format!("`{declared}` is not a declared constant"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ops::JsonOps;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Side {
        Left,
        Right,
    }

    impl NamedEnum for Side {
        const VARIANTS: &'static [Self] = &[Side::Left, Side::Right];

        fn variant_name(self) -> &'static str {
            match self {
                Side::Left => "LEFT",
                Side::Right => "RIGHT",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Clash {
        TriangleFan,
        TriangleFanUpper,
    }

    impl NamedEnum for Clash {
        const VARIANTS: &'static [Self] = &[Clash::TriangleFan, Clash::TriangleFanUpper];

        fn variant_name(self) -> &'static str {
            match self {
                Clash::TriangleFan => "TriangleFan",
                Clash::TriangleFanUpper => "TRIANGLE_FAN",
            }
        }
    }

    #[test]
    fn normalises_every_casing_alike() {
        assert_eq!(normalize_name("TRIANGLE_FAN"), "triangle_fan");
        assert_eq!(normalize_name("TriangleFan"), "triangle_fan");
        assert_eq!(normalize_name("triangle_fan"), "triangle_fan");
        assert_eq!(normalize_name("Mip2Level"), "mip2_level");
    }

    #[test]
    fn round_trips_a_constant() {
        let codec = EnumCodec::<Side>::try_new().unwrap();
        let node = codec.encode(&JsonOps, &Side::Right).into_result().unwrap();
        assert_eq!(node, json!("right"));
        assert_eq!(codec.decode(&JsonOps, &node).into_result(), Some(Side::Right));
        assert_eq!(codec.decode(&JsonOps, &json!("RIGHT")).into_result(), Some(Side::Right));
    }

    #[test]
    fn unknown_names_are_named_in_the_error() {
        let codec = EnumCodec::<Side>::try_new().unwrap();
        let result = codec.decode(&JsonOps, &json!("UP"));
        assert!(!result.has_value());
        assert_eq!(result.message().unwrap().text(), "`UP` is not a valid Side");
    }

    #[test]
    fn tables_are_shared_per_type() {
        let a = EnumCodec::<Side>::try_new().unwrap();
        let b = EnumCodec::<Side>::try_new().unwrap();
        assert!(Arc::ptr_eq(&a.table, &b.table));
    }

    #[test]
    fn colliding_names_are_rejected() {
        let err = EnumCodec::<Clash>::try_new().unwrap_err();
        assert_eq!(
            err,
            BuildError::AmbiguousVariant {
                type_name: "Clash",
                name: "triangle_fan".to_owned(),
            }
        );
    }
}
