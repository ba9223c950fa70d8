//! Declarative derivation: [`codec_enum!`](crate::codec_enum) and [`record!`](crate::record).
//!
//! Both macros declare the type and implement [`Derive`](crate::cache::Derive)
//! for it, so the codec cache can build the codec on demand.
//!
//! ```
//! use tree_codec::{codec_enum, record};
//!
//! codec_enum! {
//!     pub enum Facing { North, South }
//! }
//!
//! record! {
//!     #[derive(Debug)]
//!     pub struct Sign {
//!         #[required] pub facing: Facing,
//!         #[required = "text"] pub lines: Vec<String>,
//!         #[optional] pub glowing: Option<bool>,
//!     }
//! }
//!
//! let codec = tree_codec::find::<Sign>().unwrap();
//! ```
//!
//! Every record field carries exactly one marker, `#[required]` or
//! `#[optional]`, written before any other attribute or doc comment. An
//! optional field is declared as `Option<T>`. A field with no marker, or a
//! marker that is not one of those two, is a compile error.

/// Unwraps `Option<T>` to `T` for optional record fields.
#[doc(hidden)]
pub trait OptionalValue {
    type Inner;
}

impl<T> OptionalValue for Option<T> {
    type Inner = T;
}

/// Declares a fieldless enum whose codec maps each constant to its
/// `snake_case` name. Derives `Debug, Clone, Copy, PartialEq, Eq, Hash`.
#[macro_export]
macro_rules! codec_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
        }

        impl $crate::codec::NamedEnum for $name {
            const VARIANTS: &'static [Self] = &[$($name::$variant),*];

            fn variant_name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)*
                }
            }
        }

        impl $crate::cache::Derive for $name {
            type Codec = $crate::codec::EnumCodec<$name>;

            fn derive(
                _: &$crate::cache::CodecCache,
            ) -> ::std::result::Result<Self::Codec, $crate::error::BuildError> {
                $crate::codec::EnumCodec::try_new()
            }
        }
    };
}

/// Declares a struct whose codec is a record of its marked fields.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                #[$marker:ident $(= $key:literal)?]
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::codec::Record for $name {
            type Fields = ($($crate::__record_field_type!($marker, $name, $fty),)*);
        }

        impl $crate::cache::Derive for $name {
            type Codec = $crate::codec::DerivedRecordCodec<$name>;

            fn derive(
                cache: &$crate::cache::CodecCache,
            ) -> ::std::result::Result<Self::Codec, $crate::error::BuildError> {
                let builder = $crate::codec::RecordCodecBuilder::<$name>::new();
                $(
                    let builder = $crate::__record_field!(
                        $marker,
                        builder,
                        cache,
                        $field,
                        $fty,
                        $crate::__record_key!($field $(, $key)?)
                    );
                )*
                builder
                    .build(|($($field,)*)| Ok($name { $($field),* }))
                    .map($crate::codec::DerivedRecordCodec::new)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field_type {
    (required, $owner:ty, $fty:ty) => {
        $crate::codec::RequiredField<
            $owner,
            ::std::sync::Arc<<$fty as $crate::cache::Derive>::Codec>,
        >
    };
    (optional, $owner:ty, $fty:ty) => {
        $crate::codec::OptionalField<
            $owner,
            ::std::sync::Arc<
                <<$fty as $crate::macros::OptionalValue>::Inner as $crate::cache::Derive>::Codec,
            >,
        >
    };
    ($other:ident, $owner:ty, $fty:ty) => {
        compile_error!(concat!(
            "unknown field marker `",
            stringify!($other),
            "`, expected `required` or `optional`"
        ))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field {
    (required, $builder:ident, $cache:ident, $field:ident, $fty:ty, $key:expr) => {
        $builder.required($key, $cache.find::<$fty>()?, |record| &record.$field)
    };
    (optional, $builder:ident, $cache:ident, $field:ident, $fty:ty, $key:expr) => {
        $builder.optional(
            $key,
            $cache.find::<<$fty as $crate::macros::OptionalValue>::Inner>()?,
            |record| record.$field.as_ref(),
        )
    };
    ($other:ident, $($rest:tt)*) => {
        compile_error!(concat!(
            "unknown field marker `",
            stringify!($other),
            "`, expected `required` or `optional`"
        ))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $key:literal) => {
        $key
    };
}
