//! Error taxonomy.
//!
//! Two families:
//! - [`CodecError`] describes bad *data*. It never escapes as a panic; codecs
//!   render it lazily into the message of a [`CodecResult`](crate::CodecResult).
//! - [`BuildError`] describes a bad *codec definition*. It is returned while a
//!   codec is being built or derived, before any document is looked at.

use crate::ops::{NodeKind, Number};

/// Data-level failures reported through `CodecResult` messages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The node is not the kind the codec needs.
    #[error("expected {expected}, found {found}")]
    ShapeMismatch { expected: NodeKind, found: NodeKind },

    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    /// The record factory rejected the decoded arguments.
    #[error("failed to construct {type_name}: {reason}")]
    ConstructionFailed {
        type_name: &'static str,
        reason: String,
    },

    #[error("number {value} is out of range for {target}")]
    NumberOutOfRange { value: Number, target: &'static str },

    #[error("`{value}` is not a valid {type_name}")]
    UnknownVariant {
        type_name: &'static str,
        value: String,
    },

    #[error("{type_name} can not be encoded onto a {found} prefix")]
    UnsupportedPrefix {
        type_name: &'static str,
        found: NodeKind,
    },

    /// A failed result was forced with `get_or_fail`.
    #[error("{0}")]
    Rejected(String),
}

/// Codec-definition failures, raised while building or deriving a codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Deriving the codec for a type required a codec for the same type.
    #[error("cyclic codec definition for `{0}`")]
    CyclicDefinition(&'static str),

    #[error("duplicate field `{field}` in codec for {type_name}")]
    DuplicateField {
        type_name: &'static str,
        field: &'static str,
    },

    /// Two enum constants normalise to the same wire name.
    #[error("variants of {type_name} collide on the name `{name}`")]
    AmbiguousVariant {
        type_name: &'static str,
        name: String,
    },
}
