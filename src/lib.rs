//! Format-agnostic bidirectional codecs.
//!
//! Typed values go to and from any tree representation that implements
//! [`Operations`]. Decoding degrades gracefully: a malformed element or field
//! yields a [`CodecResult::Partial`] carrying what could be recovered plus a
//! message locating every problem, instead of discarding the whole document.
//!
//! ```
//! use tree_codec::{Codec, JsonOps, shader::ShaderMeta};
//!
//! let codec = ShaderMeta::codec().unwrap();
//! let doc = serde_json::json!({"attributes": {"pos": {"type": "POSITION"}}, "files": {"vertex": "ns:file"}});
//! let meta = codec.decode(&JsonOps, &doc).into_result().unwrap();
//! assert_eq!(meta.files["vertex"].to_string(), "ns:file");
//! ```
pub mod ops;
pub mod result;
pub mod error;
pub mod codec;
pub mod cache;
pub mod macros;
pub mod identifier;
pub mod shader;

pub use cache::{CodecCache, Derive, find};
pub use codec::Codec;
pub use error::{BuildError, CodecError};
pub use identifier::Identifier;
pub use ops::{JsonOps, NodeKind, Number, ObjectNode, ObjectOps, Operations};
pub use result::{CodecResult, Message, PartialResult};
