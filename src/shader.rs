//! Shader metadata schema.
//!
//! A shader metadata document maps each stage to its description:
//!
//! ```json
//! {
//!   "vertex": {
//!     "attributes": { "pos": { "type": "POSITION" } },
//!     "files": { "vertex": "ns:shader/basic" }
//!   }
//! }
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use crate::cache::{self, CodecCache, Derive};
use crate::codec::{OptionalField, RecordCodec, RecordCodecBuilder, RequiredField};
use crate::error::BuildError;
use crate::identifier::Identifier;
use crate::{codec_enum, record};

codec_enum! {
    pub enum AttributeType {
        Position,
        Color,
    }
}

codec_enum! {
    /// Pipeline stage a shader file belongs to.
    pub enum ShaderType {
        Fragment,
        Vertex,
    }
}

impl ShaderType {
    /// File extension of the stage's source file.
    pub fn extension(self) -> &'static str {
        match self {
            ShaderType::Fragment => "frag",
            ShaderType::Vertex => "vert",
        }
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Attribute {
        #[required = "type"]
        pub kind: AttributeType,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderMeta {
    /// Absent in the document means empty.
    pub attributes: IndexMap<String, Attribute>,
    pub files: IndexMap<String, Identifier>,
}

/// The whole document: one [`ShaderMeta`] per stage.
pub type ShaderMetaMap = IndexMap<ShaderType, ShaderMeta>;

type ShaderMetaFields = (
    OptionalField<ShaderMeta, Arc<<IndexMap<String, Attribute> as Derive>::Codec>>,
    RequiredField<ShaderMeta, Arc<<IndexMap<String, Identifier> as Derive>::Codec>>,
);

impl Derive for ShaderMeta {
    type Codec = RecordCodec<ShaderMeta, ShaderMetaFields>;

    fn derive(cache: &CodecCache) -> Result<Self::Codec, BuildError> {
        RecordCodecBuilder::<ShaderMeta>::new()
            .optional("attributes", cache.find::<IndexMap<String, Attribute>>()?, |meta| {
                (!meta.attributes.is_empty()).then_some(&meta.attributes)
            })
            .required("files", cache.find::<IndexMap<String, Identifier>>()?, |meta| &meta.files)
            .build(|(attributes, files)| {
                Ok(ShaderMeta {
                    attributes: attributes.unwrap_or_default(),
                    files,
                })
            })
    }
}

impl ShaderMeta {
    pub fn codec() -> Result<Arc<<Self as Derive>::Codec>, BuildError> {
        cache::find::<Self>()
    }

    /// Codec for a full [`ShaderMetaMap`] document.
    pub fn map_codec() -> Result<Arc<<ShaderMetaMap as Derive>::Codec>, BuildError> {
        cache::find::<ShaderMetaMap>()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::codec::Codec;
    use crate::ops::JsonOps;

    #[test]
    fn stage_extensions() {
        assert_eq!(ShaderType::Fragment.extension(), "frag");
        assert_eq!(ShaderType::Vertex.extension(), "vert");
    }

    #[test]
    fn document_is_keyed_by_stage() {
        let codec = ShaderMeta::map_codec().unwrap();
        let doc = codec
            .decode(
                &JsonOps,
                &json!({
                    "vertex": {"files": {"vertex": "ns:shader/basic"}},
                    "fragment": {"attributes": {"tint": {"type": "color"}}, "files": {}}
                }),
            )
            .into_result()
            .unwrap();
        assert_eq!(doc.keys().copied().collect::<Vec<_>>(), vec![ShaderType::Vertex, ShaderType::Fragment]);
        assert!(doc[&ShaderType::Vertex].attributes.is_empty());
        assert_eq!(
            doc[&ShaderType::Fragment].attributes["tint"],
            Attribute { kind: AttributeType::Color }
        );
    }

    #[test]
    fn empty_attributes_are_not_written() {
        let codec = ShaderMeta::codec().unwrap();
        let meta = ShaderMeta {
            attributes: IndexMap::new(),
            files: [("vertex".to_owned(), "ns:file".parse().unwrap())].into_iter().collect(),
        };
        let node = codec.encode(&JsonOps, &meta).into_result();
        assert_eq!(node, Some(json!({"files": {"vertex": "ns:file"}})));
    }
}
