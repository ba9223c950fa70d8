//! Integration tests decoding whole documents through the public API.

use indexmap::IndexMap;
use serde_json::{Value, json};
use tree_codec::codec::{Codec, I32, STRING};
use tree_codec::shader::{Attribute, AttributeType, ShaderMeta, ShaderType};
use tree_codec::{CodecCache, CodecResult, Identifier, JsonOps, ObjectOps, Operations, codec_enum, record};

fn shader_document() -> Value {
    json!({"attributes": {"pos": {"type": "POSITION"}}, "files": {"vertex": "ns:file"}})
}

// =========================================================================
// Shader metadata
// =========================================================================

#[test]
fn test_shader_meta_decodes_attributes_and_files() {
    let codec = ShaderMeta::codec().unwrap();
    let meta = codec.decode(&JsonOps, &shader_document()).into_result().unwrap();

    let mut attributes = IndexMap::new();
    attributes.insert("pos".to_owned(), Attribute { kind: AttributeType::Position });
    assert_eq!(meta.attributes, attributes);
    assert_eq!(meta.files["vertex"], Identifier::new("ns", "file").unwrap());
}

#[test]
fn test_shader_meta_without_files_is_fatal() {
    let codec = ShaderMeta::codec().unwrap();
    let result = codec.decode(&JsonOps, &json!({"attributes": {"pos": {"type": "POSITION"}}}));
    assert!(!result.has_value());
    let message = result.message().unwrap().text().to_owned();
    assert!(message.contains("files"), "{message}");
    assert_eq!(message, "missing required field `files`");
}

#[test]
fn test_shader_meta_without_attributes_is_a_success() {
    let codec = ShaderMeta::codec().unwrap();
    let result = codec.decode(&JsonOps, &json!({"files": {"vertex": "ns:file"}}));
    assert!(result.is_success());
    assert!(result.into_result().unwrap().attributes.is_empty());
}

#[test]
fn test_bad_identifier_is_located() {
    let codec = ShaderMeta::codec().unwrap();
    let result = codec.decode(&JsonOps, &json!({"files": {"vertex": "ns:file", "fragment": "Bad"}}));
    let meta = result.value().unwrap();
    assert_eq!(meta.files.len(), 1);
    assert_eq!(
        result.message().unwrap().text(),
        "files: key \"fragment\": \"Bad\" is not a valid identifier"
    );
}

#[test]
fn test_shader_meta_round_trips_through_both_trees() {
    let codec = ShaderMeta::codec().unwrap();
    let meta = codec.decode(&JsonOps, &shader_document()).into_result().unwrap();

    let json_node = codec.encode(&JsonOps, &meta).into_result().unwrap();
    assert_eq!(
        json_node,
        json!({"attributes": {"pos": {"type": "position"}}, "files": {"vertex": "ns:file"}})
    );

    let object_node = codec.encode(&ObjectOps, &meta).into_result().unwrap();
    assert_eq!(codec.decode(&ObjectOps, &object_node).into_result(), Some(meta));
}

#[test]
fn test_stage_map_document() {
    let codec = ShaderMeta::map_codec().unwrap();
    let doc = codec
        .decode(&JsonOps, &json!({"vertex": shader_document(), "geometry": shader_document()}))
        .result_or_partial()
        .unwrap();
    assert_eq!(doc.keys().copied().collect::<Vec<_>>(), vec![ShaderType::Vertex]);
}

// =========================================================================
// Combinators
// =========================================================================

#[test]
fn test_list_with_one_bad_element_keeps_three() {
    let codec = I32.list();
    let result = codec.decode(&JsonOps, &json!([10, 20, "thirty", 40]));
    match result {
        CodecResult::Partial(partial) => {
            assert_eq!(partial.value(), Some(&vec![10, 20, 40]));
            assert!(partial.error().contains("[2]"));
        }
        CodecResult::Success(_) => panic!("a malformed element must not decode cleanly"),
    }
}

#[test]
fn test_result_or_partial_with_reports_the_message() {
    let mut seen = Vec::new();
    let values = I32
        .list()
        .decode(&JsonOps, &json!([1, null]))
        .result_or_partial_with(|message| seen.push(message.to_owned()));
    assert_eq!(values, Some(vec![1]));
    assert_eq!(seen, vec!["[1]: expected number, found blank".to_owned()]);
}

#[test]
fn test_string_keyed_maps_from_both_trees_agree() {
    let codec = STRING.map_of(I32);
    let json_node = json!({"a": 1, "b": 2});
    let object_node = JsonOps.convert(&ObjectOps, &json_node);
    assert_eq!(
        codec.decode(&JsonOps, &json_node).into_result(),
        codec.decode(&ObjectOps, &object_node).into_result()
    );
}

// =========================================================================
// Enums
// =========================================================================

codec_enum! {
    enum Turn {
        Left,
        Right,
    }
}

#[test]
fn test_enum_round_trip() {
    let codec = CodecCache::new().find::<Turn>().unwrap();
    let node = codec.encode(&JsonOps, &Turn::Right).into_result().unwrap();
    assert_eq!(codec.decode(&JsonOps, &node).into_result(), Some(Turn::Right));
}

#[test]
fn test_unknown_enum_name_is_named() {
    let codec = CodecCache::new().find::<Turn>().unwrap();
    let result = codec.decode(&JsonOps, &json!("BACKWARDS"));
    assert!(!result.has_value());
    assert!(result.message().unwrap().text().contains("BACKWARDS"));
}

// =========================================================================
// Declared records
// =========================================================================

record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Window {
        #[required] title: String,
        #[required] size: Vec<u32>,
        #[optional] turn: Option<Turn>,
    }
}

#[test]
fn test_declared_record_degrades_per_field() {
    let codec = CodecCache::new().find::<Window>().unwrap();
    let result = codec.decode(
        &JsonOps,
        &json!({"title": "main", "size": [640, -1, 480], "turn": "left"}),
    );
    assert_eq!(
        result.value(),
        Some(&Window {
            title: "main".into(),
            size: vec![640, 480],
            turn: Some(Turn::Left),
        })
    );
    assert_eq!(
        result.message().unwrap().text(),
        "size: [1]: number -1 is out of range for u32"
    );
}

#[test]
fn test_get_or_fail_rejects_degraded_records_unless_allowed() {
    let codec = CodecCache::new().find::<Window>().unwrap();
    let doc = json!({"title": "main", "size": [1, "x"]});
    assert!(codec.decode(&JsonOps, &doc).get_or_fail(false, |_| {}).is_err());
    let window = codec.decode(&JsonOps, &doc).get_or_fail(true, |_| {}).unwrap();
    assert_eq!(window.size, vec![1]);
}
