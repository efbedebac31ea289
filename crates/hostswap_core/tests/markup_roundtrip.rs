use std::fs;
use std::path::PathBuf;

use hostswap_core::core_api::CoreErrorCode;
use hostswap_core::markup::{self, Attribute, Document, Element, MarkupErrorKind, Node};
use proptest::prelude::*;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_text(name: &str) -> String {
    let path = workspace_root().join("tests/fixtures/Meadowlands_123456789").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e))
}

const CANONICAL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SaveGame xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <player>
    <name>Ada</name>
    <UniqueMultiplayerID>-6023817754981226181</UniqueMultiplayerID>
    <money>0125000</money>
    <loveInterest xsi:nil="true"></loveInterest>
    <characters></characters>
    <note>Fish &amp; Chips</note>
    <eventsSeen>
      <int>60367</int>
      <int>112</int>
    </eventsSeen>
  </player>
  <farmhands>
    <Farmer>
      <name>Bram</name>
    </Farmer>
  </farmhands>
</SaveGame>"#;

#[test]
fn canonical_text_survives_parse_and_serialize_byte_for_byte() {
    let document = markup::parse(CANONICAL).expect("canonical text should parse");
    assert_eq!(markup::serialize(&document), CANONICAL);
}

#[test]
fn values_are_kept_as_raw_text() {
    let document = markup::parse(CANONICAL).expect("canonical text should parse");
    let player = document.root.child("player").expect("player record");

    assert_eq!(player.child_text("money"), Some("0125000"));
    assert_eq!(
        player.child_text("UniqueMultiplayerID"),
        Some("-6023817754981226181")
    );
    assert_eq!(player.child_text("note"), Some("Fish &amp; Chips"));
    assert_eq!(
        player.child("loveInterest").and_then(|e| e.attribute("xsi:nil")),
        Some("true")
    );
}

#[test]
fn repeated_and_single_children_are_both_sequences() {
    let document = markup::parse(CANONICAL).expect("canonical text should parse");
    let events = document
        .root
        .descend(&["player", "eventsSeen"])
        .expect("eventsSeen");
    let farmhands = document.root.child("farmhands").expect("farmhands");

    assert_eq!(events.children_named("int").count(), 2);
    assert_eq!(farmhands.children_named("Farmer").count(), 1);
}

#[test]
fn looked_up_children_outlive_the_tag_string() {
    let document = markup::parse(CANONICAL).expect("canonical text should parse");
    let player = {
        let tag = String::from("player");
        document.root.child(&tag)
    };
    let ints: Vec<&Element> = {
        let tag = String::from("int");
        player
            .and_then(|p| p.child("eventsSeen"))
            .map(|events| events.children_named(&tag).collect())
            .unwrap_or_default()
    };

    assert_eq!(player.and_then(|p| p.child_text("name")), Some("Ada"));
    assert_eq!(ints.len(), 2);
    assert_eq!(ints[1].text(), Some("112"));
}

#[test]
fn fixture_save_reaches_a_fixed_point_after_one_pass() {
    let text = fixture_text("Meadowlands_123456789");
    let first = markup::parse(&text).expect("fixture should parse");
    let written = markup::serialize(&first);
    let second = markup::parse(&written).expect("serialized fixture should parse");

    assert_eq!(second, first);
    assert_eq!(markup::serialize(&second), written);
}

#[test]
fn self_closing_elements_are_written_as_open_close_pairs() {
    let document = markup::parse("<stats><fishCaught /><stepsTaken/></stats>")
        .expect("self-closing elements should parse");
    assert_eq!(
        markup::serialize(&document),
        "<stats>\n  <fishCaught></fishCaught>\n  <stepsTaken></stepsTaken>\n</stats>"
    );
}

#[test]
fn declaration_is_optional() {
    let document = markup::parse("<Farmer><name>Ada</name></Farmer>").expect("should parse");
    assert!(document.declaration.is_none());
    assert_eq!(
        document.to_markup(),
        "<Farmer>\n  <name>Ada</name>\n</Farmer>"
    );
}

#[test]
fn malformed_input_is_a_codec_error_with_position() {
    let err = markup::parse("<SaveGame>\n  <player></farmhands>\n</SaveGame>")
        .expect_err("mismatched tag should fail");
    assert_eq!(err.code, CoreErrorCode::Codec);
    assert!(err.message.contains("line 2"), "message: {}", err.message);

    let err = Document::parse_str("<SaveGame><player>").expect_err("truncated input");
    assert!(matches!(err.kind, MarkupErrorKind::UnexpectedEof(_)));

    let err = Document::parse_str("").expect_err("empty input");
    assert_eq!(err.kind, MarkupErrorKind::MissingRoot);

    let err = Document::parse_str("<a></a><b></b>").expect_err("two roots");
    assert_eq!(err.kind, MarkupErrorKind::TrailingContent);
}

#[test]
fn built_documents_serialize_deterministically() {
    let root = Element::new("Farmer")
        .with_attribute("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .with_child(Element::with_text("name", "Cleo"))
        .with_child(Element::new("stats").with_child(Element::with_text("stepsTaken", "12")));
    let document = Document::new(root);

    let expected = "<Farmer xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\n  <name>Cleo</name>\n  <stats>\n    <stepsTaken>12</stepsTaken>\n  </stats>\n</Farmer>";
    assert_eq!(document.to_markup(), expected);
    assert_eq!(document.to_markup(), document.clone().to_markup());
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

fn tag_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,7}"
}

fn text_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._-]{1,6}( [A-Za-z0-9._-]{1,6}){0,2}"
}

fn attributes() -> impl Strategy<Value = Vec<Attribute>> {
    prop::collection::btree_map("[a-z][a-zA-Z0-9:]{0,6}", "[A-Za-z0-9 ._/-]{0,10}", 0..3)
        .prop_map(|map| {
            map.into_iter()
                .map(|(name, value)| Attribute::new(name, value))
                .collect()
        })
}

fn element() -> impl Strategy<Value = Element> {
    let leaf = (tag_name(), attributes(), prop::option::of(text_value())).prop_map(
        |(tag, attributes, text)| Element {
            tag,
            attributes,
            children: text.map(Node::Text).into_iter().collect(),
        },
    );
    leaf.prop_recursive(4, 48, 4, |inner| {
        (tag_name(), attributes(), prop::collection::vec(inner, 1..4)).prop_map(
            |(tag, attributes, children)| Element {
                tag,
                attributes,
                children: children.into_iter().map(Node::Element).collect(),
            },
        )
    })
}

proptest! {
    #[test]
    fn parse_inverts_serialize(root in element()) {
        let document = Document::new(root);
        let text = markup::serialize(&document);
        let reparsed = markup::parse(&text).expect("serialized tree should parse");
        prop_assert_eq!(&reparsed, &document);
        prop_assert_eq!(markup::serialize(&reparsed), text);
    }
}
