use std::fs;
use std::path::PathBuf;

use hostswap_core::core_api::CoreErrorCode;
use hostswap_core::document::SaveDocument;
use hostswap_core::layout::SaveLayout;
use hostswap_core::players::{PlayerRole, PlayerRoster, extract_players};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn load_fixture_save() -> SaveDocument {
    let path = workspace_root().join("tests/fixtures/Meadowlands_123456789/Meadowlands_123456789");
    let text =
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e));
    SaveDocument::parse(&text, &SaveLayout::default())
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", path, e))
}

#[test]
fn host_and_named_farmhands_are_listed_with_slot_indices() {
    let save = load_fixture_save();
    let roster = extract_players(&save, &SaveLayout::default()).expect("fixture has farmhands");

    assert_eq!(roster.host.info.role, PlayerRole::Host);
    assert_eq!(roster.host.info.index, None);
    assert_eq!(roster.host.info.name.as_deref(), Some("Ada"));
    assert_eq!(
        roster.host.info.unique_id.as_deref(),
        Some("-6023817754981226181")
    );
    assert_eq!(roster.host.info.money.as_deref(), Some("125000"));
    assert_eq!(roster.host.info.season.as_deref(), Some("2"));

    let names: Vec<_> = roster
        .farmhands
        .iter()
        .map(|summary| (summary.info.index, summary.info.name.as_deref()))
        .collect();
    assert_eq!(names, vec![(Some(0), Some("Bram")), (Some(2), Some("Cleo"))]);
}

#[test]
fn empty_slot_is_skipped_but_keeps_later_indices_stable() {
    let save = load_fixture_save();
    let roster = extract_players(&save, &SaveLayout::default()).expect("fixture has farmhands");

    assert!(roster.farmhand(1).is_none());
    let cleo = roster.farmhand(2).expect("slot 2 holds Cleo");
    assert_eq!(cleo.info.unique_id.as_deref(), Some("7823001122334455"));
    assert_eq!(cleo.info.role, PlayerRole::Farmhand);
}

#[test]
fn summaries_borrow_the_records_they_describe() {
    let save = load_fixture_save();
    let layout = SaveLayout::default();
    let roster = extract_players(&save, &layout).expect("fixture has farmhands");

    let host_record = save.host(&layout).expect("host record");
    assert!(std::ptr::eq(roster.host.record, host_record));

    let bram = roster.farmhand(0).expect("slot 0 holds Bram");
    let first_slot = save
        .farmhand_slots(&layout)
        .expect("farmhand container")
        .first()
        .copied()
        .expect("first slot");
    assert!(std::ptr::eq(bram.record, first_slot));
}

#[test]
fn farmhand_slots_outlive_the_layout_they_were_read_with() {
    let save = load_fixture_save();
    let slots = {
        let layout = SaveLayout::default();
        save.farmhand_slots(&layout).expect("farmhand container")
    };

    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0].child_text("name"), Some("Bram"));
    assert_eq!(slots[2].child_text("name"), Some("Cleo"));
}

#[test]
fn all_yields_host_first() {
    let save = load_fixture_save();
    let roster = extract_players(&save, &SaveLayout::default()).expect("fixture has farmhands");
    let roles: Vec<_> = roster.all().map(|summary| summary.info.role).collect();
    assert_eq!(
        roles,
        vec![PlayerRole::Host, PlayerRole::Farmhand, PlayerRole::Farmhand]
    );
}

#[test]
fn save_without_named_farmhands_has_no_secondary_players() {
    let text = "<SaveGame>\n<player><name>Solo</name><UniqueMultiplayerID>1</UniqueMultiplayerID></player>\n<farmhands><Farmer><name></name><UniqueMultiplayerID>2</UniqueMultiplayerID></Farmer><Farmer><UniqueMultiplayerID>3</UniqueMultiplayerID></Farmer></farmhands>\n</SaveGame>";
    let layout = SaveLayout::default();
    let save = SaveDocument::parse(text, &layout).expect("save should parse");

    let err = extract_players(&save, &layout).expect_err("no candidates");
    assert_eq!(err.code, CoreErrorCode::NoSecondaryPlayers);

    let roster = PlayerRoster::collect(&save, &layout).expect("listing still works");
    assert_eq!(roster.host.info.name.as_deref(), Some("Solo"));
    assert!(roster.farmhands.is_empty());
}

#[test]
fn host_is_listed_even_without_a_name() {
    let text = "<SaveGame><player><UniqueMultiplayerID>1</UniqueMultiplayerID></player><farmhands><Farmer><name>Bo</name></Farmer></farmhands></SaveGame>";
    let layout = SaveLayout::default();
    let save = SaveDocument::parse(text, &layout).expect("save should parse");
    let roster = extract_players(&save, &layout).expect("Bo is a candidate");

    assert_eq!(roster.host.info.name, None);
    assert_eq!(roster.farmhands.len(), 1);
}

#[test]
fn missing_farmhand_container_lists_only_the_host() {
    let text = "<SaveGame><player><name>Solo</name></player></SaveGame>";
    let layout = SaveLayout::default();
    let save = SaveDocument::parse(text, &layout).expect("save should parse");

    let roster = PlayerRoster::collect(&save, &layout).expect("listing works");
    assert!(roster.farmhands.is_empty());
    let err = extract_players(&save, &layout).expect_err("no candidates");
    assert_eq!(err.code, CoreErrorCode::NoSecondaryPlayers);
}

#[test]
fn player_info_serializes_with_raw_text_values() {
    let save = load_fixture_save();
    let roster = extract_players(&save, &SaveLayout::default()).expect("fixture has farmhands");
    let json = serde_json::to_value(&roster.host.info).expect("info should serialize");

    assert_eq!(json["role"], "Host");
    assert_eq!(json["unique_id"], "-6023817754981226181");
    assert_eq!(json["milliseconds_played"], "93600000");
    assert!(json["index"].is_null());
}
