use std::fmt::Write as _;

use hostswap_core::markup::{ATTRIBUTE_PREFIX, Document, Element, Node, TEXT_KEY};
use hostswap_core::migration::MigrationReport;
use hostswap_core::players::{PlayerInfo, PlayerRole, PlayerRoster};
use serde_json::{Map as JsonMap, Value as JsonValue};

const SLOT_COL_WIDTH: usize = 5;
const NAME_COL_WIDTH: usize = 16;
const FARM_COL_WIDTH: usize = 16;
const ID_COL_WIDTH: usize = 20;
const MONEY_COL_WIDTH: usize = 12;
const DATE_COL_WIDTH: usize = 18;
const DECLARATION_KEY: &str = "?xml";
const SEASONS: [&str; 4] = ["Spring", "Summer", "Fall", "Winter"];

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

pub fn render_roster_text(roster: &PlayerRoster<'_>) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "{:>sw$}  {:<nw$}  {:<fw$}  {:<iw$}  {:>mw$}  {:<dw$}  PLAYED",
        "SLOT",
        "NAME",
        "FARM",
        "ID",
        "MONEY",
        "SAVED ON",
        sw = SLOT_COL_WIDTH,
        nw = NAME_COL_WIDTH,
        fw = FARM_COL_WIDTH,
        iw = ID_COL_WIDTH,
        mw = MONEY_COL_WIDTH,
        dw = DATE_COL_WIDTH,
    )
    .expect("writing to String cannot fail");

    for summary in roster.all() {
        write_roster_row(&mut out, &summary.info);
    }
    if roster.farmhands.is_empty() {
        writeln!(&mut out, "(no farmhands)").expect("writing to String cannot fail");
    }
    out
}

pub fn render_roster_json(roster: &PlayerRoster<'_>) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("host".to_string(), player_to_json(&roster.host.info));
    out.insert(
        "farmhands".to_string(),
        JsonValue::Array(
            roster
                .farmhands
                .iter()
                .map(|summary| player_to_json(&summary.info))
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn write_roster_row(out: &mut String, info: &PlayerInfo) {
    let slot = match (info.role, info.index) {
        (PlayerRole::Host, _) => "host".to_string(),
        (PlayerRole::Farmhand, Some(index)) => index.to_string(),
        (PlayerRole::Farmhand, None) => "?".to_string(),
    };
    let line = format!(
        "{:>sw$}  {:<nw$}  {:<fw$}  {:<iw$}  {:>mw$}  {:<dw$}  {}",
        slot,
        fit_column(info.name.as_deref().unwrap_or("-"), NAME_COL_WIDTH),
        fit_column(info.farm_name.as_deref().unwrap_or("-"), FARM_COL_WIDTH),
        fit_column(info.unique_id.as_deref().unwrap_or("-"), ID_COL_WIDTH),
        info.money.as_deref().map(format_money).unwrap_or_else(|| "-".to_string()),
        fit_column(&format_save_date(info), DATE_COL_WIDTH),
        info.milliseconds_played
            .as_deref()
            .map(format_play_time)
            .unwrap_or_else(|| "-".to_string()),
        sw = SLOT_COL_WIDTH,
        nw = NAME_COL_WIDTH,
        fw = FARM_COL_WIDTH,
        iw = ID_COL_WIDTH,
        mw = MONEY_COL_WIDTH,
        dw = DATE_COL_WIDTH,
    );
    writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
}

fn player_to_json(info: &PlayerInfo) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "role".to_string(),
        JsonValue::String(
            match info.role {
                PlayerRole::Host => "host",
                PlayerRole::Farmhand => "farmhand",
            }
            .to_string(),
        ),
    );
    out.insert(
        "index".to_string(),
        match info.index {
            Some(index) => JsonValue::from(index),
            None => JsonValue::Null,
        },
    );
    insert_text(&mut out, "name", info.name.as_deref());
    insert_text(&mut out, "farm_name", info.farm_name.as_deref());
    insert_text(&mut out, "unique_id", info.unique_id.as_deref());
    insert_text(&mut out, "money", info.money.as_deref());
    insert_text(
        &mut out,
        "total_money_earned",
        info.total_money_earned.as_deref(),
    );
    insert_text(&mut out, "year", info.year.as_deref());
    insert_text(&mut out, "season", info.season.as_deref());
    insert_text(&mut out, "day_of_month", info.day_of_month.as_deref());
    insert_text(
        &mut out,
        "milliseconds_played",
        info.milliseconds_played.as_deref(),
    );
    JsonValue::Object(out)
}

fn insert_text(out: &mut JsonMap<String, JsonValue>, key: &str, value: Option<&str>) {
    out.insert(
        key.to_string(),
        match value {
            Some(v) => JsonValue::String(v.to_string()),
            None => JsonValue::Null,
        },
    );
}

// ---------------------------------------------------------------------------
// Migration report
// ---------------------------------------------------------------------------

pub fn render_report_text(report: &MigrationReport) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "New host: {} ({}), was farmhand slot {}",
        report.new_host.as_deref().unwrap_or("<unnamed>"),
        report.new_host_id,
        report.target_index
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Old host: {} ({}), now in farmhand slot {}",
        report.old_host.as_deref().unwrap_or("<unnamed>"),
        report.old_host_id,
        report.target_index
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Cabin references redirected: {}",
        report.references_replaced
    )
    .expect("writing to String cannot fail");
    out
}

pub fn render_report_json(report: &MigrationReport) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "target_index".to_string(),
        JsonValue::from(report.target_index),
    );
    insert_text(&mut out, "old_host", report.old_host.as_deref());
    insert_text(&mut out, "new_host", report.new_host.as_deref());
    out.insert(
        "old_host_id".to_string(),
        JsonValue::String(report.old_host_id.clone()),
    );
    out.insert(
        "new_host_id".to_string(),
        JsonValue::String(report.new_host_id.clone()),
    );
    out.insert(
        "references_replaced".to_string(),
        JsonValue::from(report.references_replaced),
    );
    JsonValue::Object(out)
}

// ---------------------------------------------------------------------------
// Flattened document view
// ---------------------------------------------------------------------------

/// Whole document keyed by root tag, with the declaration (if any) under
/// `?xml`.
pub fn document_to_json(document: &Document) -> JsonValue {
    let mut out = JsonMap::new();
    if let Some(declaration) = &document.declaration {
        let mut decl = JsonMap::new();
        for attribute in &declaration.attributes {
            decl.insert(
                format!("{ATTRIBUTE_PREFIX}{}", attribute.name),
                JsonValue::String(attribute.value.clone()),
            );
        }
        out.insert(DECLARATION_KEY.to_string(), JsonValue::Object(decl));
    }
    out.insert(document.root.tag.clone(), element_to_json(&document.root));
    JsonValue::Object(out)
}

/// Flattened key/value view of one element.
///
/// Attributes become `@_name` keys and text becomes `#text`; an element
/// holding nothing but text collapses to a bare string. Children with the
/// same tag are gathered into an array in document order, a tag seen once
/// stays a single value.
pub fn element_to_json(element: &Element) -> JsonValue {
    let texts: Vec<&str> = element
        .children
        .iter()
        .filter_map(|node| match node {
            Node::Text(text) | Node::CData(text) => Some(text.as_str()),
            Node::Element(_) => None,
        })
        .collect();
    let has_elements = element.elements().next().is_some();

    if element.attributes.is_empty() && !has_elements {
        return JsonValue::String(texts.concat());
    }

    let mut out = JsonMap::new();
    for attribute in &element.attributes {
        out.insert(
            format!("{ATTRIBUTE_PREFIX}{}", attribute.name),
            JsonValue::String(attribute.value.clone()),
        );
    }
    if !texts.is_empty() {
        out.insert(TEXT_KEY.to_string(), JsonValue::String(texts.concat()));
    }
    for child in element.elements() {
        let value = element_to_json(child);
        match out.get_mut(&child.tag) {
            Some(JsonValue::Array(items)) if is_repeated(element, &child.tag) => items.push(value),
            Some(_) => {}
            None => {
                let slot = if is_repeated(element, &child.tag) {
                    JsonValue::Array(vec![value])
                } else {
                    value
                };
                out.insert(child.tag.clone(), slot);
            }
        }
    }
    JsonValue::Object(out)
}

fn is_repeated(parent: &Element, tag: &str) -> bool {
    parent.children_named(tag).nth(1).is_some()
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}

/// Digits are grouped when the text is an integer; anything else is shown
/// as stored.
fn format_money(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(n) => format_number_with_commas(n),
        Err(_) => raw.to_string(),
    }
}

fn format_number_with_commas(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let sign = if n < 0 { "-" } else { "" };
    format!("{sign}{}", group_digits(&s))
}

fn group_digits(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

fn format_save_date(info: &PlayerInfo) -> String {
    let (Some(year), Some(season), Some(day)) = (
        info.year.as_deref(),
        info.season.as_deref(),
        info.day_of_month.as_deref(),
    ) else {
        return "-".to_string();
    };
    format!("{} {}, Year {}", season_name(season), day, year)
}

/// Seasons are stored as 0-3; names pass through unchanged.
fn season_name(raw: &str) -> &str {
    match raw.trim().parse::<usize>() {
        Ok(index) => SEASONS.get(index).copied().unwrap_or(raw),
        Err(_) => raw,
    }
}

fn format_play_time(raw: &str) -> String {
    match raw.trim().parse::<u64>() {
        Ok(ms) => {
            let minutes = ms / 60_000;
            format!("{}h {:02}m", minutes / 60, minutes % 60)
        }
        Err(_) => raw.to_string(),
    }
}
