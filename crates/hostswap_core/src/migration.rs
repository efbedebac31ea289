//! Host migration: the chosen farmhand becomes the host and the old host
//! takes the farmhand's slot.
//!
//! Order of operations on the two records:
//!   1. the target's save date is overwritten with the host's
//!   2. the coupled (role-bound) fields are exchanged
//!   3. the record bodies trade places
//!   4. `farmhandReference` pointers to the new host are redirected to the
//!      old host, anywhere in the document
//!
//! Every lookup happens before the first write, so a failed migration leaves
//! the document as it was.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::document::SaveDocument;
use crate::layout::MigrationRules;
use crate::markup::{Element, Node};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationReport {
    pub target_index: usize,
    pub old_host: Option<String>,
    pub new_host: Option<String>,
    pub old_host_id: String,
    pub new_host_id: String,
    pub references_replaced: usize,
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub save: SaveDocument,
    pub report: MigrationReport,
}

/// Promotes the farmhand in slot `target_index` to host.
///
/// The save is taken by value; callers that still need the original keep
/// their own copy.
pub fn migrate_host(
    mut save: SaveDocument,
    target_index: usize,
    rules: &MigrationRules,
) -> Result<Migration, CoreError> {
    let report = migrate_host_in_place(&mut save, target_index, rules)?;
    Ok(Migration { save, report })
}

pub(crate) fn migrate_host_in_place(
    save: &mut SaveDocument,
    target_index: usize,
    rules: &MigrationRules,
) -> Result<MigrationReport, CoreError> {
    let layout = &rules.layout;
    let root = save.root_mut();

    let host_pos = root
        .child_position(&layout.host)
        .ok_or_else(|| CoreError::missing(format!("host record <{}>", layout.host)))?;
    let container_pos = root.child_position(&layout.farmhand_container).ok_or_else(|| {
        CoreError::missing(format!(
            "farmhand container <{}>",
            layout.farmhand_container
        ))
    })?;
    let (host_node, container_node) = pair_mut(&mut root.children, host_pos, container_pos)
        .ok_or_else(|| CoreError::missing("distinct host and farmhand container elements"))?;
    let (Some(host), Some(container)) =
        (host_node.as_element_mut(), container_node.as_element_mut())
    else {
        return Err(CoreError::missing("host or farmhand container element"));
    };

    let slot_count = container.children_named(&layout.farmhand_record).count();
    let target = nth_element_mut(container, &layout.farmhand_record, target_index).ok_or_else(
        || {
            CoreError::new(
                CoreErrorCode::IndexOutOfRange,
                format!(
                    "no farmhand record at index {target_index} (save has {slot_count} slots)"
                ),
            )
        },
    )?;

    let old_host_id = required_text(host, &layout.unique_id, "host")?;
    let new_host_id = required_text(target, &layout.unique_id, "target farmhand")?;
    if old_host_id == new_host_id {
        warn!(id = %old_host_id, "host and target farmhand share a unique id");
    }
    let old_host = host.child_text(&layout.name).map(str::to_string);
    let new_host = target.child_text(&layout.name).map(str::to_string);

    sync_save_date(host, target, &rules.date_fields);
    swap_coupled_fields(host, target, &rules.coupled_fields);
    swap_records(host, target);

    let references_replaced =
        redirect_references(root, &layout.reference_field, &new_host_id, &old_host_id);

    info!(
        target_index,
        old_host = old_host.as_deref().unwrap_or("<unnamed>"),
        new_host = new_host.as_deref().unwrap_or("<unnamed>"),
        references_replaced,
        "host migrated"
    );

    Ok(MigrationReport {
        target_index,
        old_host,
        new_host,
        old_host_id,
        new_host_id,
        references_replaced,
    })
}

/// The host's wall clock wins: a farmhand that has been away for seasons
/// returns at the date the world is actually at. A date field the host lacks
/// is removed from the target as well.
fn sync_save_date(host: &Element, target: &mut Element, fields: &[String]) {
    for field in fields {
        match host.child(field) {
            Some(value) => target.put_child(value.clone()),
            None => {
                target.take_child(field);
            }
        }
    }
}

/// Exchanges each coupled field as a whole element. A field present on only
/// one side moves to the other.
fn swap_coupled_fields(a: &mut Element, b: &mut Element, fields: &[String]) {
    for field in fields {
        if let (Some(left), Some(right)) = (a.child_mut(field), b.child_mut(field)) {
            std::mem::swap(left, right);
        } else if let Some(moved) = a.take_child(field) {
            b.children.push(Node::Element(moved));
        } else if let Some(moved) = b.take_child(field) {
            a.children.push(Node::Element(moved));
        }
    }
}

/// Trades record bodies while each slot keeps its own tag.
fn swap_records(host: &mut Element, target: &mut Element) {
    std::mem::swap(&mut host.attributes, &mut target.attributes);
    std::mem::swap(&mut host.children, &mut target.children);
}

/// Depth-first over every element; returns the number of rewrites.
fn redirect_references(element: &mut Element, field: &str, from: &str, to: &str) -> usize {
    if element.tag == field {
        if element.attributes.is_empty() && element.text() == Some(from) {
            element.set_text(to);
            return 1;
        }
        return 0;
    }
    element
        .elements_mut()
        .map(|child| redirect_references(child, field, from, to))
        .sum()
}

fn required_text(record: &Element, field: &str, whose: &str) -> Result<String, CoreError> {
    record
        .child_text(field)
        .map(str::to_string)
        .ok_or_else(|| CoreError::missing(format!("<{field}> on the {whose} record")))
}

fn nth_element_mut<'a>(parent: &'a mut Element, tag: &str, n: usize) -> Option<&'a mut Element> {
    parent.elements_mut().filter(|element| element.tag == tag).nth(n)
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a.max(b) >= items.len() {
        return None;
    }
    if a < b {
        let (left, right) = items.split_at_mut(b);
        Some((left.get_mut(a)?, right.first_mut()?))
    } else {
        let (left, right) = items.split_at_mut(a);
        Some((right.first_mut()?, left.get_mut(b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::{pair_mut, redirect_references, swap_coupled_fields};
    use crate::markup::Element;

    #[test]
    fn pair_mut_rejects_same_or_out_of_range_index() {
        let mut items = [1, 2, 3];
        assert!(pair_mut(&mut items, 1, 1).is_none());
        assert!(pair_mut(&mut items, 0, 3).is_none());
        let (a, b) = pair_mut(&mut items, 2, 0).expect("distinct indices");
        std::mem::swap(a, b);
        assert_eq!(items, [3, 2, 1]);
    }

    #[test]
    fn coupled_field_missing_on_one_side_moves_across() {
        let mut a =
            Element::new("player").with_child(Element::with_text("homeLocation", "FarmHouse"));
        let mut b = Element::new("Farmer");
        swap_coupled_fields(&mut a, &mut b, &["homeLocation".to_string()]);
        assert!(a.child("homeLocation").is_none());
        assert_eq!(b.child_text("homeLocation"), Some("FarmHouse"));
    }

    #[test]
    fn references_with_attributes_are_left_alone() {
        let mut root = Element::new("SaveGame")
            .with_child(Element::with_text("farmhandReference", "7"))
            .with_child(
                Element::with_text("farmhandReference", "7").with_attribute("kind", "pinned"),
            );
        assert_eq!(redirect_references(&mut root, "farmhandReference", "7", "9"), 1);
    }
}
