use tracing::info;

use crate::core_api::CoreError;
use crate::document::CompanionDocument;
use crate::layout::CompanionLayout;
use crate::markup::Element;

/// Replaces the companion's record with a copy of `new_host`.
///
/// The companion root keeps its own tag; attributes and children come from
/// `new_host`. The schema of this file requires the `xmlns:xsi`/`xmlns:xsd`
/// declarations, which a record lifted out of the main save usually lacks,
/// so missing ones are added.
pub fn update_companion(
    mut companion: CompanionDocument,
    new_host: &Element,
    layout: &CompanionLayout,
) -> Result<CompanionDocument, CoreError> {
    replace_record(&mut companion, new_host, layout)?;
    Ok(companion)
}

pub(crate) fn replace_record(
    companion: &mut CompanionDocument,
    new_host: &Element,
    layout: &CompanionLayout,
) -> Result<(), CoreError> {
    let record = companion.record_mut();
    if record.tag != layout.root {
        return Err(CoreError::missing(format!(
            "companion record <{}> (found <{}>)",
            layout.root, record.tag
        )));
    }

    let previous = record.child_text("name").map(str::to_string);
    record.attributes = new_host.attributes.clone();
    record.children = new_host.children.clone();
    for (name, value) in &layout.required_attributes {
        if record.attribute(name).is_none() {
            record.set_attribute(name.clone(), value.clone());
        }
    }

    info!(
        previous = previous.as_deref().unwrap_or("<unnamed>"),
        current = record.child_text("name").unwrap_or("<unnamed>"),
        "companion record updated"
    );
    Ok(())
}
