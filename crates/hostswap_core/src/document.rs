use crate::core_api::{CoreError, CoreErrorCode};
use crate::layout::{CompanionLayout, SaveLayout};
use crate::markup::{self, Document, Element};

/// Cheap check that `text` could be a markup save at all.
pub fn looks_like_save(text: &str) -> bool {
    text.trim_start_matches('\u{feff}').trim().starts_with('<')
}

/// The companion file holds a single `Farmer` record with at least a name.
pub fn looks_like_companion(text: &str) -> bool {
    text.contains("<Farmer") && text.contains("<name>")
}

/// Main save document: a `SaveGame` root holding the host under `player` and
/// the other players under `farmhands`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDocument {
    document: Document,
}

impl SaveDocument {
    pub fn parse(text: &str, layout: &SaveLayout) -> Result<Self, CoreError> {
        if !looks_like_save(text) {
            return Err(CoreError::new(
                CoreErrorCode::Codec,
                "main save file is empty or does not start with markup",
            ));
        }
        let document = markup::parse(text).map_err(|e| {
            CoreError::new(e.code, format!("main save file: {}", e.message))
        })?;
        Self::from_document(document, layout)
    }

    pub fn from_document(document: Document, layout: &SaveLayout) -> Result<Self, CoreError> {
        if document.root.tag != layout.root {
            return Err(CoreError::missing(format!(
                "root element <{}> (found <{}>)",
                layout.root, document.root.tag
            )));
        }
        if document.root.child(&layout.host).is_none() {
            return Err(CoreError::missing(format!("host record <{}>", layout.host)));
        }
        Ok(Self { document })
    }

    pub fn root(&self) -> &Element {
        &self.document.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.document.root
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn host(&self, layout: &SaveLayout) -> Result<&Element, CoreError> {
        self.document
            .root
            .child(&layout.host)
            .ok_or_else(|| CoreError::missing(format!("host record <{}>", layout.host)))
    }

    /// Every slot of the farmhand container in document order, unused ones
    /// included. Positions in this sequence are the indices migration uses.
    pub fn farmhand_slots(&self, layout: &SaveLayout) -> Result<Vec<&Element>, CoreError> {
        let container = self
            .document
            .root
            .child(&layout.farmhand_container)
            .ok_or_else(|| {
                CoreError::missing(format!(
                    "farmhand container <{}>",
                    layout.farmhand_container
                ))
            })?;
        Ok(container
            .elements()
            .filter(|element| element.tag == layout.farmhand_record)
            .collect())
    }

    pub fn to_markup(&self) -> String {
        markup::serialize(&self.document)
    }
}

/// Companion document: a lone `Farmer` record mirroring the current host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionDocument {
    document: Document,
}

impl CompanionDocument {
    pub fn parse(text: &str, layout: &CompanionLayout) -> Result<Self, CoreError> {
        if !looks_like_companion(text) {
            return Err(CoreError::new(
                CoreErrorCode::Codec,
                "companion file does not contain a named Farmer record",
            ));
        }
        let document = markup::parse(text).map_err(|e| {
            CoreError::new(e.code, format!("companion file: {}", e.message))
        })?;
        Self::from_document(document, layout)
    }

    pub fn from_document(document: Document, layout: &CompanionLayout) -> Result<Self, CoreError> {
        if document.root.tag != layout.root {
            return Err(CoreError::missing(format!(
                "companion root <{}> (found <{}>)",
                layout.root, document.root.tag
            )));
        }
        Ok(Self { document })
    }

    pub fn record(&self) -> &Element {
        &self.document.root
    }

    pub(crate) fn record_mut(&mut self) -> &mut Element {
        &mut self.document.root
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn to_markup(&self) -> String {
        markup::serialize(&self.document)
    }
}
