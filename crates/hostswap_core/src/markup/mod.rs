//! Markup codec for save documents.
//!
//! Text is read into a tree of [`Element`]s without interpreting values:
//! numbers stay text and entity references are never expanded. Writing is
//! deterministic, so a document already in the canonical layout comes back
//! byte for byte.

mod node;
mod reader;
mod writer;

use tracing::debug;

use crate::core_api::{CoreError, CoreErrorCode};

pub use node::{Attribute, Element, Node};
pub use reader::{MarkupError, MarkupErrorKind};

/// Key prefix marking an attribute in the flattened (key/value) view.
pub const ATTRIBUTE_PREFIX: &str = "@_";
/// Key holding an element's text in the flattened view.
pub const TEXT_KEY: &str = "#text";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub declaration: Option<Declaration>,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            root,
        }
    }

    pub fn parse_str(text: &str) -> Result<Self, MarkupError> {
        reader::MarkupReader::new(text).read_document()
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        writer::write_document(self, &mut out);
        out
    }
}

pub fn parse(text: &str) -> Result<Document, CoreError> {
    let document = Document::parse_str(text).map_err(|e| {
        CoreError::new(CoreErrorCode::Codec, format!("failed to parse markup: {e}"))
    })?;
    debug!(
        bytes = text.len(),
        root = %document.root.tag,
        "parsed markup document"
    );
    Ok(document)
}

pub fn serialize(document: &Document) -> String {
    let out = document.to_markup();
    debug!(bytes = out.len(), root = %document.root.tag, "serialized markup document");
    out
}
