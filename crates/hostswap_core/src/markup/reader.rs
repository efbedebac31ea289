use std::error::Error;
use std::fmt;

use super::node::{Attribute, Element, Node};
use super::{Declaration, Document};

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupErrorKind {
    UnexpectedEof(&'static str),
    UnexpectedChar { found: char, expected: &'static str },
    EmptyName,
    MismatchedTag { open: String, close: String },
    DuplicateAttribute(String),
    MissingRoot,
    TrailingContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupError {
    pub kind: MarkupErrorKind,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for MarkupErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof(context) => write!(f, "unexpected end of input in {context}"),
            Self::UnexpectedChar { found, expected } => {
                write!(f, "unexpected character {found:?}, expected {expected}")
            }
            Self::EmptyName => f.write_str("missing tag or attribute name"),
            Self::MismatchedTag { open, close } => {
                write!(f, "closing tag </{close}> does not match <{open}>")
            }
            Self::DuplicateAttribute(name) => write!(f, "duplicate attribute {name:?}"),
            Self::MissingRoot => f.write_str("document has no root element"),
            Self::TrailingContent => f.write_str("content after the root element"),
        }
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)
    }
}

impl Error for MarkupError {}

/// Cursor over the raw document text. Entity references are never decoded:
/// `&amp;` is read, stored and written back as the five characters it is.
pub(crate) struct MarkupReader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> MarkupReader<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        let input = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);
        Self { input, pos: 0 }
    }

    pub(crate) fn read_document(mut self) -> Result<Document, MarkupError> {
        let mut declaration = None;
        self.skip_whitespace();
        if self.starts_with("<?xml") && self.peek_at(5).is_some_and(is_space_or_close) {
            declaration = Some(self.read_declaration()?);
        }

        self.skip_misc()?;
        if !self.starts_with("<") {
            return Err(self.error(if self.at_end() {
                MarkupErrorKind::MissingRoot
            } else {
                MarkupErrorKind::TrailingContent
            }));
        }

        let root = self.read_tree()?;

        self.skip_misc()?;
        if !self.at_end() {
            return Err(self.error(MarkupErrorKind::TrailingContent));
        }

        Ok(Document { declaration, root })
    }

    fn read_declaration(&mut self) -> Result<Declaration, MarkupError> {
        self.pos += "<?xml".len();
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.starts_with("?>") {
                self.pos += 2;
                return Ok(Declaration { attributes });
            }
            if self.at_end() {
                return Err(self.error(MarkupErrorKind::UnexpectedEof("xml declaration")));
            }
            let attribute = self.read_attribute()?;
            attributes.push(attribute);
        }
    }

    /// Comments, processing instructions and doctype between top-level nodes.
    fn skip_misc(&mut self) -> Result<(), MarkupError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if self.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if self.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn read_tree(&mut self) -> Result<Element, MarkupError> {
        let (root, self_closed) = self.read_start_tag()?;
        if self_closed {
            return Ok(root);
        }

        let input = self.input;
        let mut open: Vec<Element> = vec![root];
        loop {
            let Some(offset) = input[self.pos..].find('<') else {
                self.pos = input.len();
                return Err(self.error(MarkupErrorKind::UnexpectedEof("element content")));
            };
            let text = input[self.pos..self.pos + offset].trim();
            self.pos += offset;
            if !text.is_empty() {
                if let Some(parent) = open.last_mut() {
                    parent.children.push(Node::Text(text.to_string()));
                }
            }

            if self.starts_with("</") {
                let close_start = self.pos;
                let name = self.read_end_tag()?;
                let Some(element) = open.pop() else {
                    return Err(self.error(MarkupErrorKind::TrailingContent));
                };
                if element.tag != name {
                    self.pos = close_start;
                    return Err(self.error(MarkupErrorKind::MismatchedTag {
                        open: element.tag,
                        close: name,
                    }));
                }
                match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => return Ok(element),
                }
            } else if self.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                let body = self.take_until("]]>", "CDATA section")?;
                if let Some(parent) = open.last_mut() {
                    parent.children.push(Node::CData(body.to_string()));
                }
            } else if self.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else {
                let (element, self_closed) = self.read_start_tag()?;
                if self_closed {
                    if let Some(parent) = open.last_mut() {
                        parent.children.push(Node::Element(element));
                    }
                } else {
                    open.push(element);
                }
            }
        }
    }

    /// Reads `<name attr="v" ...>` or `<name .../>`; the flag is true for the
    /// self-closing form.
    fn read_start_tag(&mut self) -> Result<(Element, bool), MarkupError> {
        self.expect('<', "'<'")?;
        let mut element = Element::new(self.read_name()?);
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    return Ok((element, false));
                }
                Some('/') => {
                    self.pos += 1;
                    self.expect('>', "'>' after '/'")?;
                    return Ok((element, true));
                }
                Some(_) => {
                    let attr_start = self.pos;
                    let attribute = self.read_attribute()?;
                    if element.attribute(&attribute.name).is_some() {
                        self.pos = attr_start;
                        let kind = MarkupErrorKind::DuplicateAttribute(attribute.name);
                        return Err(self.error(kind));
                    }
                    element.attributes.push(attribute);
                }
                None => return Err(self.error(MarkupErrorKind::UnexpectedEof("start tag"))),
            }
        }
    }

    fn read_end_tag(&mut self) -> Result<String, MarkupError> {
        self.pos += 2;
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect('>', "'>' to close end tag")?;
        Ok(name)
    }

    fn read_attribute(&mut self) -> Result<Attribute, MarkupError> {
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect('=', "'=' after attribute name")?;
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            Some(found) => {
                return Err(self.error(MarkupErrorKind::UnexpectedChar {
                    found,
                    expected: "quoted attribute value",
                }));
            }
            None => return Err(self.error(MarkupErrorKind::UnexpectedEof("attribute value"))),
        };
        self.pos += 1;
        let value = match quote {
            '"' => self.take_until("\"", "attribute value")?,
            _ => self.take_until("'", "attribute value")?,
        };
        Ok(Attribute::new(name, value))
    }

    fn read_name(&mut self) -> Result<String, MarkupError> {
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| c.is_whitespace() || is_name_terminator(c))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error(if rest.is_empty() {
                MarkupErrorKind::UnexpectedEof("name")
            } else {
                MarkupErrorKind::EmptyName
            }));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn skip_doctype(&mut self) -> Result<(), MarkupError> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error(MarkupErrorKind::UnexpectedEof("doctype")))
    }

    fn skip_past(&mut self, terminator: &str, context: &'static str) -> Result<(), MarkupError> {
        self.take_until(terminator, context).map(|_| ())
    }

    /// Returns the text up to `terminator` and moves past it.
    fn take_until(
        &mut self,
        terminator: &str,
        context: &'static str,
    ) -> Result<&'a str, MarkupError> {
        let input = self.input;
        match input[self.pos..].find(terminator) {
            Some(offset) => {
                let body = &input[self.pos..self.pos + offset];
                self.pos += offset + terminator.len();
                Ok(body)
            }
            None => {
                self.pos = input.len();
                Err(self.error(MarkupErrorKind::UnexpectedEof(context)))
            }
        }
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), MarkupError> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(self.error(MarkupErrorKind::UnexpectedChar { found, expected })),
            None => Err(self.error(MarkupErrorKind::UnexpectedEof(expected))),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset..)?.chars().next()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, kind: MarkupErrorKind) -> MarkupError {
        let consumed = &self.input[..self.pos.min(self.input.len())];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
        let column = consumed[line_start..].chars().count() + 1;
        MarkupError { kind, line, column }
    }
}

fn is_name_terminator(c: char) -> bool {
    matches!(c, '/' | '>' | '=' | '<' | '"' | '\'' | '?')
}

fn is_space_or_close(c: char) -> bool {
    c.is_whitespace() || c == '?'
}
