use super::Document;
use super::node::{Attribute, Element, Node};

const INDENT: &str = "  ";

/// Pretty-prints a document with two-space indentation.
///
/// Layout rules:
///   - an element with no children is written as `<tag></tag>`, never dropped
///     or self-closed
///   - an element holding exactly one text node stays on one line
///   - anything else opens a block with one child per line
///
/// Text is emitted exactly as stored, so entity references pass through.
pub(crate) fn write_document(doc: &Document, out: &mut String) {
    if let Some(declaration) = &doc.declaration {
        out.push_str("<?xml");
        write_attributes(&declaration.attributes, out);
        out.push_str("?>\n");
    }
    write_element(&doc.root, 0, out);
    if out.ends_with('\n') {
        out.pop();
    }
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    push_indent(depth, out);
    out.push('<');
    out.push_str(&element.tag);
    write_attributes(&element.attributes, out);
    out.push('>');

    match element.children.as_slice() {
        [] => {}
        [Node::Text(text)] => out.push_str(text),
        [Node::CData(text)] => write_cdata(text, out),
        children => {
            out.push('\n');
            for child in children {
                match child {
                    Node::Element(inner) => write_element(inner, depth + 1, out),
                    Node::Text(text) => {
                        push_indent(depth + 1, out);
                        out.push_str(text);
                        out.push('\n');
                    }
                    Node::CData(text) => {
                        push_indent(depth + 1, out);
                        write_cdata(text, out);
                        out.push('\n');
                    }
                }
            }
            push_indent(depth, out);
        }
    }

    out.push_str("</");
    out.push_str(&element.tag);
    out.push_str(">\n");
}

fn write_attributes(attributes: &[Attribute], out: &mut String) {
    for attribute in attributes {
        let quote = if attribute.value.contains('"') && !attribute.value.contains('\'') {
            '\''
        } else {
            '"'
        };
        out.push(' ');
        out.push_str(&attribute.name);
        out.push('=');
        out.push(quote);
        out.push_str(&attribute.value);
        out.push(quote);
    }
}

fn write_cdata(text: &str, out: &mut String) {
    out.push_str("<![CDATA[");
    out.push_str(text);
    out.push_str("]]>");
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
