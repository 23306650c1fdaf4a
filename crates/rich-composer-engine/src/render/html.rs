use std::fmt::Write;

use crate::render::{BlockElement, RenderBlock, RenderLeaf, RenderNode};

/// Serialize a render tree to an HTML fragment
pub fn to_html(blocks: &[RenderBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block);
    }
    out
}

fn write_attributes(out: &mut String, block: &RenderBlock) {
    for (name, value) in &block.attributes {
        let _ = write!(
            out,
            " {name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(value)
        );
    }
    if block.focused && block.element == BlockElement::Image {
        out.push_str(" class=\"selected\"");
    }
}

fn write_block(out: &mut String, block: &RenderBlock) {
    let tag = block.element.tag();
    out.push('<');
    out.push_str(tag);
    write_attributes(out, block);
    if block.element == BlockElement::Image {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &block.children {
        match child {
            RenderNode::Block(inner) => write_block(out, inner),
            RenderNode::Leaf(leaf) => write_leaf(out, leaf),
        }
    }
    let _ = write!(out, "</{tag}>");
}

fn write_leaf(out: &mut String, leaf: &RenderLeaf) {
    for mark in &leaf.marks {
        if let Some(tag) = mark.tag() {
            out.push('<');
            out.push_str(tag);
            if tag == "span" {
                out.push_str(" class=\"tab\"");
            }
            out.push('>');
        }
    }
    out.push_str(&html_escape::encode_text(&leaf.text));
    for mark in leaf.marks.iter().rev() {
        if let Some(tag) = mark.tag() {
            let _ = write!(out, "</{tag}>");
        }
    }
}
