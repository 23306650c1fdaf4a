use std::collections::HashMap;
use std::ops::Range;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use rich_composer_engine::editing::Point;
use rich_composer_engine::render::{BlockElement, MarkElement, RenderBlock, RenderLeaf, RenderNode, render};
use rich_composer_engine::{NodeKey, Snapshot};

use crate::app::{App, Mode};

/// Where the selection falls, per text node
struct Cursor {
    covered: HashMap<NodeKey, Range<usize>>,
    caret: Option<Point>,
}

impl Cursor {
    fn new(snapshot: &Snapshot) -> Self {
        let tree = snapshot.tree();
        match snapshot.selection() {
            Some(selection) if selection.is_expanded() => Self {
                covered: selection.covered_texts(tree).into_iter().collect(),
                caret: None,
            },
            Some(selection) => Self {
                covered: HashMap::new(),
                caret: Some(selection.focus),
            },
            None => Self {
                covered: HashMap::new(),
                caret: None,
            },
        }
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let snapshot = app.editor.snapshot();
    let lines = document_lines(snapshot);
    let title = format!(
        "{}{}",
        app.document_path.display(),
        if app.is_modified() { " *" } else { "" }
    );
    let document = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(document, chunks[0]);

    let status = match &app.mode {
        Mode::Prompt { kind, input } => Line::from(vec![
            Span::styled(kind.label(), Style::default().fg(Color::Cyan)),
            Span::raw(input.clone()),
        ]),
        Mode::Editing => Line::from(app.status.clone().unwrap_or_default()),
    };
    f.render_widget(Paragraph::new(status), chunks[1]);

    let help = Line::from(vec![
        Span::raw("Esc: Quit | "),
        Span::raw("^S: Save | "),
        Span::raw("^B/^I/^U/Tab: Marks | "),
        Span::raw("Alt+1/2/q/n/b: Blocks | "),
        Span::raw("^G: Image URL | ^O: Choose file | ^P: Upload"),
    ]);
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

pub fn document_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    let cursor = Cursor::new(snapshot);
    let mut lines = Vec::new();
    for block in render(snapshot) {
        block_lines(&block, "", &cursor, &mut lines);
    }
    lines
}

fn block_lines(block: &RenderBlock, indent: &str, cursor: &Cursor, lines: &mut Vec<Line<'static>>) {
    let nested = block
        .children
        .iter()
        .any(|child| matches!(child, RenderNode::Block(_)));
    if !nested {
        lines.push(leaf_block_line(block, indent, String::new(), cursor));
        return;
    }

    let child_indent = match block.element {
        BlockElement::BulletedList | BlockElement::NumberedList => format!("{indent}  "),
        _ => indent.to_string(),
    };
    let mut number = 0;
    for child in &block.children {
        let RenderNode::Block(child) = child else {
            continue;
        };
        let marker = match block.element {
            BlockElement::BulletedList => "• ".to_string(),
            BlockElement::NumberedList => {
                number += 1;
                format!("{number}. ")
            }
            _ => String::new(),
        };
        if marker.is_empty() {
            block_lines(child, &child_indent, cursor, lines);
        } else {
            list_item_lines(child, &child_indent, marker, cursor, lines);
        }
    }
}

/// A list item's first line carries the marker; nested content is indented
fn list_item_lines(
    item: &RenderBlock,
    indent: &str,
    marker: String,
    cursor: &Cursor,
    lines: &mut Vec<Line<'static>>,
) {
    let has_blocks = item
        .children
        .iter()
        .any(|child| matches!(child, RenderNode::Block(_)));
    if has_blocks {
        lines.push(Line::from(format!("{indent}{marker}")));
        block_lines(item, &format!("{indent}  "), cursor, lines);
    } else {
        lines.push(leaf_block_line(item, indent, marker, cursor));
    }
}

fn leaf_block_line(block: &RenderBlock, indent: &str, marker: String, cursor: &Cursor) -> Line<'static> {
    let mut spans = vec![Span::raw(format!("{indent}{marker}"))];
    let (prefix, base) = match block.element {
        BlockElement::HeadingOne => (
            "# ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        BlockElement::HeadingTwo => ("## ", Style::default().fg(Color::Cyan)),
        BlockElement::BlockQuote => (
            "│ ",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ),
        _ => ("", Style::default()),
    };

    if block.element == BlockElement::Image {
        let src = block.attributes.get("src").cloned().unwrap_or_default();
        let style = if block.focused {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Magenta)
        };
        spans.push(Span::styled(format!("[image: {}]", shorten(&src)), style));
        return Line::from(spans);
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, base));
    }
    for child in &block.children {
        if let RenderNode::Leaf(leaf) = child {
            leaf_spans(leaf, base, cursor, &mut spans);
        }
    }
    Line::from(spans)
}

fn mark_style(base: Style, marks: &[MarkElement]) -> Style {
    marks.iter().fold(base, |style, mark| match mark {
        MarkElement::Strong => style.add_modifier(Modifier::BOLD),
        MarkElement::Emphasis => style.add_modifier(Modifier::ITALIC),
        MarkElement::Underline => style.add_modifier(Modifier::UNDERLINED),
        MarkElement::Code => style.fg(Color::Yellow),
        MarkElement::Tab => style.add_modifier(Modifier::DIM),
        MarkElement::Plain => style,
    })
}

/// Split a leaf into spans, reversing the selected range or the caret cell
fn leaf_spans(leaf: &RenderLeaf, base: Style, cursor: &Cursor, spans: &mut Vec<Span<'static>>) {
    let style = mark_style(base, &leaf.marks);
    let selected = cursor.covered.get(&leaf.key);
    let caret = cursor
        .caret
        .filter(|p| p.key == leaf.key)
        .map(|p| p.offset);

    let mut run = String::new();
    let mut run_style = style;
    for (offset, c) in leaf.text.char_indices() {
        let highlighted = selected.is_some_and(|r| r.contains(&offset)) || caret == Some(offset);
        let char_style = if highlighted {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        if char_style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = char_style;
        run.push(c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    if caret.is_some_and(|offset| offset >= leaf.text.len()) {
        spans.push(Span::styled(" ", style.add_modifier(Modifier::REVERSED)));
    }
}

fn shorten(src: &str) -> String {
    const MAX: usize = 60;
    if src.chars().count() <= MAX {
        return src.to_string();
    }
    let head: String = src.chars().take(MAX).collect();
    format!("{head}…")
}
