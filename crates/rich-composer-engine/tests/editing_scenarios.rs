use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rich_composer_engine::editing::{Editor, Point, Selection};
use rich_composer_engine::input::{InputEvent, InputOutcome};
use rich_composer_engine::media::{FileRef, Transfer, TransferEvent, TransferKind};
use rich_composer_engine::model::{NodeKey, NodeTree};
use rich_composer_engine::schema::{MarkType, NodeType, Normalizer};
use rich_composer_engine::{DocumentValue, Rejection};
use rstest::rstest;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}/tests/fixtures/{name}.json",
        env!("CARGO_MANIFEST_DIR")
    ))
}

fn load(name: &str) -> Editor {
    Editor::open(&fixture_path(name)).unwrap()
}

fn texts(editor: &Editor) -> Vec<NodeKey> {
    editor.snapshot().tree().texts().iter().map(|n| n.key()).collect()
}

fn top_level_types(tree: &NodeTree) -> Vec<String> {
    tree.children(tree.root_key())
        .iter()
        .filter_map(|k| tree.get(*k)?.node_type().map(|t| t.to_string()))
        .collect()
}

fn images(tree: &NodeTree) -> Vec<String> {
    tree.leaf_blocks()
        .into_iter()
        .filter(|b| b.has_type(&NodeType::Image))
        .filter_map(|b| b.data()?.get("src")?.as_str().map(str::to_string))
        .collect()
}

fn last_child_is_paragraph(tree: &NodeTree) -> bool {
    tree.children(tree.root_key())
        .last()
        .and_then(|k| tree.get(*k))
        .is_some_and(|n| n.has_type(&NodeType::Paragraph))
}

fn drop_at(target: Selection, transfer: Transfer) -> InputEvent {
    InputEvent::Transfer(TransferEvent {
        kind: TransferKind::Drop,
        target: Some(target),
        transfer,
    })
}

#[test]
fn scenario_a_mark_toggle_without_selection_is_refused() {
    let mut editor = load("empty_paragraph");
    editor.blur();
    let before = editor.value();

    let result = editor.handle(InputEvent::MarkButton(MarkType::Bold));
    assert_eq!(result, Err(Rejection::NoSelection));
    assert_eq!(editor.value(), before);
}

#[test]
fn scenario_a_mark_toggle_on_empty_caret_only_stores_the_mark() {
    let mut editor = load("empty_paragraph");
    let before = editor.snapshot().tree().outline();

    editor.toggle_mark(MarkType::Bold).unwrap();
    assert_eq!(editor.snapshot().tree().outline(), before);
    assert!(editor.mark_button_active(&MarkType::Bold));

    editor.insert_text("hi").unwrap();
    insta::assert_snapshot!(editor.snapshot().tree().outline(), @r#"
document
  paragraph
    "hi" [bold]
"#);
}

#[rstest]
#[case::caret(false)]
#[case::whole_block(true)]
fn scenario_b_bulleted_list_twice_returns_to_paragraph(#[case] whole_block: bool) {
    let mut editor = load("mixed_blocks");
    let paragraph = editor.snapshot().tree().children(editor.snapshot().tree().root_key())[1];
    let selection = if whole_block {
        Selection::covering(editor.snapshot().tree(), paragraph).unwrap()
    } else {
        Selection::collapsed(Point::new(texts(&editor)[1], 2))
    };
    editor.select(selection).unwrap();

    editor.toggle_block(NodeType::BulletedList).unwrap();
    assert_eq!(
        top_level_types(editor.snapshot().tree()),
        vec!["heading-one", "bulleted-list", "block-quote", "paragraph"]
    );
    editor.toggle_block(NodeType::BulletedList).unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "paragraph", "block-quote", "paragraph"]
    );
    assert_eq!(tree.text_of(tree.children(tree.root_key())[1]), "Some rich text.");
}

#[test]
fn scenario_c_typed_image_url_is_inserted_at_the_selection() {
    let mut editor = load("mixed_blocks");
    let last = *texts(&editor).last().unwrap();
    editor.select(Selection::collapsed(Point::new(last, 9))).unwrap();

    editor
        .handle(InputEvent::ImagePrompt(Some("http://x.com/a.png".into())))
        .unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(images(tree), vec!["http://x.com/a.png"]);
    assert!(last_child_is_paragraph(tree));
    insta::assert_snapshot!(tree.outline(), @r#"
document
  heading-one
    "Welcome"
  paragraph
    "Some "
    "rich" [bold]
    " text."
  block-quote
    "A wise quote."
  paragraph
    "Last line"
  image src=http://x.com/a.png
    ""
  paragraph
    ""
"#);
}

#[test]
fn scenario_d_only_image_files_are_inserted_from_a_drop() {
    let mut editor = load("mixed_blocks");
    let heading_end = Selection::collapsed(Point::new(texts(&editor)[0], 7));
    let version = editor.snapshot().version();

    let text_file = drop_at(
        heading_end.clone(),
        Transfer::Files(vec![FileRef::new("notes.txt", "text/plain")]),
    );
    assert_eq!(editor.handle(text_file), Err(Rejection::NoImageFiles));
    assert_eq!(editor.snapshot().version(), version);

    let image_file = drop_at(
        heading_end,
        Transfer::Files(vec![FileRef::new("a.png", "image/png")]),
    );
    let Ok(InputOutcome::Reads(requests)) = editor.handle(image_file) else {
        panic!("expected one read request");
    };
    assert_eq!(requests.len(), 1);
    assert_eq!(editor.snapshot().version(), version);

    editor
        .handle(InputEvent::ReadCompleted {
            ticket: requests[0].ticket,
            result: Ok(vec![0x89, b'P', b'N', b'G']),
        })
        .unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(images(tree), vec!["data:image/png;base64,iVBORw=="]);
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "image", "paragraph", "block-quote", "paragraph"]
    );
}

#[test]
fn scenario_e_text_drop_needs_an_image_url() {
    let mut editor = load("mixed_blocks");
    let quote_start = Selection::collapsed(Point::new(texts(&editor)[4], 0));
    let version = editor.snapshot().version();

    let junk = drop_at(quote_start.clone(), Transfer::Text("not a url".into()));
    assert!(matches!(editor.handle(junk), Err(Rejection::NotAUrl(_))));
    assert_eq!(editor.snapshot().version(), version);

    let url = drop_at(quote_start, Transfer::Text("http://x.com/a.jpg".into()));
    assert!(matches!(editor.handle(url), Ok(InputOutcome::Applied(_))));

    let tree = editor.snapshot().tree();
    assert_eq!(images(tree), vec!["http://x.com/a.jpg"]);
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "paragraph", "image", "block-quote", "paragraph"]
    );
}

#[test]
fn reads_complete_in_completion_order_against_the_latest_snapshot() {
    let mut editor = load("mixed_blocks");
    let quote_start = Selection::collapsed(Point::new(texts(&editor)[4], 0));
    let Ok(InputOutcome::Reads(requests)) = editor.handle(drop_at(
        quote_start,
        Transfer::Files(vec![
            FileRef::new("first.png", "image/png"),
            FileRef::new("second.gif", "image/gif"),
        ]),
    )) else {
        panic!("expected reads");
    };

    // typing while the reads are pending
    editor.insert_text("Hey ").unwrap();

    editor.complete_read(requests[1].ticket, Ok(b"2".to_vec())).unwrap();
    editor.complete_read(requests[0].ticket, Ok(b"1".to_vec())).unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(tree.text_of(tree.children(tree.root_key())[0]), "Hey Welcome");
    assert_eq!(
        images(tree),
        vec!["data:image/gif;base64,Mg==", "data:image/png;base64,MQ=="]
    );
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "paragraph", "image", "image", "block-quote", "paragraph"]
    );
}

fn drop_png_at_heading_end(editor: &mut Editor) -> InputEvent {
    let heading_end = Selection::collapsed(Point::new(texts(editor)[0], 7));
    let Ok(InputOutcome::Reads(requests)) = editor.handle(drop_at(
        heading_end,
        Transfer::Files(vec![FileRef::new("a.png", "image/png")]),
    )) else {
        panic!("expected a read");
    };
    InputEvent::ReadCompleted {
        ticket: requests[0].ticket,
        result: Ok(b"1".to_vec()),
    }
}

#[test]
fn drop_target_survives_marking_part_of_its_text() {
    let mut editor = load("mixed_blocks");
    let completion = drop_png_at_heading_end(&mut editor);

    let heading = texts(&editor)[0];
    editor
        .select(Selection::new(Point::new(heading, 0), Point::new(heading, 3)))
        .unwrap();
    editor.toggle_mark(MarkType::Bold).unwrap();
    editor.handle(completion).unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "image", "paragraph", "block-quote", "paragraph"]
    );
    assert_eq!(tree.text_of(tree.children(tree.root_key())[0]), "Welcome");
}

#[test]
fn drop_target_shifts_with_text_typed_before_it() {
    let mut editor = load("mixed_blocks");
    let completion = drop_png_at_heading_end(&mut editor);

    // the caret starts at the beginning of the heading
    editor.insert_text("Hey ").unwrap();
    editor.handle(completion).unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "image", "paragraph", "block-quote", "paragraph"]
    );
    assert_eq!(tree.text_of(tree.children(tree.root_key())[0]), "Hey Welcome");
}

#[test]
fn drop_target_follows_its_text_into_a_split_block() {
    let mut editor = load("mixed_blocks");
    let completion = drop_png_at_heading_end(&mut editor);

    let heading = texts(&editor)[0];
    editor
        .select(Selection::collapsed(Point::new(heading, 3)))
        .unwrap();
    editor.split_block().unwrap();
    editor.handle(completion).unwrap();

    let tree = editor.snapshot().tree();
    let blocks = tree.children(tree.root_key());
    assert_eq!(
        top_level_types(tree),
        vec!["heading-one", "heading-one", "image", "paragraph", "block-quote", "paragraph"]
    );
    assert_eq!(tree.text_of(blocks[0]), "Wel");
    assert_eq!(tree.text_of(blocks[1]), "come");
}

#[test]
fn read_failures_are_reported_without_touching_the_document() {
    let mut editor = load("mixed_blocks");
    editor.handle(InputEvent::FileChosen(FileRef::new("a.png", "image/png"))).unwrap();
    let Ok(InputOutcome::Reads(requests)) = editor.handle(InputEvent::UploadSubmitted) else {
        panic!("expected a read");
    };
    let before = editor.value();

    let result = editor.complete_read(requests[0].ticket, Err("disk on fire".into()));
    assert!(matches!(result, Err(Rejection::ReadFailed { .. })));
    assert_eq!(editor.value(), before);
    assert_eq!(editor.media().pending_count(), 0);
}

#[rstest]
#[case("empty_paragraph")]
#[case("mixed_blocks")]
#[case("list_of_three")]
fn normalization_is_idempotent(#[case] name: &str) {
    let json = std::fs::read_to_string(fixture_path(name)).unwrap();
    let tree = DocumentValue::from_json(&json).unwrap().to_tree();
    let normalizer = Normalizer::new();

    let once = normalizer.normalize(tree);
    let twice = normalizer.normalize(once.clone());
    assert_eq!(once, twice);
    assert!(last_child_is_paragraph(&once));
}

#[test]
fn trailing_paragraph_survives_every_block_toggle() {
    let mut editor = load("mixed_blocks");
    let all = Selection::covering(editor.snapshot().tree(), editor.snapshot().tree().root_key())
        .unwrap();
    editor.select(all).unwrap();

    for node_type in [
        NodeType::HeadingOne,
        NodeType::BulletedList,
        NodeType::BlockQuote,
        NodeType::NumberedList,
        NodeType::BulletedList,
        NodeType::HeadingTwo,
        NodeType::NumberedList,
        NodeType::NumberedList,
    ] {
        editor.toggle_block(node_type.clone()).unwrap();
        assert!(
            last_child_is_paragraph(editor.snapshot().tree()),
            "after toggling {node_type}"
        );
    }
}

#[test]
fn mark_toggled_on_then_off_restores_the_original_marks() {
    let mut editor = load("mixed_blocks");
    let before = editor.snapshot().tree().outline();
    let t = texts(&editor);
    editor
        .select(Selection::new(Point::new(t[1], 2), Point::new(t[3], 2)))
        .unwrap();

    editor.toggle_mark(MarkType::Italic).unwrap();
    insta::assert_snapshot!(editor.snapshot().tree().outline(), @r#"
document
  heading-one
    "Welcome"
  paragraph
    "So"
    "me " [italic]
    "rich" [bold,italic]
    " t" [italic]
    "ext."
  block-quote
    "A wise quote."
  paragraph
    "Last line"
"#);

    editor.toggle_mark(MarkType::Italic).unwrap();
    assert_eq!(editor.snapshot().tree().outline(), before);
}

#[test]
fn entering_then_leaving_a_list_leaves_plain_paragraphs() {
    let mut editor = load("mixed_blocks");
    let t = texts(&editor);
    editor
        .select(Selection::new(Point::new(t[0], 1), Point::new(t[4], 1)))
        .unwrap();

    editor.toggle_block(NodeType::NumberedList).unwrap();
    assert_eq!(
        top_level_types(editor.snapshot().tree()),
        vec!["numbered-list", "paragraph"]
    );
    editor.toggle_block(NodeType::NumberedList).unwrap();

    let tree = editor.snapshot().tree();
    assert_eq!(
        top_level_types(tree),
        vec!["paragraph", "paragraph", "paragraph", "paragraph"]
    );
    assert!(tree.leaf_blocks().iter().all(|b| {
        tree.closest(b.key(), |p| p.node_type().is_some_and(NodeType::is_list))
            .is_none()
    }));
}

#[test]
fn leaving_a_list_from_a_middle_item_splits_the_list() {
    let mut editor = load("list_of_three");
    let two = texts(&editor)[1];
    editor.select(Selection::collapsed(Point::new(two, 1))).unwrap();

    editor.toggle_block(NodeType::BulletedList).unwrap();
    insta::assert_snapshot!(editor.snapshot().tree().outline(), @r#"
document
  bulleted-list
    list-item
      "one"
  paragraph
    "two"
  bulleted-list
    list-item
      "three"
  paragraph
    ""
"#);
}

#[test]
fn typing_splitting_and_deleting() {
    let mut editor = load("empty_paragraph");
    editor.insert_text("Hello world").unwrap();
    let caret = editor.snapshot().selection().unwrap().anchor;
    editor
        .select(Selection::collapsed(Point::new(caret.key, 5)))
        .unwrap();
    editor.split_block().unwrap();
    assert_eq!(
        top_level_types(editor.snapshot().tree()),
        vec!["paragraph", "paragraph"]
    );

    editor.delete_backward().unwrap();
    let tree = editor.snapshot().tree();
    assert_eq!(tree.leaf_blocks().len(), 1);
    assert_eq!(tree.text_of(tree.root_key()), "Hello world");

    editor.delete_backward().unwrap();
    let tree = editor.snapshot().tree();
    assert_eq!(tree.text_of(tree.root_key()), "Hell world");
}

#[test]
fn backspace_after_an_image_removes_it() {
    let mut editor = load("mixed_blocks");
    let last = *texts(&editor).last().unwrap();
    editor.select(Selection::collapsed(Point::new(last, 0))).unwrap();
    editor.insert_image("http://x.com/a.png").unwrap();
    assert_eq!(images(editor.snapshot().tree()).len(), 1);

    // the caret sits in the image; backspace removes the whole block
    editor.delete_backward().unwrap();
    assert!(images(editor.snapshot().tree()).is_empty());
}

#[test]
fn value_round_trips_through_json() {
    let editor = load("mixed_blocks");
    let json = editor.value().to_json_pretty().unwrap();
    let reloaded = Editor::from_json(&json).unwrap();
    assert_eq!(
        reloaded.snapshot().tree().outline(),
        editor.snapshot().tree().outline()
    );
}
