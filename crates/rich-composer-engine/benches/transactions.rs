use criterion::{Criterion, criterion_group, criterion_main};
use rich_composer_engine::editing::{Editor, Selection};
use rich_composer_engine::schema::{MarkType, NodeType, Normalizer};
use rich_composer_engine::DocumentValue;
mod common;

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    group.sample_size(10);

    let normalizer = Normalizer::new();
    let structured = DocumentValue::from_json(&common::generate_document_json(200)).unwrap();
    let fragmented = DocumentValue::from_json(&common::generate_fragmented_json(100, 20)).unwrap();

    group.bench_function("structured_document", |b| {
        b.iter(|| {
            let tree = normalizer.normalize(std::hint::black_box(structured.to_tree()));
            std::hint::black_box(tree);
        });
    });

    group.bench_function("merge_fragmented_texts", |b| {
        b.iter(|| {
            let tree = normalizer.normalize(std::hint::black_box(fragmented.to_tree()));
            std::hint::black_box(tree);
        });
    });

    group.finish();
}

fn bench_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(10);

    let value = DocumentValue::from_json(&common::generate_document_json(100)).unwrap();
    let select_all = |value: &DocumentValue| {
        let mut editor = Editor::from_value(value);
        let tree = editor.snapshot().tree();
        let everything = Selection::covering(tree, tree.root_key()).unwrap();
        editor.select(everything).unwrap();
        editor
    };

    group.bench_function("toggle_mark_whole_document", |b| {
        b.iter(|| {
            let mut e = select_all(&value);
            let patch = e.toggle_mark(std::hint::black_box(MarkType::Italic));
            std::hint::black_box(patch).unwrap();
        });
    });

    group.bench_function("toggle_list_whole_document", |b| {
        b.iter(|| {
            let mut e = select_all(&value);
            let patch = e.toggle_block(std::hint::black_box(NodeType::NumberedList));
            std::hint::black_box(patch).unwrap();
        });
    });

    group.bench_function("insert_text", |b| {
        let mut e = Editor::from_value(&value);
        b.iter(|| {
            let patch = e.insert_text(std::hint::black_box("test"));
            std::hint::black_box(patch).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_normalization, bench_commands);
criterion_main!(benches);
