// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_document_json(sections: usize) -> String {
    let mut nodes = Vec::new();
    for section in 0..sections {
        nodes.push(format!(
            r#"{{"object":"block","type":"heading-two","nodes":[{{"object":"text","leaves":[{{"text":"Section {section}"}}]}}]}}"#
        ));
        nodes.push(
            r#"{"object":"block","type":"paragraph","nodes":[{"object":"text","leaves":[{"text":"Some plain text and "},{"text":"some bold","marks":[{"type":"bold"}]},{"text":" to finish."}]}]}"#
                .to_string(),
        );
        nodes.push(
            r#"{"object":"block","type":"bulleted-list","nodes":[{"object":"block","type":"list-item","nodes":[{"object":"text","leaves":[{"text":"first"}]}]},{"object":"block","type":"list-item","nodes":[{"object":"text","leaves":[{"text":"second"}]}]}]}"#
                .to_string(),
        );
    }
    format!(r#"{{"document":{{"nodes":[{}]}}}}"#, nodes.join(","))
}

/// Document with one paragraph per line, all in unmerged single-leaf texts
#[allow(dead_code)]
pub fn generate_fragmented_json(paragraphs: usize, texts_per_paragraph: usize) -> String {
    let texts: Vec<String> = (0..texts_per_paragraph)
        .map(|i| format!(r#"{{"object":"text","leaves":[{{"text":"t{i} "}}]}}"#))
        .collect();
    let paragraph = format!(
        r#"{{"object":"block","type":"paragraph","nodes":[{}]}}"#,
        texts.join(",")
    );
    let nodes = vec![paragraph; paragraphs];
    format!(r#"{{"document":{{"nodes":[{}]}}}}"#, nodes.join(","))
}
