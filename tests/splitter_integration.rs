//! Integration tests for boundary-aware splitting of real source files.

use repochunk::splitter::{
    BoundaryAwareSplitter, BoundaryKind, DetectorRegistry, Document, SourceText, SplitterConfig,
};

const SAMPLE_PY: &str = include_str!("data/sample_py.py");
const SAMPLE_RS: &str = include_str!("data/sample_rs.rs");

fn split(source: &str, text: &str) -> Vec<Document> {
    let splitter = BoundaryAwareSplitter::new(SplitterConfig {
        add_start_index: true,
        ..SplitterConfig::default()
    })
    .unwrap();
    splitter.split_file(source, text, &DetectorRegistry::with_defaults())
}

fn kinds(docs: &[Document]) -> Vec<Option<BoundaryKind>> {
    docs.iter().map(|d| d.metadata.boundary_kind).collect()
}

/// Every chunk must be found verbatim at its recorded offset.
fn assert_offsets(text: &str, docs: &[Document]) {
    for doc in docs {
        let offset = doc.metadata.start_index.expect("start index recorded");
        let at: String = text.chars().skip(offset).take(doc.content.chars().count()).collect();
        assert_eq!(at, doc.content, "chunk {} not at offset {offset}", doc.metadata.chunk_index);
    }
}

#[test]
fn test_python_sample_boundaries() {
    use BoundaryKind::{Class, Function};

    let docs = split("tasks/sample_py.py", SAMPLE_PY);

    let mut expected = vec![None, Some(Function), Some(Function), Some(Class)];
    expected.extend([Some(Function); 7]);
    expected.push(Some(Class));
    expected.extend([Some(Function); 5]);
    expected.push(None);
    assert_eq!(kinds(&docs), expected);

    assert!(docs[0].content.starts_with("import datetime"));
    assert!(docs[1].content.starts_with("def generate_task_id() -> str:"));
    assert!(docs[3].content.starts_with("class Task:"));
    assert!(docs[3].content.contains("def __str__(self) -> str:"));
    assert!(!docs[3].content.contains("class TaskManager"));
    assert!(docs[11].content.starts_with("class TaskManager:"));
    assert!(docs[17].content.starts_with("# Run if script is executed directly"));

    // Decorators stay outside method chunks and never form chunks of their own.
    assert!(docs.iter().all(|d| !d.content.trim_start().starts_with('@')));

    assert!(docs.iter().all(|d| d.metadata.total_chunks == docs.len()));
    assert_eq!(
        docs[0].metadata.boundary_types.as_deref(),
        Some(&[Class, Function][..])
    );
    assert_offsets(SAMPLE_PY, &docs);
}

#[test]
fn test_rust_sample_boundaries() {
    use BoundaryKind::{Enum, Function, Impl, Struct, Trait};

    let docs = split("src/sample_rs.rs", SAMPLE_RS);

    assert_eq!(
        kinds(&docs),
        vec![
            None,
            Some(Function),
            Some(Enum),
            Some(Struct),
            Some(Impl),
            Some(Function),
            Some(Trait),
            Some(Function),
            Some(Struct),
            Some(Impl),
            Some(Function),
            Some(Impl),
            Some(Function),
            Some(Function),
            Some(Function),
        ]
    );

    assert!(docs[0].content.starts_with("//! @brief A simple logging system"));
    assert!(docs[0].content.contains("use std::time::{SystemTime, UNIX_EPOCH};"));

    // Doc comments and attributes belong to the item below them.
    assert!(docs[1].content.starts_with("/// @brief Get the current Unix timestamp"));
    assert!(docs[2].content.starts_with("/// @brief Levels of logging severity.\n#[derive"));

    // Braces inside the format string do not end the impl early.
    assert!(docs[4].content.starts_with("impl fmt::Display for LogMessage {"));
    assert!(docs[4].content.trim_end().ends_with('}'));
    assert!(docs[4].content.contains("self.content"));

    // A trait method declaration ends on its semicolon.
    assert_eq!(
        docs[7].content,
        "    /// @brief Handle a log message.\n    fn log(&self, message: &LogMessage);"
    );
    assert_eq!(
        docs[8].content,
        "/// @brief A backend that logs messages to stdout.\nstruct ConsoleLogger;"
    );

    assert!(docs[14].content.starts_with("/// @brief Entry point for the program.\nfn main() {"));
    assert_offsets(SAMPLE_RS, &docs);
}

#[test]
fn test_small_chunk_size_keeps_whole_lines() {
    let splitter = BoundaryAwareSplitter::new(SplitterConfig {
        chunk_size: 200,
        chunk_overlap: 20,
        add_start_index: false,
    })
    .unwrap();
    let docs = splitter.split_file("tasks.py", SAMPLE_PY, &DetectorRegistry::with_defaults());

    let lines: Vec<&str> = SAMPLE_PY.lines().collect();
    for doc in &docs {
        assert!(doc.metadata.start_index.is_none());
        for line in doc.content.lines() {
            if line.chars().count() < 200 {
                assert!(lines.contains(&line), "line was cut: {line:?}");
            }
        }
    }
}

#[test]
fn test_create_documents_mixes_detectors() {
    let splitter = BoundaryAwareSplitter::new(SplitterConfig::default()).unwrap();
    let files = [
        SourceText::new("a/sample_rs.rs", SAMPLE_RS),
        SourceText::new("README.md", "# Title\n\nSome prose about the project."),
        SourceText::new("b/sample_py.PY", SAMPLE_PY),
    ];
    let docs = splitter.create_documents(&files, &DetectorRegistry::with_defaults());

    let readme: Vec<&Document> = docs.iter().filter(|d| d.metadata.source == "README.md").collect();
    assert_eq!(readme.len(), 1);
    assert_eq!(readme[0].metadata.boundary_types, None);

    let py = docs
        .iter()
        .filter(|d| d.metadata.source == "b/sample_py.PY")
        .count();
    assert_eq!(py, 18);
    assert_eq!(docs.first().map(|d| d.metadata.source.as_str()), Some("a/sample_rs.rs"));
}

#[test]
fn test_documents_serialize_without_absent_fields() {
    let splitter = BoundaryAwareSplitter::new(SplitterConfig::default()).unwrap();
    let docs = splitter.split_file("notes.txt", "hello", &DetectorRegistry::with_defaults());

    let json = serde_json::to_value(&docs[0]).unwrap();
    assert_eq!(json["content"], "hello");
    assert_eq!(json["metadata"]["source"], "notes.txt");
    assert!(json["metadata"].get("boundary_kind").is_none());
    assert!(json["metadata"].get("start_index").is_none());
}
