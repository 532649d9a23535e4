//! Boundary-aware splitting of whole files into chunks.

use text_splitter::{Characters, ChunkConfig, TextSplitter};

use super::boundary::{BoundaryDetector, BoundaryKind, DetectorRegistry};
use super::document::{ChunkMetadata, Document, SourceText};
use crate::config::Config;
use crate::{Error, Result};

/// Splitter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between fallback chunks in characters.
    pub chunk_overlap: usize,
    /// Record each chunk's character offset in its file.
    pub add_start_index: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
            add_start_index: false,
        }
    }
}

impl From<&Config> for SplitterConfig {
    fn from(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            add_start_index: config.add_start_index,
        }
    }
}

/// One candidate chunk and the boundary it was cut from.
type Piece = (String, Option<BoundaryKind>);

/// Splits files along detected syntactic boundaries.
///
/// Files without a detector go through a recursive text splitter
/// (paragraphs, then lines, words and characters). Stateless after
/// construction; share one instance across threads.
pub struct BoundaryAwareSplitter {
    config: SplitterConfig,
    fallback: TextSplitter<Characters>,
}

impl BoundaryAwareSplitter {
    /// Create a splitter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `chunk_size` is 0 or the overlap is
    /// not smaller than the chunk size.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::config("chunk_size cannot be 0"));
        }

        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| Error::config(format!("invalid chunk_overlap: {e}")))?
            .with_trim(true);

        Ok(Self {
            config,
            fallback: TextSplitter::new(chunk_config),
        })
    }

    /// Splitter configuration.
    #[must_use]
    pub const fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split `text` into chunks, using `detector` when one is given.
    #[must_use]
    pub fn split_text(&self, text: &str, detector: Option<&dyn BoundaryDetector>) -> Vec<String> {
        self.split_pieces(text, detector)
            .into_iter()
            .map(|(content, _)| content)
            .collect()
    }

    /// Split several files, choosing each file's detector by its extension.
    #[must_use]
    pub fn create_documents(
        &self,
        files: &[SourceText<'_>],
        registry: &DetectorRegistry,
    ) -> Vec<Document> {
        files
            .iter()
            .flat_map(|file| self.split_file(file.source, file.text, registry))
            .collect()
    }

    /// Split one file into documents.
    #[must_use]
    pub fn split_file(&self, source: &str, text: &str, registry: &DetectorRegistry) -> Vec<Document> {
        let detector = registry.for_path(source);
        let pieces = self.split_pieces(text, detector);
        let total_chunks = pieces.len();
        let boundary_types = detector.map(|d| d.supported_kinds().to_vec());

        tracing::debug!(
            source,
            detector = detector.map_or("fallback", |d| d.name()),
            chunks = total_chunks,
            "Split file"
        );

        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (content, boundary_kind))| {
                let start_index = self
                    .config
                    .add_start_index
                    .then(|| char_offset(text, &content))
                    .flatten();

                Document {
                    metadata: ChunkMetadata {
                        source: source.to_string(),
                        chunk_index,
                        total_chunks,
                        boundary_types: boundary_types.clone(),
                        boundary_kind,
                        start_index,
                    },
                    content,
                }
            })
            .collect()
    }

    fn split_pieces(&self, text: &str, detector: Option<&dyn BoundaryDetector>) -> Vec<Piece> {
        let pieces = match detector {
            Some(detector) => self.split_structured(text, detector),
            None => self
                .fallback
                .chunks(text)
                .map(|chunk| (chunk.to_string(), None))
                .collect(),
        };

        pieces
            .into_iter()
            .filter(|(content, _)| !content.trim().is_empty())
            .collect()
    }

    /// Walk boundaries in start order, emitting the gap before each one, the
    /// boundary itself, and the tail after the last one.
    ///
    /// The cursor never moves backwards, so text after a nested boundary but
    /// inside its parent is not emitted a second time as a gap.
    fn split_structured(&self, text: &str, detector: &dyn BoundaryDetector) -> Vec<Piece> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut boundaries = detector.find_boundaries(text);
        boundaries.sort_by_key(|b| b.start_line);

        let mut pieces = Vec::new();
        let mut cursor = 0;

        for boundary in &boundaries {
            if boundary.start_line >= lines.len() || boundary.end_line < boundary.start_line {
                continue;
            }
            let end = boundary.end_line.min(lines.len() - 1);

            if boundary.start_line > cursor {
                self.push_piece(&lines[cursor..boundary.start_line], None, &mut pieces);
            }
            self.push_piece(&lines[boundary.start_line..=end], Some(boundary.kind), &mut pieces);

            cursor = cursor.max(end + 1);
        }

        if cursor < lines.len() {
            self.push_piece(&lines[cursor..], None, &mut pieces);
        }

        pieces
    }

    fn push_piece(&self, lines: &[&str], kind: Option<BoundaryKind>, pieces: &mut Vec<Piece>) {
        let text = lines.join("\n");
        if text.trim().is_empty() {
            return;
        }

        if text.chars().count() <= self.config.chunk_size {
            pieces.push((text, kind));
            return;
        }

        pieces.extend(
            pack_lines(lines, self.config.chunk_size)
                .into_iter()
                .map(|chunk| (chunk, kind)),
        );
    }
}

/// Greedily pack whole lines into chunks of at most `limit` characters.
///
/// A single line longer than `limit` becomes its own chunk.
fn pack_lines(lines: &[&str], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0;

    for &line in lines {
        let line_size = line.chars().count() + 1;

        if current_size + line_size > limit && !current.is_empty() {
            chunks.push(current.join("\n"));
            current.clear();
            current_size = 0;
        }

        current.push(line);
        current_size += line_size;
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }

    chunks
}

/// Character offset of the first occurrence of `chunk` in `text`.
fn char_offset(text: &str, chunk: &str) -> Option<usize> {
    text.find(chunk).map(|byte| text[..byte].chars().count())
}
