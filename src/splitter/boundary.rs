//! Boundary model, detector trait and the extension lookup table.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::python::PythonBoundaryDetector;
use super::rust::RustBoundaryDetector;

/// Kind of syntactic unit a boundary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Function,
    Class,
    Struct,
    Enum,
    Trait,
    Impl,
}

impl BoundaryKind {
    /// Lowercase tag stored in chunk metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Trait => "trait",
            Self::Impl => "impl",
        }
    }

    /// Parse a stored tag.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "function" => Some(Self::Function),
            "class" => Some(Self::Class),
            "struct" => Some(Self::Struct),
            "enum" => Some(Self::Enum),
            "trait" => Some(Self::Trait),
            "impl" => Some(Self::Impl),
            _ => None,
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line range identified as one syntactic unit.
///
/// Lines are 0-indexed and both ends are inclusive. Boundaries from one
/// detector run may nest or overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub start_line: usize,
    pub end_line: usize,
    pub kind: BoundaryKind,
    /// Indentation of the declaration line, in characters.
    pub indent: usize,
}

/// Locates syntactic unit boundaries in one language's source text.
///
/// Detectors work on text alone. Input they cannot make sense of yields
/// fewer (or zero) boundaries, never an error.
pub trait BoundaryDetector: Send + Sync {
    /// Short language name used in logs.
    fn name(&self) -> &'static str;

    /// Boundaries in detection order.
    fn find_boundaries(&self, text: &str) -> Vec<Boundary>;

    /// Kinds this detector can report.
    fn supported_kinds(&self) -> &'static [BoundaryKind];
}

/// Maps file extensions (with leading dot) to detectors.
///
/// Lookups are case-insensitive. Build it once and share it read-only.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: HashMap<String, Arc<dyn BoundaryDetector>>,
}

impl DetectorRegistry {
    /// Create an empty registry; every file goes through the fallback splitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Python and Rust detectors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let python: Arc<dyn BoundaryDetector> = Arc::new(PythonBoundaryDetector::new());
        let rust: Arc<dyn BoundaryDetector> = Arc::new(RustBoundaryDetector::new());

        let mut registry = Self::new();
        registry.register(".py", Arc::clone(&python));
        registry.register(".pyi", python);
        registry.register(".rs", rust);
        registry
    }

    /// Map `extension` to `detector`, replacing any previous mapping.
    pub fn register(&mut self, extension: &str, detector: Arc<dyn BoundaryDetector>) {
        self.detectors.insert(extension.to_lowercase(), detector);
    }

    /// Detector for an extension such as `.rs`.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<&dyn BoundaryDetector> {
        self.detectors
            .get(&extension.to_lowercase())
            .map(|detector| detector.as_ref())
    }

    /// Detector for the extension of `path`.
    #[must_use]
    pub fn for_path(&self, path: &str) -> Option<&dyn BoundaryDetector> {
        extension_from_path(path).and_then(|ext| self.get(&ext))
    }

    /// Registered extensions, sorted.
    #[must_use]
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.detectors.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.extensions()
                    .into_iter()
                    .map(|ext| (ext, self.detectors[ext].name())),
            )
            .finish()
    }
}

/// Lowercased extension of the file name in `path`, including the dot.
///
/// Dot-files such as `.bashrc` have no extension.
#[must_use]
pub fn extension_from_path(path: &str) -> Option<String> {
    let file_name = Path::new(path).file_name()?.to_str()?;
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => Some(file_name[idx..].to_lowercase()),
        _ => None,
    }
}

/// Leading whitespace of `line`, counted in characters.
pub(crate) fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
