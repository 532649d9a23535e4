//! Language-aware text splitting.
//!
//! This module provides:
//! - Boundary detectors for Python (indentation) and Rust (brace matching)
//! - An extension-keyed detector registry
//! - A splitter that cuts files along detected boundaries and falls back to
//!   recursive text splitting for everything else

mod boundary;
mod chunker;
mod document;
mod python;
mod rust;

pub use boundary::{extension_from_path, Boundary, BoundaryDetector, BoundaryKind, DetectorRegistry};
pub use chunker::{BoundaryAwareSplitter, SplitterConfig};
pub use document::{ChunkMetadata, Document, SourceText};
pub use python::PythonBoundaryDetector;
pub use rust::RustBoundaryDetector;
