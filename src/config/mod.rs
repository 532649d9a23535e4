//! Configuration management for repochunk.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables (`REPOCHUNK_*`)
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{Config, Credentials, DEFAULT_INCLUDE_EXTENSIONS};
