//! repochunk
//!
//! Keeps a boundary-aware chunk index of a remote git repository in step
//! with upstream: the checkout is fast-forwarded, file-level changes are
//! reported to callbacks, and changed files are re-split along function,
//! class and item boundaries.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod observability;
pub mod repo;
pub mod splitter;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
