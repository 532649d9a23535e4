//! Structured logging setup.
//!
//! Installs a `tracing` subscriber with an `EnvFilter` (so `RUST_LOG`
//! overrides the configured level) and either a plain or a JSON formatter.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_thread_names(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!(level, json, "Tracing initialized");
}

/// Span helpers shared by the sync and indexing paths.
pub mod spans {
    use tracing::{info_span, Span};

    /// Span covering one `sync` call of a repository.
    #[must_use]
    pub fn sync_span(repo: &str) -> Span {
        info_span!("sync", repo = %repo)
    }

    /// Span covering the (re-)indexing of one file.
    #[must_use]
    pub fn index_span(source: &str) -> Span {
        info_span!("index_file", source = %source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_can_be_entered() {
        let span = spans::sync_span("aqchat");
        let _guard = span.enter();
        let inner = spans::index_span("src/lib.rs");
        let _inner_guard = inner.enter();
    }
}
