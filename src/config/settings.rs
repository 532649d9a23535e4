//! Configuration settings and validation.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Extensions ingested when none are configured.
pub const DEFAULT_INCLUDE_EXTENSIONS: &[&str] = &[
    ".py", ".rs", ".md", ".rst", ".txt", ".json", ".toml", ".cfg", ".yaml", ".yml",
];

/// Username and personal access token used for HTTPS remotes.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Personal access token paired with `username`.
    pub token: String,
}

impl Credentials {
    /// Build credentials only when both parts are present and non-empty.
    #[must_use]
    pub fn from_parts(username: Option<String>, token: Option<String>) -> Option<Self> {
        match (username, token) {
            (Some(username), Some(token)) if !username.is_empty() && !token.is_empty() => {
                Some(Self { username, token })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Main configuration for repochunk.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding repository checkouts and chunk databases.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Maximum chunk size in characters.
    pub chunk_size: usize,

    /// Overlap between fallback chunks in characters.
    pub chunk_overlap: usize,

    /// Record each chunk's character offset in its source file.
    pub add_start_index: bool,

    /// File extensions (with leading dot) that are indexed.
    pub include_extensions: Vec<String>,

    /// Credentials injected into HTTPS remotes.
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            chunk_size: 800,
            chunk_overlap: 120,
            add_start_index: true,
            include_extensions: DEFAULT_INCLUDE_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
            credentials: None,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size cannot be 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if let Some(ext) = self
            .include_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(Error::config(format!(
                "invalid extension '{ext}', expected a leading dot such as '.py'"
            )));
        }

        Ok(())
    }

    /// Directory where repositories are cloned.
    #[must_use]
    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir.join("repos")
    }

    /// Path to the chunk database of one repository.
    #[must_use]
    pub fn database_path(&self, repo_key: &str) -> PathBuf {
        self.data_dir.join("index").join(format!("{repo_key}.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 120);
        assert!(config.include_extensions.iter().any(|e| e == ".rs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let config = Config {
            chunk_size: 0,
            chunk_overlap: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_validate_overlap_too_large() {
        let config = Config {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_validate_extension_without_dot() {
        let config = Config {
            include_extensions: vec![".py".to_string(), "rs".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'rs'"));
    }

    #[test]
    fn test_paths() {
        let config = Config {
            data_dir: PathBuf::from("/var/lib/repochunk"),
            ..Default::default()
        };
        assert_eq!(config.repos_dir(), PathBuf::from("/var/lib/repochunk/repos"));
        assert_eq!(
            config.database_path("aqchat-0123abcd"),
            PathBuf::from("/var/lib/repochunk/index/aqchat-0123abcd.db")
        );
    }

    #[test]
    fn test_credentials_require_both_parts() {
        assert!(Credentials::from_parts(Some("octocat".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("ghp_secret".into())).is_none());
        assert!(Credentials::from_parts(Some(String::new()), Some("ghp_secret".into())).is_none());

        let creds = Credentials::from_parts(Some("octocat".into()), Some("ghp_secret".into()));
        assert_eq!(creds.map(|c| c.username), Some("octocat".to_string()));
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials {
            username: "octocat".to_string(),
            token: "ghp_secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("octocat"));
        assert!(!debug.contains("ghp_secret"));

        let config = Config {
            credentials: Some(creds),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("ghp_secret"));
    }
}
