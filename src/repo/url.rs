//! Repository URL parsing and credential injection.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::Credentials;
use crate::error::RepositoryError;
use crate::Result;

/// Hosts whose URLs are accepted as repository locations.
pub const KNOWN_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

/// `[user@]host:owner/repo[.git]` and bare `host/owner/repo[.git]`.
static SCP_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[^@/]+@)?(?P<host>github\.com|gitlab\.com|bitbucket\.org)[:/](?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$",
    )
    .expect("scp-like repository pattern is valid")
});

/// Extract the repository's short name from its URL.
///
/// Accepts HTTPS/HTTP/SSH URLs on a known host, the SCP-like form
/// `git@github.com:owner/repo.git`, the bare `github.com/owner/repo` form,
/// and `file://` URLs pointing at a local mirror.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidUrl`] when the host is not recognized or
/// fewer than two path segments are present.
pub fn extract_repo_name(url: &str) -> Result<String> {
    let url = url.trim();

    if let Some(caps) = SCP_LIKE.captures(url) {
        return Ok(caps["repo"].to_string());
    }

    let parsed =
        Url::parse(url).map_err(|e| RepositoryError::invalid_url(url, e.to_string()))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if parsed.scheme() == "file" {
        return segments
            .last()
            .map(|last| strip_git_suffix(last).to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RepositoryError::invalid_url(url, "empty file path").into());
    }

    let host = parsed.host_str().unwrap_or_default();
    if !KNOWN_HOSTS.contains(&host) {
        return Err(RepositoryError::invalid_url(
            url,
            format!("unrecognized host '{host}'"),
        )
        .into());
    }

    match segments.get(1) {
        Some(repo) if !strip_git_suffix(repo).is_empty() => Ok(strip_git_suffix(repo).to_string()),
        _ => Err(RepositoryError::invalid_url(url, "expected <owner>/<repository> in path").into()),
    }
}

/// Stable identifier of a remote: its name plus a short digest of the URL.
///
/// Two remotes with the same short name (forks, mirrors) get distinct keys,
/// which keeps their checkouts and chunk databases apart.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidUrl`] if the name cannot be extracted.
pub fn repo_key(url: &str) -> Result<String> {
    let name = extract_repo_name(url)?;
    let digest = blake3::hash(url.trim().as_bytes()).to_hex();
    Ok(format!("{name}-{}", &digest[..8]))
}

fn strip_git_suffix(segment: &str) -> &str {
    segment.strip_suffix(".git").unwrap_or(segment)
}

/// Embed `username:token@` into an HTTP(S) URL.
///
/// The URL is returned unchanged when no credentials are given, when the
/// scheme is not http/https (SSH relies on external key auth), or when the
/// URL already carries credentials.
#[must_use]
pub fn with_credentials(url: &str, credentials: Option<&Credentials>) -> String {
    let Some(credentials) = credentials else {
        return url.to_string();
    };

    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return url.to_string();
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return url.to_string();
    }

    if parsed.set_username(&credentials.username).is_err()
        || parsed.set_password(Some(&credentials.token)).is_err()
    {
        return url.to_string();
    }

    parsed.to_string()
}

/// Replace any password embedded in `url` so it can be logged.
#[must_use]
pub fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
