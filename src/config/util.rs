//! Configuration utility functions.

use std::path::{Path, PathBuf};

use url::Url;

/// Resolve a push endpoint against the page it belongs to.
///
/// Mirrors how a browser resolves a relative event-source URL: a path is
/// joined onto the page's origin, an absolute URL is taken as is.
///
/// Returns `None` if the page URL is invalid or not http(s).
///
/// # Examples
/// ```ignore
/// resolve_endpoint("http://127.0.0.1:8000/abc", "/sse")        -> "http://127.0.0.1:8000/sse"
/// resolve_endpoint("http://host/game/", "/btlship/sse")        -> "http://host/btlship/sse"
/// resolve_endpoint("http://host/", "http://push.host/stream")  -> "http://push.host/stream"
/// resolve_endpoint("invalid", "/sse")                          -> None
/// ```
pub fn resolve_endpoint(page_url: &str, endpoint: &str) -> Option<Url> {
    let page = parse_http_url(page_url)?;
    let resolved = page.join(endpoint).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Parse a URL and accept it only if it is http(s).
pub fn parse_http_url(url_str: &str) -> Option<Url> {
    let parsed = Url::parse(url_str).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`
/// Returns the path to the config file if found
///
/// # Example
/// ```text
/// /home/user/game/static/js/  ← start
/// /home/user/game/livepush.toml ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_endpoint_path() {
        let url = resolve_endpoint("http://127.0.0.1:8000/abc", "/sse").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/sse");

        // Page path does not leak into an absolute-path endpoint
        let url = resolve_endpoint("http://host/game/", "/btlship/sse").unwrap();
        assert_eq!(url.as_str(), "http://host/btlship/sse");
    }

    #[test]
    fn test_resolve_endpoint_absolute() {
        let url = resolve_endpoint("http://host/", "https://push.host/stream").unwrap();
        assert_eq!(url.as_str(), "https://push.host/stream");
    }

    #[test]
    fn test_resolve_endpoint_rejects_bad_input() {
        assert!(resolve_endpoint("invalid-url", "/sse").is_none());
        assert!(resolve_endpoint("file:///tmp/page.html", "/sse").is_none());
        assert!(resolve_endpoint("http://host/", "ftp://host/sse").is_none());
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("static/js");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("livepush.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("livepush.toml")).unwrap();
        assert_eq!(found, dir.path().join("livepush.toml"));
    }

    #[test]
    fn test_find_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_file(dir.path(), Path::new("no-such-livepush.toml")).is_none());
    }
}
