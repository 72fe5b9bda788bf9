//! Static files under the serve root.
//!
//! Directories resolve to their `index.html`. Without one, `/` falls back
//! to an embedded page that loads the browser listener, so a bare
//! `livepush serve` still has a page to listen on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tiny_http::Request;

use super::server::send_bytes;
use crate::embed::serve::{INDEX_HTML, IndexVars};

/// Content types served from the root.
pub mod mime {
    use std::path::Path;

    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const SVG: &str = "image/svg+xml";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const ICO: &str = "image/x-icon";
    pub const WOFF2: &str = "font/woff2";
    pub const WASM: &str = "application/wasm";
    pub const OCTET_STREAM: &str = "application/octet-stream";

    /// Guess the content type from the file extension.
    pub fn from_path(path: &Path) -> &'static str {
        match path.extension().and_then(|e| e.to_str()) {
            Some("html" | "htm") => HTML,
            Some("txt") => PLAIN,
            Some("css") => CSS,
            Some("js" | "mjs") => JAVASCRIPT,
            Some("json") => JSON,
            Some("svg") => SVG,
            Some("png") => PNG,
            Some("jpg" | "jpeg") => JPEG,
            Some("gif") => GIF,
            Some("webp") => WEBP,
            Some("ico") => ICO,
            Some("woff2") => WOFF2,
            Some("wasm") => WASM,
            _ => OCTET_STREAM,
        }
    }
}

/// Serve `url` from `root`. Hands the request back when nothing matches.
pub fn respond(request: Request, url: &str, root: &Path, endpoint: &str) -> Result<Option<Request>> {
    if let Some(file) = resolve_path(url, root) {
        // tiny_http drops the body of HEAD responses itself
        let body = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
        send_bytes(request, 200, mime::from_path(&file), body)?;
        return Ok(None);
    }

    if normalize_url(url).is_empty() {
        let body = INDEX_HTML.render(&IndexVars {
            endpoint: endpoint.to_string(),
        });
        send_bytes(request, 200, mime::HTML, body.into_bytes())?;
        return Ok(None);
    }

    Ok(Some(request))
}

/// Resolve a URL path to a file under `root`, handling `index.html` for
/// directories. Anything escaping `root` resolves to nothing.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = root.join(&clean);

    // Symlinks may still point outside the root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Decode, drop the query string, trim slashes.
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_string()
}
