//! `[listen]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [listen]
//! page_url = "http://127.0.0.1:8000/"   # Page to load and reload
//! endpoint = "/sse"                     # Push endpoint, relative to the page
//! once = false                          # Stop after the first reload
//! output = "page.html"                  # Write each loaded document here
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default push endpoint path.
pub const DEFAULT_ENDPOINT: &str = "/sse";

/// Page listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// URL of the page being kept live.
    pub page_url: String,

    /// Push endpoint path, resolved against `page_url`.
    pub endpoint: String,

    /// Exit after the first reload instead of listening again.
    pub once: bool,

    /// Optional file that receives every freshly loaded document.
    pub output: Option<PathBuf>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            page_url: "http://127.0.0.1:8000/".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            once: false,
            output: None,
        }
    }
}
