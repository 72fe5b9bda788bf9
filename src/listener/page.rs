//! Page host.
//!
//! The listener only needs two things from the page it lives in: a console
//! to write diagnostics to, and a way to ask for a reload. [`HttpPage`] is
//! the real host: its document lives at an http(s) URL and a reload fetches
//! it again.

use std::path::{Path, PathBuf};

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use thiserror::Error;
use url::Url;

/// The page a listener runs in.
pub trait Page {
    /// Write one diagnostic line to the page console.
    fn console(&mut self, line: &str);

    /// Request a reload of the current document. With `bypass_cache` the
    /// next load must not be served from any cache.
    fn reload(&mut self, bypass_cache: bool);
}

/// Failures while loading the page document.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch `{0}`")]
    Fetch(Url, #[source] reqwest::Error),

    #[error("`{0}` answered with status {1}")]
    Status(Url, u16),

    #[error("failed to write `{0}`")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Summary of one document load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub status: u16,
    pub bytes: usize,
    pub bypassed_cache: bool,
}

/// A page whose document is fetched over HTTP.
#[derive(Debug)]
pub struct HttpPage {
    url: Url,
    client: reqwest::Client,
    output: Option<PathBuf>,
    /// Reload requested by the listener, with its cache-bypass flag
    pending_reload: Option<bool>,
}

impl HttpPage {
    pub fn new(url: Url, output: Option<PathBuf>) -> Result<Self, PageError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(PageError::Client)?;
        Ok(Self {
            url,
            client,
            output,
            pending_reload: None,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Take the reload request left by the listener, if any.
    pub fn take_pending_reload(&mut self) -> Option<bool> {
        self.pending_reload.take()
    }

    /// Fetch the document. `bypass_cache` adds the no-cache request headers
    /// a forced reload sends.
    pub async fn navigate(&self, bypass_cache: bool) -> Result<LoadedDocument, PageError> {
        let mut request = self.client.get(self.url.clone());
        if bypass_cache {
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| PageError::Fetch(self.url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Status(self.url.clone(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PageError::Fetch(self.url.clone(), e))?;

        if let Some(path) = &self.output {
            write_document(path, &body)?;
        }

        Ok(LoadedDocument {
            status: status.as_u16(),
            bytes: body.len(),
            bypassed_cache: bypass_cache,
        })
    }
}

impl Page for HttpPage {
    fn console(&mut self, line: &str) {
        crate::log!("console"; "{}", line);
    }

    fn reload(&mut self, bypass_cache: bool) {
        crate::debug!("listen"; "reload requested (bypass cache: {})", bypass_cache);
        self.pending_reload = Some(bypass_cache);
    }
}

fn write_document(path: &Path, body: &[u8]) -> Result<(), PageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| PageError::Write(path.to_path_buf(), e))?;
    }
    std::fs::write(path, body).map_err(|e| PageError::Write(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> HttpPage {
        HttpPage::new(Url::parse("http://127.0.0.1:8000/").unwrap(), None).unwrap()
    }

    #[test]
    fn test_reload_is_recorded_once() {
        let mut page = page();
        assert_eq!(page.take_pending_reload(), None);

        page.reload(true);
        assert_eq!(page.take_pending_reload(), Some(true));
        assert_eq!(page.take_pending_reload(), None);
    }

    #[test]
    fn test_write_document_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages/index.html");

        write_document(&path, b"<p>hi</p>").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"<p>hi</p>");
    }

    #[test]
    fn test_page_error_display() {
        let url = Url::parse("http://127.0.0.1:8000/").unwrap();
        let err = PageError::Status(url, 503);
        assert_eq!(err.to_string(), "`http://127.0.0.1:8000/` answered with status 503");
    }
}
