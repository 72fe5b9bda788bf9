//! Listen session.
//!
//! Drives successive page lifetimes against one page URL:
//!
//! ```text
//! load page --> listener lifetime --"refresh"--> reload page --+
//!                   ^                                          |
//!                   +------------------------------------------+
//! ```
//!
//! Every lifetime gets a fresh [`PushListener`], the same way a reloaded
//! document runs its listener script again.

use anyhow::{Context, Result};
use url::Url;

use crate::config::{ListenConfig, parse_http_url, resolve_endpoint};
use crate::listener::{HttpPage, PushListener, SseTransport};
use crate::logger::{status_error, status_success};
use crate::{core, debug, log};

/// How a page lifetime ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifetime {
    /// The listener asked for a reload.
    Reload { bypass_cache: bool },
    /// Ctrl+C.
    Stopped,
}

/// Run page lifetimes until shutdown, or after one reload with `once`.
pub async fn run(config: &ListenConfig) -> Result<()> {
    let page_url = parse_http_url(&config.page_url)
        .with_context(|| format!("`{}` is not an http(s) URL", config.page_url))?;
    let endpoint = resolve_endpoint(&config.page_url, &config.endpoint).with_context(|| {
        format!(
            "cannot resolve endpoint `{}` against `{}`",
            config.endpoint, config.page_url
        )
    })?;

    let mut page = HttpPage::new(page_url, config.output.clone())?;
    let mut transport = SseTransport::new()?;

    let doc = page.navigate(false).await?;
    log!("listen"; "{} ({} bytes)", page.url(), doc.bytes);
    log!("listen"; "push endpoint {}", endpoint);

    loop {
        let (t, p, lifetime) = lifetime(endpoint.clone(), transport, page).await;
        transport = t;
        page = p;

        let Lifetime::Reload { bypass_cache } = lifetime else {
            debug!("listen"; "session stopped");
            return Ok(());
        };

        match page.navigate(bypass_cache).await {
            Ok(doc) => status_success(&format!("reloaded {} ({} bytes)", page.url(), doc.bytes)),
            Err(e) => status_error("reload failed", &format!("{:#}", anyhow::Error::from(e))),
        }

        if config.once {
            return Ok(());
        }
    }
}

/// One page lifetime: initialize, load, dispatch until unloaded.
async fn lifetime(
    endpoint: Url,
    transport: SseTransport,
    page: HttpPage,
) -> (SseTransport, HttpPage, Lifetime) {
    let (mut listener, rx) = PushListener::new(endpoint, transport, page);
    listener.initialize();
    listener.events().load();

    tokio::select! {
        () = listener.run(rx) => {}
        () = core::wait_for_shutdown() => {}
    }

    let (transport, mut page) = listener.into_parts();
    let lifetime = match page.take_pending_reload() {
        Some(bypass_cache) if !core::is_shutdown() => Lifetime::Reload { bypass_cache },
        _ => Lifetime::Stopped,
    };
    (transport, page, lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_http_page() {
        let config = ListenConfig {
            page_url: "file:///tmp/index.html".to_string(),
            ..ListenConfig::default()
        };

        let err = run(&config).await.unwrap_err();
        assert!(err.to_string().contains("not an http(s) URL"));
    }

    #[tokio::test]
    async fn test_rejects_unresolvable_endpoint() {
        let config = ListenConfig {
            endpoint: "ftp://push.host/sse".to_string(),
            ..ListenConfig::default()
        };

        let err = run(&config).await.unwrap_err();
        assert!(err.to_string().contains("cannot resolve endpoint"));
    }
}
