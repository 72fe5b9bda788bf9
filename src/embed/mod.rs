//! Embedded static resources.
//!
//! - `serve` - Browser-side push listener and fallback index page served by
//!   the push endpoint
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{SSE_JS, SseVars};
//!
//! let js = SSE_JS.render(&SseVars { endpoint: "/sse".into() });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL path the browser listener is served at.
    pub const SSE_JS_PATH: &str = "/static/js/sse.js";

    /// Variables for sse.js.
    pub struct SseVars {
        pub endpoint: String,
    }

    impl TemplateVars for SseVars {
        fn apply(&self, content: &str) -> String {
            // Rust string debug escaping is a valid JS string literal for paths
            let quoted = format!("{:?}", self.endpoint);
            content.replace("\"__LIVEPUSH_ENDPOINT__\"", &quoted)
        }
    }

    /// Browser push listener with endpoint injection.
    pub const SSE_JS: Template<SseVars> = Template::new(include_str!("serve/sse.js"));

    /// Variables for the fallback index page.
    pub struct IndexVars {
        pub endpoint: String,
    }

    impl TemplateVars for IndexVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__LIVEPUSH_SCRIPT__", SSE_JS_PATH)
                .replace("__LIVEPUSH_ENDPOINT__", &escape_html(&self.endpoint))
        }
    }

    /// Page served at `/` when the serve root has no index.
    pub const INDEX_HTML: Template<IndexVars> = Template::new(include_str!("serve/index.html"));

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }
}

#[cfg(test)]
mod tests {
    use super::serve::{INDEX_HTML, IndexVars, SSE_JS, SseVars};

    #[test]
    fn test_sse_js_endpoint_injection() {
        let js = SSE_JS.render(&SseVars {
            endpoint: "/btlship/sse".into(),
        });
        assert!(js.contains("const ENDPOINT = \"/btlship/sse\";"));
        assert!(!js.contains("__LIVEPUSH_ENDPOINT__"));
        assert!(js.contains("'refresh'"));
        assert!(js.contains("reload(true)"));
    }

    #[test]
    fn test_index_loads_listener_script() {
        let html = INDEX_HTML.render(&IndexVars {
            endpoint: "/sse?room=<1>".into(),
        });
        assert!(html.contains(r#"<script src="/static/js/sse.js"></script>"#));
        assert!(html.contains("<code>/sse?room=&lt;1&gt;</code>"));
        assert!(!html.contains("__LIVEPUSH"));
    }
}
