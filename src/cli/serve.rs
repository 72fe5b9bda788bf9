//! `serve` command.

use anyhow::Result;

use crate::config::LivepushConfig;
use crate::embed::serve::SSE_JS_PATH;
use crate::push::{self, Hub, REFRESH_PATH};
use crate::{core, log};

/// Bind the push endpoint, start the optional watcher, then block in the
/// request loop until Ctrl+C.
pub fn run_serve(config: &LivepushConfig) -> Result<()> {
    let serve = &config.serve;
    let hub = Hub::new();
    let server = push::bind(serve, hub)?;
    core::register_server(server.handle());

    // Dropping the watcher stops it, so it lives for the whole loop
    let _watcher = if serve.watch.is_empty() {
        None
    } else {
        Some(push::spawn_watcher(&serve.watch, server.hub())?)
    };

    let base = format!("http://{}", server.addr());
    log!("serve"; "{}{}", base, serve.endpoint);
    log!("serve"; "POST {}{} to refresh", base, REFRESH_PATH);
    log!("serve"; "script {}{}", base, SSE_JS_PATH);
    log!("serve"; "files from {}", serve.root.display());

    server.run();
    Ok(())
}
