//! `listen` command.

use anyhow::{Context, Result};

use crate::config::LivepushConfig;
use crate::session;

/// Run the listen session on a current-thread runtime.
///
/// The listener is single-threaded by nature; every handler runs on the
/// one dispatcher.
pub fn run_listen(config: &LivepushConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(session::run(&config.listen))
}
