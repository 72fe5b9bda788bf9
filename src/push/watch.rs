//! File watcher that triggers refreshes.
//!
//! Bursts of filesystem events (editors write temp files, rename, chmod)
//! are collapsed: after the first relevant event the watcher waits until
//! things have been quiet for `DEBOUNCE_MS`, then refreshes once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::hub::Hub;
use crate::{debug, log};

pub(super) const DEBOUNCE_MS: u64 = 300;

/// Start watching `paths`. Dropping the returned watcher stops it.
pub fn spawn_watcher(paths: &[PathBuf], hub: Arc<Hub>) -> Result<RecommendedWatcher> {
    let (tx, rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })
    .context("Failed to create file watcher")?;

    for path in paths {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        log!("watch"; "{}", path.display());
    }

    std::thread::spawn(move || debounce_loop(&rx, &hub, Duration::from_millis(DEBOUNCE_MS)));
    Ok(watcher)
}

/// Collapse event bursts into single refreshes until the watcher is gone.
fn debounce_loop(rx: &Receiver<notify::Result<Event>>, hub: &Hub, quiet: Duration) {
    while let Ok(first) = rx.recv() {
        let mut changed = relevant_path(first);

        loop {
            match rx.recv_timeout(quiet) {
                Ok(res) => {
                    if changed.is_none() {
                        changed = relevant_path(res);
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        if let Some(path) = changed {
            let streams = hub.refresh_all();
            log!("watch"; "{} changed, refresh sent to {} stream(s)", path.display(), streams);
        }
    }
}

fn relevant_path(res: notify::Result<Event>) -> Option<PathBuf> {
    match res {
        Ok(event) if is_relevant(&event) => event
            .paths
            .into_iter()
            .find(|p| !is_temp_file(p)),
        Ok(_) => None,
        Err(e) => {
            debug!("watch"; "watcher error: {}", e);
            None
        }
    }
}

/// Content changes count; reads and metadata-only changes do not.
fn is_relevant(event: &Event) -> bool {
    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(modify) => !matches!(modify, notify::event::ModifyKind::Metadata(_)),
        _ => false,
    }
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with(".#")
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".swx")
        || name.ends_with(".tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::hub::Push;
    use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "a.html")));
        assert!(is_relevant(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "a.html"
        )));
        assert!(!is_relevant(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            "a.html"
        )));
        assert!(!is_relevant(&event(EventKind::Any, "a.html")));
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("static/.#index.html")));
        assert!(is_temp_file(Path::new("static/index.html~")));
        assert!(is_temp_file(Path::new("static/.index.html.swp")));
        assert!(!is_temp_file(Path::new("static/index.html")));
    }

    #[test]
    fn test_relevant_path_skips_temp_files() {
        let ev = event(EventKind::Create(CreateKind::File), "x.swp").add_path(PathBuf::from("x.css"));
        assert_eq!(relevant_path(Ok(ev)), Some(PathBuf::from("x.css")));

        let ev = event(EventKind::Create(CreateKind::File), "x.swp");
        assert_eq!(relevant_path(Ok(ev)), None);
    }

    #[test]
    fn test_quiet_period_releases_refresh() {
        let hub = Hub::new();
        let a = hub.subscribe();
        let (tx, rx) = channel::unbounded();

        let loop_hub = Arc::clone(&hub);
        let handle = std::thread::spawn(move || {
            debounce_loop(&rx, &loop_hub, Duration::from_millis(20));
        });

        tx.send(Ok(event(EventKind::Create(CreateKind::File), "a.html"))).unwrap();
        tx.send(Ok(event(EventKind::Create(CreateKind::File), "b.html"))).unwrap();

        assert_eq!(
            a.recv_timeout(Duration::from_secs(5)),
            Ok(Push::Refresh)
        );
        drop(tx);
        handle.join().unwrap();
    }
}
