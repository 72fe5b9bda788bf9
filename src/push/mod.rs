//! Push server
//!
//! The other end of a listener: holds event streams open and tells them to
//! refresh.
//!
//! # Architecture
//!
//! ```text
//! POST /refresh --+
//!                 +--> Hub::refresh_all --> Subscription --> pump --> client
//! file watcher ---+
//! ```
//!
//! Each stream runs on its own thread and owns one [`Subscription`]. A
//! refresh reaches every subscriber at most once; the stream writes the
//! marker and ends, and the client reconnects after reloading.
//!
//! # Modules
//!
//! - `files` - Static files under the serve root
//! - `hub` - Subscriber registry
//! - `server` - HTTP routes
//! - `stream` - Event stream writer
//! - `watch` - Debounced file watcher

pub mod files;
pub mod hub;
pub mod server;
pub mod stream;
pub mod watch;


pub use hub::Hub;
pub use server::{REFRESH_PATH, bind};
pub use watch::spawn_watcher;
