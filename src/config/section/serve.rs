//! `[serve]` section configuration.
//!
//! Contains push endpoint server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 8000                 # HTTP port number
//! endpoint = "/sse"           # Path of the push stream
//! keepalive = 15              # Seconds between "stay alive" messages
//! root = "ui/static"          # Directory served for every other GET
//! watch = ["static", "templates"]  # Paths whose changes trigger a refresh
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::listen::DEFAULT_ENDPOINT;

/// Push endpoint server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Path of the push stream.
    pub endpoint: String,

    /// Seconds between keepalive messages.
    pub keepalive: u64,

    /// Paths watched for changes; empty disables the watcher.
    pub watch: Vec<PathBuf>,

    /// Directory whose files are served for paths outside the push routes.
    pub root: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8000,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            keepalive: 15,
            watch: Vec::new(),
            root: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nkeepalive = 5\nwatch = [\"static\"]\nroot = \"ui/static\"",
        );

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.keepalive, 5);
        assert_eq!(config.serve.watch, vec![PathBuf::from("static")]);
        assert_eq!(config.serve.root, PathBuf::from("ui/static"));
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 8000);
        assert_eq!(config.serve.endpoint, "/sse");
        assert_eq!(config.serve.keepalive, 15);
        assert!(config.serve.watch.is_empty());
        assert_eq!(config.serve.root, PathBuf::from("."));
    }
}
