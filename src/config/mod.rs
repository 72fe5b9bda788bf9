//! Configuration management for `livepush.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [listen] and [serve]
//! ├── error          # ConfigError, ConfigDiagnostics
//! ├── util           # endpoint resolution, config file search
//! └── mod.rs         # LivepushConfig (this file)
//! ```
//!
//! The config file is optional: without one every section uses its
//! defaults, and CLI arguments override whatever was loaded.

mod error;
pub mod section;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{ListenConfig, ServeConfig};
pub use util::{find_config_file, parse_http_url, resolve_endpoint};

use crate::{
    cli::{Cli, Commands, ListenArgs, ServeArgs},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livepush.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivepushConfig {
    /// Path of the loaded config file, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Page listener settings
    #[serde(default)]
    pub listen: ListenConfig,

    /// Push endpoint server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl LivepushConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; a missing file is not
    /// an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Listen { args } => self.apply_listen_args(args),
            Commands::Serve { args } => self.apply_serve_args(args),
        }
    }

    fn apply_listen_args(&mut self, args: &ListenArgs) {
        Self::update_option(&mut self.listen.page_url, args.page_url.as_ref());
        Self::update_option(&mut self.listen.endpoint, args.endpoint.as_ref());
        if args.once {
            self.listen.once = true;
        }
        if args.output.is_some() {
            self.listen.output = args.output.clone();
        }
    }

    fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.keepalive, args.keepalive.as_ref());
        Self::update_option(&mut self.serve.root, args.root.as_ref());
        if !args.watch.is_empty() {
            self.serve.watch = args.watch.clone();
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, collecting every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if parse_http_url(&self.listen.page_url).is_none() {
            diag.error_with_hint(
                "listen.page_url",
                format!("`{}` is not an http(s) URL", self.listen.page_url),
                "e.g. \"http://127.0.0.1:8000/\"",
            );
        } else if resolve_endpoint(&self.listen.page_url, &self.listen.endpoint).is_none() {
            diag.error_with_hint(
                "listen.endpoint",
                format!("`{}` does not resolve to an http(s) URL", self.listen.endpoint),
                "use a path such as \"/sse\"",
            );
        }

        if !self.serve.endpoint.starts_with('/') {
            diag.error_with_hint(
                "serve.endpoint",
                format!("`{}` is not a path", self.serve.endpoint),
                "use a path such as \"/sse\"",
            );
        }

        if self.serve.keepalive == 0 {
            diag.error("serve.keepalive", "must be at least 1 second");
        }

        if !self.serve.root.is_dir() {
            diag.error(
                "serve.root",
                format!("`{}` is not a directory", self.serve.root.display()),
            );
        }

        diag.into_result()
    }
}

/// Parse config and fail on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> LivepushConfig {
    let (parsed, ignored) = LivepushConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config_is_valid() {
        assert!(LivepushConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(LivepushConfig::from_str("[listen\nonce = ").is_err());
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) =
            LivepushConfig::parse_with_ignored("[listen]\nretry_backoff = 5").unwrap();
        assert_eq!(ignored, vec!["listen.retry_backoff".to_string()]);
    }

    #[test]
    fn test_listen_args_override_file() {
        let mut config = test_parse_config("[listen]\nendpoint = \"/btlship/sse\"");
        let cli = Cli::parse_from([
            "livepush",
            "listen",
            "--endpoint",
            "/sse",
            "--page-url",
            "http://game.local/",
        ]);
        config.apply_command_options(&cli);

        assert_eq!(config.listen.endpoint, "/sse");
        assert_eq!(config.listen.page_url, "http://game.local/");
        assert!(!config.listen.once);
    }

    #[test]
    fn test_serve_args_override_file() {
        let mut config = test_parse_config("[serve]\nport = 9000\nwatch = [\"static\"]");
        let cli = Cli::parse_from(["livepush", "serve", "--keepalive", "3", "--root", "site"]);
        config.apply_command_options(&cli);

        // untouched by CLI
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.serve.watch, vec![PathBuf::from("static")]);
        assert_eq!(config.serve.keepalive, 3);
        assert_eq!(config.serve.root, PathBuf::from("site"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[listen]\npage_url = \"not a url\"\n[serve]\nendpoint = \"sse\"\nkeepalive = 0\nroot = \"/no/such/dir\"",
        );
        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected diagnostics");
        };
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["listen.page_url", "serve.endpoint", "serve.keepalive", "serve.root"]
        );
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let config = test_parse_config("[listen]\nendpoint = \"ftp://host/sse\"");
        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.errors()[0].field, "listen.endpoint");
    }
}
