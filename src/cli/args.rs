//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Livepush: keep a page listening for server pushes and reload it on refresh
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (optional, default: livepush.toml)
    #[arg(short = 'C', long, global = true, default_value = "livepush.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load a page and reload it whenever its push channel says refresh
    #[command(visible_alias = "l")]
    Listen {
        #[command(flatten)]
        args: ListenArgs,
    },

    /// Run a push endpoint that tells listeners to refresh
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },
}

/// Listen command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListenArgs {
    /// URL of the page to load and reload
    #[arg(short, long = "page-url", value_hint = clap::ValueHint::Url)]
    pub page_url: Option<String>,

    /// Push endpoint path, resolved against the page URL (e.g. /sse)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Stop after the first reload
    #[arg(long)]
    pub once: bool,

    /// Write each freshly loaded document to this file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Serve command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Seconds between keepalive messages on each push stream
    #[arg(short, long)]
    pub keepalive: Option<u64>,

    /// Files or directories whose changes trigger a refresh
    #[arg(short, long, value_hint = clap::ValueHint::AnyPath)]
    pub watch: Vec<PathBuf>,

    /// Directory served for every path outside the push routes
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,
}

impl Cli {
    pub const fn is_listen(&self) -> bool {
        matches!(self.command, Commands::Listen { .. })
    }
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen() {
        let cli = Cli::parse_from([
            "livepush",
            "listen",
            "--page-url",
            "http://127.0.0.1:8000/",
            "--endpoint",
            "/btlship/sse",
            "--once",
        ]);
        assert!(cli.is_listen());
        let Commands::Listen { args } = cli.command else {
            panic!("expected listen");
        };
        assert_eq!(args.page_url.as_deref(), Some("http://127.0.0.1:8000/"));
        assert_eq!(args.endpoint.as_deref(), Some("/btlship/sse"));
        assert!(args.once);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_parse_serve_with_watch_paths() {
        let cli = Cli::parse_from([
            "livepush", "-v", "serve", "-p", "9000", "-w", "a", "-w", "b", "-r", "site",
        ]);
        assert!(cli.is_serve());
        assert!(cli.verbose);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.watch, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(args.root, Some(PathBuf::from("site")));
    }

    #[test]
    fn test_config_default() {
        let cli = Cli::parse_from(["livepush", "listen"]);
        assert_eq!(cli.config, PathBuf::from("livepush.toml"));
    }
}
