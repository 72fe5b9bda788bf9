//! Livepush - keep pages listening for server pushes and reload them on refresh.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod embed;
mod listener;
mod logger;
mod push;
mod session;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::LivepushConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = LivepushConfig::load(&cli)?;

    match &cli.command {
        Commands::Listen { .. } => cli::listen::run_listen(&config),
        Commands::Serve { .. } => cli::serve::run_serve(&config),
    }
}
