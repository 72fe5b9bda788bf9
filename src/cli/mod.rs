//! Command-line interface module.

mod args;
pub mod listen;
pub mod serve;

pub use args::{Cli, Commands, ListenArgs, ServeArgs};
