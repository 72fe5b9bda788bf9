//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livepush.toml`:
//!
//! | Module   | TOML Section | Purpose                              |
//! |----------|--------------|--------------------------------------|
//! | `listen` | `[listen]`   | Page URL, push endpoint, output file |
//! | `serve`  | `[serve]`    | Push endpoint server and watcher     |

mod listen;
mod serve;

pub use listen::ListenConfig;
pub use serve::ServeConfig;
