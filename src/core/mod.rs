//! Core state shared across commands.

mod state;

pub use state::{
    is_shutdown, register_server, request_shutdown, setup_shutdown_handler, wait_for_shutdown,
};
