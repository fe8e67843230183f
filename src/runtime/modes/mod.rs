//! Mode routing
//!
//! - Server mode (fetch loop + HTTP server), the default
//! - Config mode (sample config generation)

pub mod config;
pub mod server;

pub use config::run_config_command;
pub use server::run_server;
