//! CLI command implementations

pub mod auth;
pub mod config;
pub mod list;
pub mod status;
pub mod sync;
pub mod transfer;
pub mod watch;
