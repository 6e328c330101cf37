//! Logging setup.
//!
//! The engine only talks to the `log` facade; this module installs `env_logger`
//! as the backend for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
