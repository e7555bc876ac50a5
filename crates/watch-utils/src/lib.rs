//! Shared utilities for stock-watch
//!
//! This crate provides the pieces every stock-watch binary needs before the
//! watcher itself starts: tracing setup and typed environment lookups used by
//! the configuration layer.

pub mod env;
pub mod logging;

pub use env::{env_bool, env_parse, env_string};
pub use logging::init_tracing_with;
