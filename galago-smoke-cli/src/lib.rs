//! galago-smoke CLI library
//!
//! The binary in `main.rs` is a thin wrapper; handlers live here so they can
//! be tested without spawning a process.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod output;
