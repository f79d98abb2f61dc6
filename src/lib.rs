// ABOUTME: Library root for testbed: ephemeral container environments for tests.
// ABOUTME: The CLI binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod output;
pub mod plan;
pub mod provision;
pub mod runtime;
pub mod types;
