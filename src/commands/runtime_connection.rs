// ABOUTME: Shared helper for connecting to the local container runtime.
// ABOUTME: Used by the up and prune commands.

use testbed::error::Result;
use testbed::output::Output;
use testbed::runtime::{BollardRuntime, RuntimeConfig, connect_local};

/// Detect the runtime, connect and ping it, reporting progress.
pub async fn connect_to_runtime(config: &RuntimeConfig, output: &Output) -> Result<BollardRuntime> {
    output.progress("  → Detecting runtime...");
    let runtime = connect_local(Some(config)).await?;
    output.progress(&format!("  → Connected to {}", runtime.runtime_type()));
    Ok(runtime)
}
