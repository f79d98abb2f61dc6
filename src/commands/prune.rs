// ABOUTME: Prune command implementation.
// ABOUTME: Sweeps labelled containers and networks older than a threshold.

use super::runtime_connection::connect_to_runtime;
use std::time::Duration;
use testbed::config::ProvisionSettings;
use testbed::diagnostics::Diagnostics;
use testbed::environment::sweep_orphans;
use testbed::error::{Error, Result};
use testbed::output::Output;
use testbed::runtime::RuntimeConfig;

pub async fn prune(
    runtime_config: &RuntimeConfig,
    settings: &ProvisionSettings,
    environment: Option<&str>,
    older_than: Duration,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let runtime = connect_to_runtime(runtime_config, &output).await?;
    let mut diag = Diagnostics::default();

    let report = sweep_orphans(
        &runtime,
        environment,
        older_than,
        settings.stop_timeout,
        &mut diag,
    )
    .await
    .map_err(|e| Error::Prune(e.to_string()))?;

    output.teardown(&report);
    output.success(&format!("Removed {} resource(s)", report.removed.len()));
    for warning in diag.warnings() {
        output.progress(&format!("  ! {warning}"));
    }
    Ok(())
}
