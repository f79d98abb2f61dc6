// ABOUTME: Up command implementation.
// ABOUTME: Provisions the environment, waits for Ctrl-C, then tears everything down.

use super::runtime_connection::connect_to_runtime;
use std::sync::Arc;
use std::time::Duration;
use testbed::config::EnvironmentConfig;
use testbed::environment::EnvironmentFixture;
use testbed::error::Result;
use testbed::output::Output;
use testbed::plan::{EnvSnapshot, resolve};
use tokio_util::sync::CancellationToken;

pub async fn up(config: EnvironmentConfig, timeout: Option<Duration>, mut output: Output) -> Result<()> {
    output.start_timer();
    let plan = resolve(&config.descriptor(), &EnvSnapshot::capture())?;
    output.progress(&format!(
        "Provisioning {} ({} container(s))",
        plan.environment(),
        plan.containers().len()
    ));

    let runtime = connect_to_runtime(&config.runtime, &output).await?;
    let timeout = timeout.unwrap_or(config.provision.timeout);
    let mut fixture = EnvironmentFixture::new(Arc::new(runtime), plan, config.provision);

    // First Ctrl-C cancels provisioning or, once up, starts teardown.
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    match fixture.initialize(timeout, &cancel).await {
        Ok(environment) => {
            output.environment(environment);
            output.success("Environment ready; press Ctrl-C to tear down");
        }
        Err(e) => {
            watcher.abort();
            return Err(e.into());
        }
    }

    cancel.cancelled().await;
    output.progress("Tearing down...");
    let report = fixture.dispose().await;
    output.teardown(&report);
    if report.is_clean() {
        output.success("Environment removed");
    } else {
        output.error(&format!(
            "{} resource(s) could not be removed",
            report.failures.len()
        ));
    }
    Ok(())
}
