// ABOUTME: Plan command implementation.
// ABOUTME: Resolves the descriptor against the current environment without touching a runtime.

use testbed::config::EnvironmentConfig;
use testbed::error::Result;
use testbed::output::Output;
use testbed::plan::{EnvSnapshot, resolve};

pub fn plan(config: &EnvironmentConfig, output: &Output) -> Result<()> {
    let plan = resolve(&config.descriptor(), &EnvSnapshot::capture())?;
    output.plan(&plan);
    Ok(())
}
