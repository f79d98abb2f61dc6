// ABOUTME: Command module aggregator for the testbed CLI.
// ABOUTME: Re-exports plan, up, and prune command handlers.

mod plan;
mod prune;
mod runtime_connection;
mod up;

pub use plan::plan;
pub use prune::prune;
pub use up::up;
