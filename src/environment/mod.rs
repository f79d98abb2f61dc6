// ABOUTME: Environment lifecycle: fixture, teardown and orphan sweep.
// ABOUTME: Owns the resource ledger and guarantees every created resource is removed.

mod error;
mod fixture;
mod orphans;
mod teardown;

pub use error::{
    AggregateProvisioningError, FixtureError, FixtureErrorKind, SlotFailure, SweepError,
};
pub use fixture::{Environment, EnvironmentFixture};
pub use orphans::{detect_orphans, sweep_orphans};
pub use teardown::{CALL_GRACE, CleanupFailure, TeardownReport, teardown};
