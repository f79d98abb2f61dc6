// ABOUTME: Provisioning of individual resources and the resulting handles.
// ABOUTME: Lifecycle controller, health status, access points, labels and ledger.

pub mod access;
mod controller;
mod error;
mod handle;
pub mod labels;
mod ledger;
mod status;

pub use controller::Provisioner;
pub use error::{ProvisionError, ProvisionErrorKind, Result};
pub use handle::{AccessPoint, ContainerHandle, NetworkHandle, Uri};
pub use ledger::{Ledger, Tracked};
pub use status::HealthStatus;
