// ABOUTME: Composable capability traits for the container runtime gateway.
// ABOUTME: ImageOps, ContainerOps, NetworkOps, ExecOps, LogOps, RuntimeInfo.

mod container;
mod exec;
mod image;
mod logs;
mod network;
mod runtime_info;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use exec::{ExecError, ExecOps};
pub use image::{ImageError, ImageOps};
pub use logs::{LogError, LogLine, LogLineStream, LogOps, LogOptions, LogStream, collect_tail};
pub use network::{NetworkError, NetworkOps, NetworkSummary};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Everything the provisioning engine needs from a runtime.
///
/// Implemented automatically for any type providing all capabilities. The
/// engine holds the gateway behind an `Arc` and calls it from many tasks at
/// once, so implementations must not keep per-call state.
pub trait RuntimeGateway: ImageOps + ContainerOps + NetworkOps + ExecOps + LogOps {}

impl<T> RuntimeGateway for T where T: ImageOps + ContainerOps + NetworkOps + ExecOps + LogOps {}
