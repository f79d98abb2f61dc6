// ABOUTME: Runtime gateway: capability traits, detection, and the bollard binding.
// ABOUTME: Everything the engine knows about Docker or Podman goes through here.

mod bollard;
mod detection;
mod error;
pub mod traits;
mod types;

pub use bollard::{BollardRuntime, connect_local};
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::*;
pub use types::{DetectedRuntime, RuntimeConfig, RuntimeType};
