// ABOUTME: Declarative resolver: turns an environment descriptor into a plan.
// ABOUTME: Descriptor types, template snapshot, resolved specs and errors.

mod descriptor;
mod error;
mod resolver;
mod spec;
mod template;

pub use descriptor::{
    Account, BuildContext, Capability, Descriptor, Fragment, PortBinding, Scheme, Setting, Slot,
};
pub use error::{ResolveError, Result};
pub use resolver::{IMPLICIT_NETWORK_SLOT, SFTP_USERS_VAR, resolve};
pub use spec::{ContainerSpec, Dependency, ImageSource, NetworkSpec, Plan, ResourceSpec};
pub use template::EnvSnapshot;
