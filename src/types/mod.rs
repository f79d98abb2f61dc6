// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed runtime ids, instance ids, image refs and slot names.

mod id;
mod image_ref;
mod network_alias;
mod slot_name;

pub use id::{ContainerId, Id, InstanceId, NetworkId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use network_alias::{NetworkAlias, NetworkAliasError};
pub use slot_name::{SlotName, SlotNameError};
