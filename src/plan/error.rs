// ABOUTME: Errors raised while resolving a descriptor into a plan.
// ABOUTME: Resolution fails before any runtime call is made.

use crate::types::{ParseImageRefError, SlotNameError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("ambiguous configuration for slot '{slot}': {reason}")]
    AmbiguousConfiguration { slot: String, reason: String },

    #[error("slot '{slot}' cannot be resolved: {reason}")]
    UnresolvableResource { slot: String, reason: String },

    #[error("invalid slot name '{name}': {source}")]
    InvalidSlotName {
        name: String,
        #[source]
        source: SlotNameError,
    },

    #[error("invalid image reference for slot '{slot}': {source}")]
    InvalidImage {
        slot: String,
        #[source]
        source: ParseImageRefError,
    },
}

impl ResolveError {
    pub(super) fn ambiguous(slot: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::AmbiguousConfiguration {
            slot: slot.into(),
            reason: reason.into(),
        }
    }

    pub(super) fn unresolvable(slot: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::UnresolvableResource {
            slot: slot.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
