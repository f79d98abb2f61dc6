// ABOUTME: DNS-compatible slot names for environment descriptors.
// ABOUTME: Slot names double as network aliases, so they follow RFC 1123 labels.

use super::network_alias::NetworkAlias;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotNameError {
    #[error("slot name cannot be empty")]
    Empty,

    #[error("slot name exceeds 63 characters")]
    TooLong,

    #[error("slot name must start and end with a letter or digit")]
    BadEdge,

    #[error("invalid character in slot name: {0:?}")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotName(String);

impl SlotName {
    pub fn new(value: &str) -> Result<Self, SlotNameError> {
        if value.is_empty() {
            return Err(SlotNameError::Empty);
        }
        if value.len() > 63 {
            return Err(SlotNameError::TooLong);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlotNameError::InvalidChar(c));
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(SlotNameError::BadEdge);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slot names are a strict subset of what a network alias allows.
    pub fn as_alias(&self) -> NetworkAlias {
        NetworkAlias::from_slot(self)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for SlotName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for SlotName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
