// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Enforces a non-empty slot list and a usable environment name.

use crate::plan::Slot;
use nonempty::NonEmpty;
use serde::Deserialize;

pub fn deserialize_slots<'de, D>(deserializer: D) -> Result<NonEmpty<Slot>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let slots: Vec<Slot> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(slots).ok_or_else(|| serde::de::Error::custom("at least one slot is required"))
}

pub fn deserialize_environment_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(serde::de::Error::custom("environment name cannot be empty"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || "-_.".contains(*c)))
    {
        return Err(serde::de::Error::custom(format!(
            "invalid character in environment name: {c:?}"
        )));
    }
    Ok(name.to_string())
}
