// ABOUTME: Labels attached to every resource testbed creates.
// ABOUTME: Used to find leftovers from crashed runs.

use crate::types::{InstanceId, SlotName};
use std::collections::HashMap;

pub const MANAGED: &str = "testbed.managed";
pub const ENVIRONMENT: &str = "testbed.environment";
pub const SLOT: &str = "testbed.slot";
pub const INSTANCE: &str = "testbed.instance";
pub const HOST: &str = "testbed.host";
/// RFC 3339 creation timestamp.
pub const CREATED: &str = "testbed.created";

pub fn resource_labels(
    environment: &str,
    slot: &SlotName,
    instance: InstanceId,
) -> HashMap<String, String> {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    HashMap::from([
        (MANAGED.to_string(), "true".to_string()),
        (ENVIRONMENT.to_string(), environment.to_string()),
        (SLOT.to_string(), slot.to_string()),
        (INSTANCE.to_string(), instance.to_string()),
        (HOST.to_string(), hostname),
        (CREATED.to_string(), chrono::Utc::now().to_rfc3339()),
    ])
}

/// Label filter matching managed resources, optionally of one environment.
pub fn managed_filter(environment: Option<&str>) -> HashMap<String, String> {
    let mut labels = HashMap::from([(MANAGED.to_string(), "true".to_string())]);
    if let Some(environment) = environment {
        labels.insert(ENVIRONMENT.to_string(), environment.to_string());
    }
    labels
}
