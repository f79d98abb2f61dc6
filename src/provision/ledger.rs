// ABOUTME: Record of every runtime resource created for an environment.
// ABOUTME: Entries are added right after creation and drained exactly once at teardown.

use crate::types::{ContainerId, NetworkId};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tracked {
    Container { id: ContainerId, name: String },
    Network { id: NetworkId, name: String },
}

impl Tracked {
    pub fn name(&self) -> &str {
        match self {
            Tracked::Container { name, .. } | Tracked::Network { name, .. } => name,
        }
    }
}

/// Shared between the provisioning tasks and the fixture that owns them.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Mutex<Vec<Tracked>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, entry: Tracked) {
        self.entries.lock().push(entry);
    }

    /// Drop a container that was already cleaned up.
    pub fn forget_container(&self, id: &ContainerId) {
        self.entries
            .lock()
            .retain(|e| !matches!(e, Tracked::Container { id: tracked, .. } if tracked == id));
    }

    /// Take every entry, in creation order, leaving the ledger empty.
    pub fn drain(&self) -> Vec<Tracked> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
