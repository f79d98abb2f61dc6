// ABOUTME: Diagnostics accumulator for non-fatal warnings during teardown and sweeps.
// ABOUTME: Each warning names the resource it concerns so leftovers can be found by hand.

use serde::Serialize;
use std::fmt;

/// Problems that must not fail a test run but should reach the user.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning and log it.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(
            kind = %warning.kind,
            resource = %warning.resource,
            "{}",
            warning.reason
        );
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind, in the order they were recorded.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// Runtime name of the container or network.
    pub resource: String,
    pub reason: String,
}

impl Warning {
    /// A resource survived teardown.
    pub fn teardown_failed(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::TeardownFailed,
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// A managed resource was left alone by the orphan sweep.
    pub fn orphan_skipped(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OrphanSkipped,
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.resource, self.kind, self.reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    TeardownFailed,
    /// No readable creation time.
    OrphanSkipped,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarningKind::TeardownFailed => "teardown failed",
            WarningKind::OrphanSkipped => "orphan skipped",
        })
    }
}
