/*!
 * Capability Catalog
 * Static registry of action-on-resource capabilities with sensitivity metadata
 */

use crate::core::types::CapabilityCode;
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Sensitivity level of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Low,
    Normal,
    High,
    Critical,
}

/// One addressable action on a resource, e.g. `ops.calls.make`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Capability {
    /// Globally unique code in `domain.resource.action` form
    pub code: CapabilityCode,
    /// Human-readable display name
    pub name: String,
    pub sensitivity: Sensitivity,
    /// Whether every authorization decision for this capability must be recorded
    pub requires_audit: bool,
    pub active: bool,
}

impl Capability {
    pub fn new(code: impl Into<CapabilityCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            sensitivity: Sensitivity::Low,
            requires_audit: false,
            active: true,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Mark every decision on this capability as audit-required
    pub fn audited(mut self) -> Self {
        self.requires_audit = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Process-wide registry of capabilities, keyed by code.
///
/// Read-mostly reference data; mutation is rare and administrative. An
/// in-flight evaluation uses the catalog state as of the moment of its read.
pub struct CapabilityCatalog {
    entries: DashMap<CapabilityCode, Capability, RandomState>,
}

impl CapabilityCatalog {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Register or replace a capability definition
    pub fn register(&self, capability: Capability) {
        self.entries.insert(capability.code.clone(), capability);
    }

    /// Deactivate a capability; returns false if the code is unknown
    pub fn deactivate(&self, code: &str) -> bool {
        match self.entries.get_mut(code) {
            Some(mut entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    /// Resolve a code to its active definition.
    ///
    /// Inactive capabilities resolve to `None`: from the evaluator's
    /// perspective they are indistinguishable from unknown codes.
    pub fn resolve(&self, code: &str) -> Option<Capability> {
        self.entries
            .get(code)
            .filter(|entry| entry.active)
            .map(|entry| entry.clone())
    }

    /// Whether decisions on this code must be recorded.
    ///
    /// Unknown or inactive codes answer `true`: a capability that cannot
    /// be looked up is always audited when referenced (fail closed).
    pub fn requires_audit(&self, code: &str) -> bool {
        match self.resolve(code) {
            Some(capability) => capability.requires_audit,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CapabilityCatalog {
    fn default() -> Self {
        Self::new()
    }
}
