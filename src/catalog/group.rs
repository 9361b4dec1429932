/*!
 * Group Catalog
 * Functional groups mapping to capability bundles, without hierarchy
 */

use crate::core::types::{CapabilityCode, GroupCode};
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named, non-hierarchical bundle of capabilities.
///
/// No field encodes rank or level: a user may hold any number of groups
/// simultaneously and their capability sets simply union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
    pub code: GroupCode,
    pub name: String,
    /// Functional category label, e.g. `operations`, `management`
    pub category: String,
    pub active: bool,
}

impl Group {
    pub fn new(code: impl Into<GroupCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category: String::new(),
            active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Process-wide registry of groups and their capability bundles
pub struct GroupCatalog {
    groups: DashMap<GroupCode, Group, RandomState>,
    bundles: DashMap<GroupCode, HashSet<CapabilityCode>, RandomState>,
}

impl GroupCatalog {
    pub fn new() -> Self {
        Self {
            groups: DashMap::with_hasher(RandomState::new()),
            bundles: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Register or replace a group definition
    pub fn register(&self, group: Group) {
        self.groups.insert(group.code.clone(), group);
    }

    /// Attach a capability to a group's bundle; returns false if the group is unknown
    pub fn attach(&self, group: &str, capability: impl Into<CapabilityCode>) -> bool {
        if !self.groups.contains_key(group) {
            return false;
        }
        self.bundles
            .entry(group.to_owned())
            .or_default()
            .insert(capability.into());
        true
    }

    /// Deactivate a group; returns false if the code is unknown
    pub fn deactivate(&self, code: &str) -> bool {
        match self.groups.get_mut(code) {
            Some(mut entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    /// Capability codes granted by a group.
    ///
    /// Unknown and inactive groups yield the empty set; two groups
    /// granting the same capability deduplicate in the caller's union.
    pub fn capabilities_of(&self, code: &str) -> HashSet<CapabilityCode> {
        let active = self
            .groups
            .get(code)
            .map(|group| group.active)
            .unwrap_or(false);
        if !active {
            return HashSet::new();
        }
        self.bundles
            .get(code)
            .map(|bundle| bundle.clone())
            .unwrap_or_default()
    }

    /// Whether a group is registered, active or not
    pub fn contains(&self, code: &str) -> bool {
        self.groups.contains_key(code)
    }
}

impl Default for GroupCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_of() {
        let catalog = GroupCatalog::new();
        catalog.register(Group::new("frontline", "Frontline agents").with_category("operations"));
        assert!(catalog.attach("frontline", "ops.calls.make"));
        assert!(catalog.attach("frontline", "ops.calls.view"));

        let caps = catalog.capabilities_of("frontline");
        assert_eq!(caps.len(), 2);
        assert!(caps.contains("ops.calls.make"));
    }

    #[test]
    fn test_unknown_group_is_empty() {
        let catalog = GroupCatalog::new();
        assert!(catalog.capabilities_of("no_such_group").is_empty());
        assert!(!catalog.attach("no_such_group", "ops.calls.make"));
    }

    #[test]
    fn test_inactive_group_grants_nothing() {
        let catalog = GroupCatalog::new();
        catalog.register(Group::new("frontline", "Frontline agents"));
        catalog.attach("frontline", "ops.calls.make");
        catalog.deactivate("frontline");

        assert!(catalog.capabilities_of("frontline").is_empty());
        // Still registered for administrative lookups
        assert!(catalog.contains("frontline"));
    }

    #[test]
    fn test_attach_deduplicates() {
        let catalog = GroupCatalog::new();
        catalog.register(Group::new("frontline", "Frontline agents"));
        catalog.attach("frontline", "ops.calls.make");
        catalog.attach("frontline", "ops.calls.make");

        assert_eq!(catalog.capabilities_of("frontline").len(), 1);
    }
}
