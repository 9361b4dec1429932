/*!
 * Membership Store
 * In-memory user-to-group assignment rows keyed by the (user, group) natural key
 */

use crate::access::types::core::Membership;
use crate::access::types::traits::MembershipStore;
use crate::core::errors::{AccessError, ResourceKind, StorageError};
use crate::core::types::{GroupCode, UserId};
use ahash::RandomState;
use dashmap::DashMap;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

/// Reference implementation of [`MembershipStore`].
///
/// Rows for one user live under a single map entry, so every mutation is
/// atomic per natural key without serializing reads of other users.
pub struct MemoryMembershipStore {
    rows: DashMap<UserId, HashMap<GroupCode, Membership>, RandomState>,
}

impl MemoryMembershipStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Housekeeping sweep: flips `active` off on rows already expired as
    /// of the timestamp and returns how many were closed.
    ///
    /// This is an external-job convenience only. The decision path checks
    /// expiration at read time and never depends on the sweep having run.
    pub fn close_expired(&self, as_of: SystemTime) -> usize {
        let mut closed = 0;
        for mut entry in self.rows.iter_mut() {
            for membership in entry.value_mut().values_mut() {
                let expired = membership
                    .expires_at
                    .map_or(false, |expires| expires <= as_of);
                if membership.active && expired {
                    membership.active = false;
                    closed += 1;
                }
            }
        }
        if closed > 0 {
            debug!("closed {} expired memberships", closed);
        }
        closed
    }
}

impl MembershipStore for MemoryMembershipStore {
    fn effective_groups_of(
        &self,
        user: UserId,
        as_of: SystemTime,
    ) -> Result<HashSet<GroupCode>, StorageError> {
        let groups = self
            .rows
            .get(&user)
            .map(|entry| {
                entry
                    .values()
                    .filter(|membership| membership.is_effective(as_of))
                    .map(|membership| membership.group.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(groups)
    }

    fn assign(&self, membership: Membership) -> Result<(), AccessError> {
        let mut entry = self.rows.entry(membership.user_id).or_default();
        match entry.get_mut(&membership.group) {
            Some(existing) => {
                // Natural-key update: refresh the time bound and metadata,
                // keep the original assignment provenance.
                existing.active = true;
                existing.expires_at = membership.expires_at;
                existing.reason = membership.reason;
                debug!(
                    "reactivated membership of user {} in group '{}'",
                    membership.user_id, existing.group
                );
            }
            None => {
                debug!(
                    "assigned user {} to group '{}'",
                    membership.user_id, membership.group
                );
                entry.insert(membership.group.clone(), membership);
            }
        }
        Ok(())
    }

    fn revoke(&self, user: UserId, group: &str) -> Result<(), AccessError> {
        let mut entry = self
            .rows
            .get_mut(&user)
            .ok_or_else(|| membership_not_found(user, group))?;
        let membership = entry
            .get_mut(group)
            .ok_or_else(|| membership_not_found(user, group))?;
        membership.active = false;
        debug!("revoked group '{}' from user {}", group, user);
        Ok(())
    }

    fn memberships_of(&self, user: UserId) -> Result<Vec<Membership>, StorageError> {
        let rows = self
            .rows
            .get(&user)
            .map(|entry| entry.values().cloned().collect())
            .unwrap_or_default();
        Ok(rows)
    }
}

impl Default for MemoryMembershipStore {
    fn default() -> Self {
        Self::new()
    }
}

fn membership_not_found(user: UserId, group: &str) -> AccessError {
    AccessError::not_found(ResourceKind::Membership, format!("{}/{}", user, group))
}
