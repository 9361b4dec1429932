/*!
 * Exceptional Grant Store
 * In-memory per-user, per-capability override rows
 */

use crate::access::types::core::{EffectiveGrants, ExceptionalGrant, GrantKind};
use crate::access::types::traits::ExceptionalGrantStore;
use crate::core::errors::{AccessError, StorageError};
use crate::core::types::UserId;
use ahash::RandomState;
use dashmap::DashMap;
use log::debug;
use std::time::SystemTime;

/// Reference implementation of [`ExceptionalGrantStore`].
///
/// Rows accumulate: several overrides for the same (user, capability) may
/// coexist, and every currently-effective one is considered at read time.
pub struct MemoryExceptionalGrantStore {
    rows: DashMap<UserId, Vec<ExceptionalGrant>, RandomState>,
}

impl MemoryExceptionalGrantStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::with_hasher(RandomState::new()),
        }
    }
}

impl ExceptionalGrantStore for MemoryExceptionalGrantStore {
    fn effective_grants(
        &self,
        user: UserId,
        as_of: SystemTime,
    ) -> Result<EffectiveGrants, StorageError> {
        let mut effective = EffectiveGrants::default();
        if let Some(entry) = self.rows.get(&user) {
            for row in entry.iter().filter(|row| row.is_effective(as_of)) {
                match row.kind {
                    GrantKind::Grant => {
                        effective.grants.insert(row.capability.clone());
                    }
                    GrantKind::Revoke => {
                        effective.revokes.insert(row.capability.clone());
                    }
                }
            }
        }
        Ok(effective)
    }

    fn insert(&self, grant: ExceptionalGrant) -> Result<(), AccessError> {
        grant.validate()?;
        debug!(
            "recorded exceptional {:?} of '{}' for user {}",
            grant.kind, grant.capability, grant.user_id
        );
        self.rows.entry(grant.user_id).or_default().push(grant);
        Ok(())
    }

    fn grants_of(&self, user: UserId) -> Result<Vec<ExceptionalGrant>, StorageError> {
        let rows = self
            .rows
            .get(&user)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        Ok(rows)
    }
}

impl Default for MemoryExceptionalGrantStore {
    fn default() -> Self {
        Self::new()
    }
}
