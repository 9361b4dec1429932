/*!
 * Access Traits
 * Interfaces between the evaluator and its backing stores
 */

use super::core::{AccessDecision, EffectiveGrants, ExceptionalGrant, Membership};
use crate::access::audit::AuditEntry;
use crate::access::evaluator::RequestContext;
use crate::core::errors::{AccessError, AuditWriteError, StorageError};
use crate::core::types::{AccessResult, CapabilityCode, GroupCode, UserId};
use std::collections::HashSet;
use std::time::SystemTime;

/// User-to-group assignment rows.
///
/// Expiration is evaluated authoritatively at read time inside
/// `effective_groups_of`, regardless of any housekeeping sweep.
pub trait MembershipStore: Send + Sync {
    /// Groups whose membership is active and unexpired as of the timestamp
    fn effective_groups_of(
        &self,
        user: UserId,
        as_of: SystemTime,
    ) -> Result<HashSet<GroupCode>, StorageError>;

    /// Create or reactivate a membership.
    ///
    /// The (user, group) pair is a natural key: re-assigning updates
    /// expiration and metadata in place instead of creating a duplicate row.
    fn assign(&self, membership: Membership) -> Result<(), AccessError>;

    /// Deactivate a membership; `NotFound` if no row exists for the pair
    fn revoke(&self, user: UserId, group: &str) -> Result<(), AccessError>;

    /// All rows for a user, effective or not, for administrative listings
    fn memberships_of(&self, user: UserId) -> Result<Vec<Membership>, StorageError>;
}

/// Per-user, per-capability override rows
pub trait ExceptionalGrantStore: Send + Sync {
    /// Currently-effective grant and revoke codes as of the timestamp
    fn effective_grants(
        &self,
        user: UserId,
        as_of: SystemTime,
    ) -> Result<EffectiveGrants, StorageError>;

    /// Append a validated override row; rows for the same (user,
    /// capability) accumulate rather than replace each other
    fn insert(&self, grant: ExceptionalGrant) -> Result<(), AccessError>;

    /// All rows for a user, effective or not, for administrative listings
    fn grants_of(&self, user: UserId) -> Result<Vec<ExceptionalGrant>, StorageError>;
}

/// Append-only record of decisions and administrative actions.
///
/// `record` must be safe to call concurrently from many evaluation calls
/// without losing entries. There is no update or delete in the contract;
/// persistence failures propagate, entries are never dropped silently.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditWriteError>;
}

/// Core authorization interface exposed to all surrounding code
pub trait Authorizer: Send + Sync {
    /// Decide whether a user may exercise a capability
    fn authorize(
        &self,
        user: UserId,
        capability: &str,
        context: &RequestContext,
    ) -> AccessResult<AccessDecision>;

    /// Every capability currently held by a user
    fn effective_capabilities(&self, user: UserId) -> AccessResult<HashSet<CapabilityCode>>;

    /// Batch authorization over several capabilities
    fn authorize_batch(
        &self,
        user: UserId,
        capabilities: &[&str],
        context: &RequestContext,
    ) -> Vec<AccessResult<AccessDecision>> {
        capabilities
            .iter()
            .map(|capability| self.authorize(user, capability, context))
            .collect()
    }
}
