/*!
 * Access Manager
 * Central entry point wiring catalogs, stores, evaluator, cache, and audit
 */

use crate::access::audit::{AuditAction, AuditEntry, AuditStats, MemoryAuditSink};
use crate::access::cache::{CacheStats, DecisionCache};
use crate::access::evaluator::{Evaluator, RequestContext};
use crate::access::stores::{MemoryExceptionalGrantStore, MemoryMembershipStore};
use crate::access::types::core::{AccessDecision, AccessRequest, ExceptionalGrant, Membership};
use crate::access::types::traits::{
    AuditSink, Authorizer, ExceptionalGrantStore, MembershipStore,
};
use crate::catalog::{CapabilityCatalog, GroupCatalog};
use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::{AccessError, ResourceKind};
use crate::core::limits::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::core::types::{AccessResult, CapabilityCode, UserId};
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Per-deployment engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Record an audit entry for bulk capability discovery calls
    pub audit_discovery: bool,
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_discovery: false,
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Central access manager.
///
/// Stateless per call: all state lives in the catalogs, stores, and the
/// audit sink, so one manager instance serves concurrent callers.
#[derive(Clone)]
pub struct AccessManager {
    capabilities: Arc<CapabilityCatalog>,
    groups: Arc<GroupCatalog>,
    membership: Arc<dyn MembershipStore>,
    grants: Arc<dyn ExceptionalGrantStore>,
    audit: Arc<MemoryAuditSink>,
    sink: Arc<dyn AuditSink>,
    evaluator: Arc<Evaluator>,
    cache: Option<Arc<DecisionCache>>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl AccessManager {
    /// Create a manager over in-memory stores and the in-memory sink
    pub fn new(capabilities: Arc<CapabilityCatalog>, groups: Arc<GroupCatalog>) -> Self {
        debug!("initializing access manager");
        let audit = Arc::new(MemoryAuditSink::new());
        let sink: Arc<dyn AuditSink> = audit.clone();
        Self::assemble(
            capabilities,
            groups,
            Arc::new(MemoryMembershipStore::new()),
            Arc::new(MemoryExceptionalGrantStore::new()),
            audit,
            sink,
            Arc::new(SystemClock),
            EngineConfig::default(),
        )
    }

    /// Replace the time source (deterministic tests pin this)
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(
            self.capabilities,
            self.groups,
            self.membership,
            self.grants,
            self.audit,
            self.sink,
            clock,
            self.config,
        )
    }

    /// Replace the membership store
    pub fn with_membership_store(self, membership: Arc<dyn MembershipStore>) -> Self {
        Self::assemble(
            self.capabilities,
            self.groups,
            membership,
            self.grants,
            self.audit,
            self.sink,
            self.clock,
            self.config,
        )
    }

    /// Replace the exceptional-grant store
    pub fn with_grant_store(self, grants: Arc<dyn ExceptionalGrantStore>) -> Self {
        Self::assemble(
            self.capabilities,
            self.groups,
            self.membership,
            grants,
            self.audit,
            self.sink,
            self.clock,
            self.config,
        )
    }

    /// Replace the audit sink decisions are recorded to.
    ///
    /// The in-memory sink keeps serving the read-side queries; the
    /// replacement receives every entry instead.
    pub fn with_audit_sink(self, sink: Arc<dyn AuditSink>) -> Self {
        Self::assemble(
            self.capabilities,
            self.groups,
            self.membership,
            self.grants,
            self.audit,
            sink,
            self.clock,
            self.config,
        )
    }

    /// Replace the configuration
    pub fn with_config(self, config: EngineConfig) -> Self {
        Self::assemble(
            self.capabilities,
            self.groups,
            self.membership,
            self.grants,
            self.audit,
            self.sink,
            self.clock,
            config,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        capabilities: Arc<CapabilityCatalog>,
        groups: Arc<GroupCatalog>,
        membership: Arc<dyn MembershipStore>,
        grants: Arc<dyn ExceptionalGrantStore>,
        audit: Arc<MemoryAuditSink>,
        sink: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let evaluator = Arc::new(Evaluator::new(
            capabilities.clone(),
            groups.clone(),
            membership.clone(),
            grants.clone(),
            clock.clone(),
        ));
        let cache = config
            .cache_enabled
            .then(|| Arc::new(DecisionCache::new(config.cache_capacity, config.cache_ttl)));
        Self {
            capabilities,
            groups,
            membership,
            grants,
            audit,
            sink,
            evaluator,
            cache,
            clock,
            config,
        }
    }

    /// Read-side audit queries of the built-in sink
    pub fn audit(&self) -> &MemoryAuditSink {
        &self.audit
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit.stats()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Drop cached decisions for a user
    pub fn invalidate_cache(&self, user: UserId) {
        if let Some(cache) = &self.cache {
            cache.invalidate_user(user);
        }
    }

    // -- administrative mutation surface ------------------------------------

    /// Assign a group to a user, or refresh an existing assignment.
    ///
    /// The successful mutation is itself audited; if that audit write
    /// fails the row is already persisted and the error reports the
    /// failed recording, not a failed assignment.
    pub fn assign_group(
        &self,
        user: UserId,
        group: &str,
        expires_at: Option<SystemTime>,
        assigned_by: UserId,
        reason: Option<String>,
    ) -> AccessResult<()> {
        if !self.groups.contains(group) {
            return Err(AccessError::not_found(ResourceKind::Group, group));
        }
        let now = self.clock.now();
        let mut membership = Membership::new(user, group, assigned_by, now);
        membership.expires_at = expires_at;
        membership.reason = reason;
        self.membership.assign(membership)?;
        self.invalidate_cache(user);

        let entry =
            AuditEntry::administrative(AuditAction::GroupAssigned, user, group_ref(group), now)
                .with_metadata("assigned_by", assigned_by.to_string())
                .with_metadata("temporary", expires_at.is_some().to_string());
        self.sink.record(entry)?;
        Ok(())
    }

    /// Deactivate a user's membership in a group
    pub fn revoke_group(&self, user: UserId, group: &str) -> AccessResult<()> {
        if !self.groups.contains(group) {
            return Err(AccessError::not_found(ResourceKind::Group, group));
        }
        self.membership.revoke(user, group)?;
        self.invalidate_cache(user);

        let now = self.clock.now();
        let entry =
            AuditEntry::administrative(AuditAction::GroupRevoked, user, group_ref(group), now);
        self.sink.record(entry)?;
        Ok(())
    }

    /// Grant one capability to one user, optionally until `ends_at`
    pub fn grant_capability(
        &self,
        user: UserId,
        capability: &str,
        reason: &str,
        authorized_by: UserId,
        ends_at: Option<SystemTime>,
    ) -> AccessResult<()> {
        self.insert_override(
            ExceptionalGrant::grant(user, capability, reason, authorized_by, self.clock.now()),
            ends_at,
            AuditAction::CapabilityGranted,
        )
    }

    /// Suspend one capability for one user, optionally until `ends_at`.
    ///
    /// While effective this overrides every group membership and every
    /// exceptional grant for the capability.
    pub fn revoke_capability(
        &self,
        user: UserId,
        capability: &str,
        reason: &str,
        authorized_by: UserId,
        ends_at: Option<SystemTime>,
    ) -> AccessResult<()> {
        self.insert_override(
            ExceptionalGrant::revoke(user, capability, reason, authorized_by, self.clock.now()),
            ends_at,
            AuditAction::CapabilityRevoked,
        )
    }

    fn insert_override(
        &self,
        mut row: ExceptionalGrant,
        ends_at: Option<SystemTime>,
        action: AuditAction,
    ) -> AccessResult<()> {
        if self.capabilities.resolve(&row.capability).is_none() {
            return Err(AccessError::not_found(
                ResourceKind::Capability,
                row.capability,
            ));
        }
        row.ends_at = ends_at;
        let user = row.user_id;
        let capability = row.capability.clone();
        let authorized_by = row.authorized_by;
        let reason = row.reason.clone();
        self.grants.insert(row)?;
        self.invalidate_cache(user);

        let entry = AuditEntry::administrative(action, user, capability, self.clock.now())
            .with_metadata("authorized_by", authorized_by.to_string())
            .with_metadata("reason", reason)
            .with_metadata("temporary", ends_at.is_some().to_string());
        self.sink.record(entry)?;
        Ok(())
    }
}

impl Authorizer for AccessManager {
    fn authorize(
        &self,
        user: UserId,
        capability: &str,
        context: &RequestContext,
    ) -> AccessResult<AccessDecision> {
        let now = self.clock.now();
        // A spent deadline must never be answered from cache either.
        if let Some(deadline) = context.deadline {
            if now > deadline {
                return Err(AccessError::DeadlineExceeded);
            }
        }

        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(user, capability, now));
        let mut decision = match cached {
            Some(decision) => {
                debug!("cache hit for user {} on '{}'", user, capability);
                decision
            }
            None => {
                let request = AccessRequest::new(user, capability, now);
                let decision = self.evaluator.evaluate(&request, context)?;
                if let Some(cache) = &self.cache {
                    cache.put(user, capability, decision.clone(), now);
                }
                decision
            }
        };

        if !decision.is_allowed() {
            warn!(
                "denied user {} capability '{}' at stage '{}': {}",
                user, capability, decision.stage, decision.reason
            );
        }

        // Audit completeness is per call: cached decisions are recorded
        // exactly like freshly computed ones.
        let must_audit = !decision.is_allowed() || self.capabilities.requires_audit(capability);
        if must_audit {
            let resolved = self.capabilities.resolve(capability);
            let entry = AuditEntry::decision(&decision, resolved.as_ref(), context, now);
            if let Err(err) = self.sink.record(entry) {
                warn!("audit write failed for user {}: {}", user, err);
                decision.audit_error = Some(err);
            }
        }

        Ok(decision)
    }

    fn effective_capabilities(&self, user: UserId) -> AccessResult<HashSet<CapabilityCode>> {
        let now = self.clock.now();
        let codes = self.evaluator.effective_capabilities(user, now)?;
        if self.config.audit_discovery {
            let entry = AuditEntry::administrative(AuditAction::Discovery, user, "*", now)
                .with_metadata("capability_count", codes.len().to_string());
            self.sink.record(entry)?;
        }
        Ok(codes)
    }
}

/// Audit reference for group-level actions, e.g. `group:frontline`
fn group_ref(group: &str) -> String {
    format!("group:{}", group)
}
