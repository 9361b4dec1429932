/*!
 * Access Types
 * Core types for authorization requests, decisions, and per-user rows
 */

use crate::core::errors::{AccessError, AuditWriteError};
use crate::core::types::{CapabilityCode, GroupCode, UserId};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::HashSet;
use std::time::SystemTime;

/// Outcome of an authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Granted,
    Denied,
}

/// One authorization question: may `user_id` exercise `capability`?
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessRequest {
    pub user_id: UserId,
    pub capability: CapabilityCode,
    /// Reference timestamp every expiration and window check uses
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub requested_at: SystemTime,
}

impl AccessRequest {
    pub fn new(
        user_id: UserId,
        capability: impl Into<CapabilityCode>,
        requested_at: SystemTime,
    ) -> Self {
        Self {
            user_id,
            capability: capability.into(),
            requested_at,
        }
    }
}

/// Authorization decision with the stage that produced it
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessDecision {
    /// Request that was evaluated
    pub request: AccessRequest,
    /// Whether access is granted
    pub allowed: bool,
    /// Pipeline stage that decided
    pub stage: String,
    /// Reason for the decision
    pub reason: String,
    /// Decision time
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub decided_at: SystemTime,
    /// Whether result was served from cache
    #[serde(default)]
    pub cached: bool,
    /// Set when the mandatory audit write failed after the decision was
    /// computed; the decision itself is unaffected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_error: Option<AuditWriteError>,
}

impl AccessDecision {
    /// Create allowed decision
    pub fn allow(request: AccessRequest, stage: impl Into<String>, reason: impl Into<String>) -> Self {
        let decided_at = request.requested_at;
        Self {
            request,
            allowed: true,
            stage: stage.into(),
            reason: reason.into(),
            decided_at,
            cached: false,
            audit_error: None,
        }
    }

    /// Create denied decision
    pub fn deny(request: AccessRequest, stage: impl Into<String>, reason: impl Into<String>) -> Self {
        let decided_at = request.requested_at;
        Self {
            request,
            allowed: false,
            stage: stage.into(),
            reason: reason.into(),
            decided_at,
            cached: false,
            audit_error: None,
        }
    }

    /// Mark as cached
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn outcome(&self) -> Outcome {
        if self.allowed {
            Outcome::Granted
        } else {
            Outcome::Denied
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// One user-in-group row, keyed by the (user, group) natural key
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Membership {
    pub user_id: UserId,
    pub group: GroupCode,
    /// `None` means permanent
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<SystemTime>,
    pub active: bool,
    pub assigned_by: UserId,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub assigned_at: SystemTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Membership {
    pub fn new(
        user_id: UserId,
        group: impl Into<GroupCode>,
        assigned_by: UserId,
        assigned_at: SystemTime,
    ) -> Self {
        Self {
            user_id,
            group: group.into(),
            expires_at: None,
            active: true,
            assigned_by,
            assigned_at,
            reason: None,
        }
    }

    pub fn expiring(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Currently applicable as of the reference timestamp.
    ///
    /// The upper bound is exclusive: a membership expiring exactly at
    /// `as_of` is already expired.
    pub fn is_effective(&self, as_of: SystemTime) -> bool {
        self.active && self.expires_at.map_or(true, |expires| expires > as_of)
    }
}

/// Direction of an exceptional per-user override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    Grant,
    Revoke,
}

/// Explicit per-user override of one capability, optionally time-bounded.
///
/// Multiple rows may coexist for the same (user, capability); every
/// currently-effective row is considered and revoke always wins.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExceptionalGrant {
    pub user_id: UserId,
    pub capability: CapabilityCode,
    pub kind: GrantKind,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub starts_at: SystemTime,
    /// `None` means permanent
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<SystemTime>,
    pub reason: String,
    pub authorized_by: UserId,
    pub active: bool,
}

impl ExceptionalGrant {
    pub fn grant(
        user_id: UserId,
        capability: impl Into<CapabilityCode>,
        reason: impl Into<String>,
        authorized_by: UserId,
        starts_at: SystemTime,
    ) -> Self {
        Self {
            user_id,
            capability: capability.into(),
            kind: GrantKind::Grant,
            starts_at,
            ends_at: None,
            reason: reason.into(),
            authorized_by,
            active: true,
        }
    }

    pub fn revoke(
        user_id: UserId,
        capability: impl Into<CapabilityCode>,
        reason: impl Into<String>,
        authorized_by: UserId,
        starts_at: SystemTime,
    ) -> Self {
        Self {
            kind: GrantKind::Revoke,
            ..Self::grant(user_id, capability, reason, authorized_by, starts_at)
        }
    }

    pub fn until(mut self, ends_at: SystemTime) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// Currently applicable as of the reference timestamp.
    ///
    /// Unlike memberships, the end of the window is inclusive: a grant
    /// ending exactly at `as_of` is still in force.
    pub fn is_effective(&self, as_of: SystemTime) -> bool {
        self.active
            && self.starts_at <= as_of
            && self.ends_at.map_or(true, |ends| ends >= as_of)
    }

    /// Reject malformed rows before they reach a store
    pub fn validate(&self) -> Result<(), AccessError> {
        if self.reason.trim().is_empty() {
            return Err(AccessError::validation(
                "exceptional grants require a non-empty reason",
            ));
        }
        if let Some(ends) = self.ends_at {
            if ends <= self.starts_at {
                return Err(AccessError::validation("end of window must be after start"));
            }
        }
        Ok(())
    }
}

/// Effective exceptional overrides for one user at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EffectiveGrants {
    pub grants: HashSet<CapabilityCode>,
    pub revokes: HashSet<CapabilityCode>,
}

impl EffectiveGrants {
    pub fn is_granted(&self, capability: &str) -> bool {
        self.grants.contains(capability)
    }

    pub fn is_revoked(&self, capability: &str) -> bool {
        self.revokes.contains(capability)
    }
}
