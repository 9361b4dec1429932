/*!
 * Audit Trail
 * Append-only record of authorization decisions and administrative actions
 */

use crate::access::evaluator::RequestContext;
use crate::access::types::core::{AccessDecision, Outcome};
use crate::access::types::traits::AuditSink;
use crate::catalog::{Capability, Sensitivity};
use crate::core::errors::AuditWriteError;
use crate::core::types::{CapabilityCode, UserId};
use ahash::{HashMap, RandomState};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::net::IpAddr;
use std::time::SystemTime;
use uuid::Uuid;

/// What an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// An authorization decision
    Decision,
    /// Bulk capability discovery, recorded only when enabled per deployment
    Discovery,
    GroupAssigned,
    GroupRevoked,
    CapabilityGranted,
    CapabilityRevoked,
}

/// Audit entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// Immutable record of one decision or administrative action.
///
/// Surrogate id only; entries have no natural key. Once recorded an
/// entry is never updated, and it is retained independently of later
/// capability or group mutations.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEntry {
    pub id: Uuid,
    /// `None` for anonymous or system-initiated actions
    pub user_id: Option<UserId>,
    pub capability: CapabilityCode,
    pub action: AuditAction,
    /// `Granted` also covers successful administrative actions
    pub outcome: Outcome,
    pub severity: AuditSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub metadata: HashMap<String, String>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub recorded_at: SystemTime,
}

impl AuditEntry {
    /// Entry for an authorization decision.
    ///
    /// Severity follows the capability's sensitivity: allowed decisions
    /// log as info, denials on high or critical capabilities escalate.
    pub fn decision(
        decision: &AccessDecision,
        capability: Option<&Capability>,
        context: &RequestContext,
        recorded_at: SystemTime,
    ) -> Self {
        let severity = if decision.is_allowed() {
            AuditSeverity::Info
        } else {
            match capability.map(|cap| cap.sensitivity) {
                Some(Sensitivity::High) | Some(Sensitivity::Critical) => AuditSeverity::Critical,
                _ => AuditSeverity::Warning,
            }
        };

        Self {
            id: Uuid::new_v4(),
            user_id: Some(decision.request.user_id),
            capability: decision.request.capability.clone(),
            action: AuditAction::Decision,
            outcome: decision.outcome(),
            severity,
            resource: context.resource.clone(),
            ip: context.ip,
            user_agent: context.user_agent.clone(),
            metadata: context.metadata.clone(),
            recorded_at,
        }
    }

    /// Entry for a successful administrative action
    pub fn administrative(
        action: AuditAction,
        user_id: UserId,
        capability: impl Into<CapabilityCode>,
        recorded_at: SystemTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            capability: capability.into(),
            action,
            outcome: Outcome::Granted,
            severity: AuditSeverity::Info,
            resource: None,
            ip: None,
            user_agent: None,
            metadata: HashMap::default(),
            recorded_at,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_denial(&self) -> bool {
        self.action == AuditAction::Decision && self.outcome == Outcome::Denied
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_entries: usize,
    pub total_denials: u64,
    pub users_tracked: usize,
}

/// Reference implementation of [`AuditSink`].
///
/// Unbounded by design: the contract forbids dropping entries silently,
/// so there is no ring-buffer eviction here. Per-user indexes and denial
/// counters support the read-side queries.
pub struct MemoryAuditSink {
    /// Global append-only log
    entries: RwLock<Vec<AuditEntry>>,
    /// Per-user entry index
    user_entries: DashMap<UserId, Vec<AuditEntry>, RandomState>,
    /// Denial counters for monitoring
    denial_counts: DashMap<UserId, u64, RandomState>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            user_entries: DashMap::with_hasher(RandomState::new()),
            denial_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read();
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent entries for one user, newest first
    pub fn for_user(&self, user: UserId, limit: usize) -> Vec<AuditEntry> {
        self.user_entries
            .get(&user)
            .map(|entry| entry.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn denial_count(&self, user: UserId) -> u64 {
        self.denial_counts.get(&user).map(|count| *count).unwrap_or(0)
    }

    pub fn stats(&self) -> AuditStats {
        let total_entries = self.entries.read().len();
        let total_denials = self.denial_counts.iter().map(|entry| *entry.value()).sum();
        AuditStats {
            total_entries,
            total_denials,
            users_tracked: self.user_entries.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditWriteError> {
        if let Some(user) = entry.user_id {
            self.user_entries
                .entry(user)
                .or_default()
                .push(entry.clone());
            if entry.is_denial() {
                self.denial_counts
                    .entry(user)
                    .and_modify(|count| *count += 1)
                    .or_insert(1);
            }
        }
        self.entries.write().push(entry);
        Ok(())
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}
