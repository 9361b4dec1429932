/*!
 * Access Engine Library
 * Capability-based permission evaluation with mandatory auditing
 */

pub mod access;
pub mod catalog;
pub mod core;

// Re-exports
pub use crate::access::{
    AccessDecision, AccessManager, AccessRequest, AuditAction, AuditEntry, AuditSink,
    AuditSeverity, AuditStats, Authorizer, EffectiveGrants, EngineConfig, Evaluator,
    ExceptionalGrant, ExceptionalGrantStore, GrantKind, Membership, MembershipStore,
    MemoryAuditSink, MemoryExceptionalGrantStore, MemoryMembershipStore, Outcome, RequestContext,
};
pub use crate::catalog::{Capability, CapabilityCatalog, Group, GroupCatalog, Sensitivity};
pub use crate::core::{
    AccessError, AccessResult, AuditWriteError, CapabilityCode, Clock, GroupCode, ManualClock,
    ResourceKind, StorageError, SystemClock, UserId,
};
