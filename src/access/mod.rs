/*!
 * Access Module
 * Capability-based permission evaluation, storage seams, and audit trail
 *
 * This module is the single source of truth for allow/deny decisions.
 * Surrounding application code asks one question through two operations:
 * `authorize` for one capability, `effective_capabilities` for the whole
 * set a user currently holds.
 *
 * ## Features
 * - Fixed-precedence decision pipeline (catalog, revoke, grant, group)
 * - Time-bounded memberships and exceptional overrides, checked at read time
 * - Mandatory, append-only auditing for sensitive capabilities and denials
 * - TTL-bounded decision caching with per-user invalidation
 *
 * ## Usage
 * ```ignore
 * use access_engine::access::{AccessManager, Authorizer, RequestContext};
 *
 * let manager = AccessManager::new(capabilities, groups);
 * manager.assign_group(user, "frontline", None, admin, None)?;
 *
 * let decision = manager.authorize(user, "ops.calls.make", &RequestContext::new())?;
 * if decision.is_allowed() {
 *     // Perform operation
 * }
 * ```
 */

pub mod audit;
pub mod cache;
pub mod evaluator;
pub mod manager;
pub mod stores;
pub mod types;

// Re-export commonly used items
pub use audit::{AuditAction, AuditEntry, AuditSeverity, AuditStats, MemoryAuditSink};
pub use cache::{CacheStats, DecisionCache};
pub use evaluator::{EvaluationContext, Evaluator, RequestContext, Stage, StageDecision};
pub use manager::{AccessManager, EngineConfig};
pub use stores::{MemoryExceptionalGrantStore, MemoryMembershipStore};
pub use types::{
    AccessDecision, AccessRequest, AuditSink, Authorizer, EffectiveGrants, ExceptionalGrant,
    ExceptionalGrantStore, GrantKind, Membership, MembershipStore, Outcome,
};
