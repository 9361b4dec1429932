/*!
 * Decision Pipeline
 * Evaluates authorization requests through a fixed order of named stages
 */

use super::context::{EvaluationContext, RequestContext};
use crate::access::types::core::{AccessDecision, AccessRequest};
use crate::access::types::traits::{ExceptionalGrantStore, MembershipStore};
use crate::catalog::{CapabilityCatalog, GroupCatalog};
use crate::core::clock::Clock;
use crate::core::errors::AccessError;
use crate::core::types::{AccessResult, CapabilityCode, UserId};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

/// Stage decision: the first non-`Continue` result wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageDecision {
    Allow { reason: String },
    Deny { reason: String },
    Continue,
}

/// One named step of the decision pipeline.
///
/// The precedence contract lives in the stage order, not inside any
/// single stage; each stage answers only its own question.
pub trait Stage: Send + Sync {
    /// Stage name, also recorded on the decision it produces
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        request: &AccessRequest,
        ctx: &mut EvaluationContext,
    ) -> AccessResult<StageDecision>;
}

/// Denies unknown and inactive capabilities before anything else runs
struct CatalogStage {
    capabilities: Arc<CapabilityCatalog>,
}

impl Stage for CatalogStage {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        _ctx: &mut EvaluationContext,
    ) -> AccessResult<StageDecision> {
        match self.capabilities.resolve(&request.capability) {
            Some(_) => Ok(StageDecision::Continue),
            None => Ok(StageDecision::Deny {
                reason: format!("capability '{}' is unknown or inactive", request.capability),
            }),
        }
    }
}

/// An effective exceptional revoke overrides everything after it
struct RevokeStage {
    grants: Arc<dyn ExceptionalGrantStore>,
}

impl Stage for RevokeStage {
    fn name(&self) -> &'static str {
        "revoke"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        ctx: &mut EvaluationContext,
    ) -> AccessResult<StageDecision> {
        let effective = ctx.effective_grants(self.grants.as_ref(), request.user_id)?;
        if effective.is_revoked(&request.capability) {
            Ok(StageDecision::Deny {
                reason: format!("exceptional revoke in force for '{}'", request.capability),
            })
        } else {
            Ok(StageDecision::Continue)
        }
    }
}

/// An effective exceptional grant allows without any group membership
struct GrantStage {
    grants: Arc<dyn ExceptionalGrantStore>,
}

impl Stage for GrantStage {
    fn name(&self) -> &'static str {
        "grant"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        ctx: &mut EvaluationContext,
    ) -> AccessResult<StageDecision> {
        let effective = ctx.effective_grants(self.grants.as_ref(), request.user_id)?;
        if effective.is_granted(&request.capability) {
            Ok(StageDecision::Allow {
                reason: format!("exceptional grant in force for '{}'", request.capability),
            })
        } else {
            Ok(StageDecision::Continue)
        }
    }
}

/// Union of the user's effective groups decides, defaulting to deny
struct GroupStage {
    membership: Arc<dyn MembershipStore>,
    groups: Arc<GroupCatalog>,
}

impl Stage for GroupStage {
    fn name(&self) -> &'static str {
        "group"
    }

    fn evaluate(
        &self,
        request: &AccessRequest,
        ctx: &mut EvaluationContext,
    ) -> AccessResult<StageDecision> {
        let effective = self
            .membership
            .effective_groups_of(request.user_id, ctx.as_of)?;
        for group in &effective {
            if self.groups.capabilities_of(group).contains(&request.capability) {
                return Ok(StageDecision::Allow {
                    reason: format!("granted by group '{}'", group),
                });
            }
        }
        Ok(StageDecision::Deny {
            reason: format!("no effective group grants '{}'", request.capability),
        })
    }
}

/// Pure decision function over the catalogs and stores.
///
/// Stateless per call: all state lives in the backing stores, so
/// evaluations may run concurrently against the same or different users.
pub struct Evaluator {
    capabilities: Arc<CapabilityCatalog>,
    groups: Arc<GroupCatalog>,
    membership: Arc<dyn MembershipStore>,
    grants: Arc<dyn ExceptionalGrantStore>,
    clock: Arc<dyn Clock>,
    stages: Vec<Box<dyn Stage>>,
}

impl Evaluator {
    pub fn new(
        capabilities: Arc<CapabilityCatalog>,
        groups: Arc<GroupCatalog>,
        membership: Arc<dyn MembershipStore>,
        grants: Arc<dyn ExceptionalGrantStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // Precedence order: catalog, then revoke, then grant, then group.
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(CatalogStage {
                capabilities: capabilities.clone(),
            }),
            Box::new(RevokeStage {
                grants: grants.clone(),
            }),
            Box::new(GrantStage {
                grants: grants.clone(),
            }),
            Box::new(GroupStage {
                membership: membership.clone(),
                groups: groups.clone(),
            }),
        ];
        Self {
            capabilities,
            groups,
            membership,
            grants,
            clock,
            stages,
        }
    }

    /// Run the pipeline; the first stage to allow or deny wins.
    ///
    /// A deadline in the request context is re-checked before every stage
    /// so a cancelled caller gets an error, never a default decision.
    pub fn evaluate(
        &self,
        request: &AccessRequest,
        context: &RequestContext,
    ) -> AccessResult<AccessDecision> {
        debug!(
            "evaluating user {} for capability '{}'",
            request.user_id, request.capability
        );
        let mut ctx = EvaluationContext::new(request.requested_at);
        for stage in &self.stages {
            if let Some(deadline) = context.deadline {
                if self.clock.now() > deadline {
                    return Err(AccessError::DeadlineExceeded);
                }
            }
            match stage.evaluate(request, &mut ctx)? {
                StageDecision::Allow { reason } => {
                    debug!("stage '{}' allowed: {}", stage.name(), reason);
                    return Ok(AccessDecision::allow(request.clone(), stage.name(), reason));
                }
                StageDecision::Deny { reason } => {
                    debug!("stage '{}' denied: {}", stage.name(), reason);
                    return Ok(AccessDecision::deny(request.clone(), stage.name(), reason));
                }
                StageDecision::Continue => continue,
            }
        }
        // Unreachable with the standard pipeline: the group stage always
        // decides. Kept as the fail-closed backstop.
        Ok(AccessDecision::deny(
            request.clone(),
            "default",
            "no stage reached a decision",
        ))
    }

    /// Every capability the user currently holds: the union of group
    /// bundles, plus effective grants, minus effective revokes, filtered
    /// to capabilities that still resolve as active.
    pub fn effective_capabilities(
        &self,
        user: UserId,
        as_of: SystemTime,
    ) -> AccessResult<HashSet<CapabilityCode>> {
        let mut codes: HashSet<CapabilityCode> = HashSet::new();
        for group in self.membership.effective_groups_of(user, as_of)? {
            codes.extend(self.groups.capabilities_of(&group));
        }
        let overrides = self.grants.effective_grants(user, as_of)?;
        codes.extend(overrides.grants.iter().cloned());
        codes.retain(|code| self.capabilities.resolve(code).is_some());
        for code in &overrides.revokes {
            codes.remove(code);
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::stores::{MemoryExceptionalGrantStore, MemoryMembershipStore};
    use crate::access::types::core::{ExceptionalGrant, Membership};
    use crate::catalog::{Capability, Group};
    use crate::core::clock::ManualClock;
    use std::time::Duration;

    const T0: SystemTime = SystemTime::UNIX_EPOCH;

    struct Fixture {
        capabilities: Arc<CapabilityCatalog>,
        groups: Arc<GroupCatalog>,
        membership: Arc<MemoryMembershipStore>,
        grants: Arc<MemoryExceptionalGrantStore>,
        evaluator: Evaluator,
    }

    fn fixture() -> Fixture {
        let capabilities = Arc::new(CapabilityCatalog::new());
        capabilities.register(Capability::new("ops.calls.make", "Place calls"));
        let groups = Arc::new(GroupCatalog::new());
        groups.register(Group::new("frontline", "Frontline agents"));
        groups.attach("frontline", "ops.calls.make");
        let membership = Arc::new(MemoryMembershipStore::new());
        let grants = Arc::new(MemoryExceptionalGrantStore::new());
        let evaluator = Evaluator::new(
            capabilities.clone(),
            groups.clone(),
            membership.clone(),
            grants.clone(),
            Arc::new(ManualClock::new(T0)),
        );
        Fixture {
            capabilities,
            groups,
            membership,
            grants,
            evaluator,
        }
    }

    fn request(capability: &str) -> AccessRequest {
        AccessRequest::new(1, capability, T0 + Duration::from_secs(1))
    }

    #[test]
    fn test_unknown_capability_denied_by_catalog_stage() {
        let f = fixture();
        let decision = f
            .evaluator
            .evaluate(&request("no.such.capability"), &RequestContext::new())
            .unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(decision.stage, "catalog");
    }

    #[test]
    fn test_group_membership_allows() {
        let f = fixture();
        f.membership
            .assign(Membership::new(1, "frontline", 9, T0))
            .unwrap();

        let decision = f
            .evaluator
            .evaluate(&request("ops.calls.make"), &RequestContext::new())
            .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.stage, "group");
    }

    #[test]
    fn test_revoke_beats_grant_and_group() {
        let f = fixture();
        f.membership
            .assign(Membership::new(1, "frontline", 9, T0))
            .unwrap();
        f.grants
            .insert(ExceptionalGrant::grant(1, "ops.calls.make", "coverage", 9, T0))
            .unwrap();
        f.grants
            .insert(ExceptionalGrant::revoke(1, "ops.calls.make", "incident", 9, T0))
            .unwrap();

        let decision = f
            .evaluator
            .evaluate(&request("ops.calls.make"), &RequestContext::new())
            .unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(decision.stage, "revoke");
    }

    #[test]
    fn test_grant_allows_without_membership() {
        let f = fixture();
        f.grants
            .insert(ExceptionalGrant::grant(1, "ops.calls.make", "coverage", 9, T0))
            .unwrap();

        let decision = f
            .evaluator
            .evaluate(&request("ops.calls.make"), &RequestContext::new())
            .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.stage, "grant");
    }

    #[test]
    fn test_default_deny_without_any_source() {
        let f = fixture();
        let decision = f
            .evaluator
            .evaluate(&request("ops.calls.make"), &RequestContext::new())
            .unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(decision.stage, "group");
    }

    #[test]
    fn test_expired_deadline_is_an_error() {
        let f = fixture();
        let context = RequestContext::new().with_deadline(T0 - Duration::from_secs(1));
        let err = f
            .evaluator
            .evaluate(&request("ops.calls.make"), &context)
            .unwrap_err();
        assert_eq!(err, AccessError::DeadlineExceeded);
    }

    #[test]
    fn test_effective_capabilities_precedence() {
        let f = fixture();
        f.capabilities
            .register(Capability::new("finance.payouts.approve", "Approve payouts"));
        f.groups.attach("frontline", "ops.calls.view");
        f.membership
            .assign(Membership::new(1, "frontline", 9, T0))
            .unwrap();
        f.grants
            .insert(ExceptionalGrant::grant(1, "finance.payouts.approve", "quarter close", 9, T0))
            .unwrap();
        f.grants
            .insert(ExceptionalGrant::revoke(1, "ops.calls.make", "incident", 9, T0))
            .unwrap();

        let codes = f
            .evaluator
            .effective_capabilities(1, T0 + Duration::from_secs(1))
            .unwrap();
        // Grant added, revoke removed, unregistered code filtered out
        assert!(codes.contains("finance.payouts.approve"));
        assert!(!codes.contains("ops.calls.make"));
        assert!(!codes.contains("ops.calls.view"));
    }
}
