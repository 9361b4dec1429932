/*!
 * Access Engine Property Tests
 * Universally-quantified invariants of the decision pipeline
 */

use access_engine::{
    AccessManager, Authorizer, Capability, CapabilityCatalog, Group, GroupCatalog, ManualClock,
    RequestContext, Sensitivity,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const T0: SystemTime = SystemTime::UNIX_EPOCH;
const ADMIN: u64 = 900;

struct Harness {
    manager: AccessManager,
    clock: Arc<ManualClock>,
}

fn harness(capability_active: bool) -> Harness {
    let capabilities = Arc::new(CapabilityCatalog::new());
    let mut capability = Capability::new("ops.calls.make", "Place calls")
        .with_sensitivity(Sensitivity::Normal);
    if !capability_active {
        capability = capability.inactive();
    }
    capabilities.register(capability);

    let groups = Arc::new(GroupCatalog::new());
    groups.register(Group::new("frontline", "Frontline agents"));
    groups.attach("frontline", "ops.calls.make");

    let clock = Arc::new(ManualClock::new(T0));
    let manager = AccessManager::new(capabilities, groups).with_clock(clock.clone());
    Harness { manager, clock }
}

fn configure(
    harness: &Harness,
    user: u64,
    member: bool,
    granted: bool,
    revoked: bool,
) {
    if member {
        harness
            .manager
            .assign_group(user, "frontline", None, ADMIN, None)
            .unwrap();
    }
    if granted {
        harness
            .manager
            .grant_capability(user, "ops.calls.make", "property case", ADMIN, None)
            .unwrap();
    }
    if revoked {
        harness
            .manager
            .revoke_capability(user, "ops.calls.make", "property case", ADMIN, None)
            .unwrap();
    }
}

proptest! {
    // Inactive capabilities deny for every user, members included.
    #[test]
    fn prop_inactive_capability_always_denies(
        user in 1u64..10_000,
        member in any::<bool>(),
    ) {
        let h = harness(false);
        if member {
            h.manager.assign_group(user, "frontline", None, ADMIN, None).unwrap();
        }

        let decision = h.manager.authorize(user, "ops.calls.make", &RequestContext::new()).unwrap();
        prop_assert!(!decision.is_allowed());
    }

    // An effective revoke denies no matter what else the user holds.
    #[test]
    fn prop_revoke_always_wins(
        user in 1u64..10_000,
        member in any::<bool>(),
        granted in any::<bool>(),
    ) {
        let h = harness(true);
        configure(&h, user, member, granted, true);

        let decision = h.manager.authorize(user, "ops.calls.make", &RequestContext::new()).unwrap();
        prop_assert!(!decision.is_allowed());
        prop_assert_eq!(decision.stage.as_str(), "revoke");
    }

    // With no revoke in force, an effective grant allows even without groups.
    #[test]
    fn prop_grant_allows_without_membership(
        user in 1u64..10_000,
        member in any::<bool>(),
    ) {
        let h = harness(true);
        configure(&h, user, member, true, false);

        let decision = h.manager.authorize(user, "ops.calls.make", &RequestContext::new()).unwrap();
        prop_assert!(decision.is_allowed());
    }

    // Default deny: no membership, no grant, no access.
    #[test]
    fn prop_default_is_deny(user in 1u64..10_000) {
        let h = harness(true);

        let decision = h.manager.authorize(user, "ops.calls.make", &RequestContext::new()).unwrap();
        prop_assert!(!decision.is_allowed());
    }

    // Membership expiry is exclusive at the boundary for any window length.
    #[test]
    fn prop_membership_expiry_boundary(
        user in 1u64..10_000,
        window_secs in 1u64..86_400,
    ) {
        let h = harness(true);
        let expires = T0 + Duration::from_secs(window_secs);
        h.manager.assign_group(user, "frontline", Some(expires), ADMIN, None).unwrap();

        h.clock.set(expires - Duration::from_secs(1));
        let before = h.manager.authorize(user, "ops.calls.make", &RequestContext::new()).unwrap();
        prop_assert!(before.is_allowed());

        // Reset the cached allow through a mutation, then probe the boundary
        h.manager.assign_group(user, "frontline", Some(expires), ADMIN, None).unwrap();
        h.clock.set(expires);
        let at = h.manager.authorize(user, "ops.calls.make", &RequestContext::new()).unwrap();
        prop_assert!(!at.is_allowed());
    }

    // Every authorize call on an audit-required capability records exactly
    // one decision entry, whatever the outcome.
    #[test]
    fn prop_audit_completeness(
        user in 1u64..10_000,
        member in any::<bool>(),
        granted in any::<bool>(),
        revoked in any::<bool>(),
        calls in 1usize..5,
    ) {
        let capabilities = Arc::new(CapabilityCatalog::new());
        capabilities.register(
            Capability::new("finance.payouts.approve", "Approve payouts")
                .with_sensitivity(Sensitivity::Critical)
                .audited(),
        );
        let groups = Arc::new(GroupCatalog::new());
        groups.register(Group::new("finance", "Finance office"));
        groups.attach("finance", "finance.payouts.approve");
        let manager = AccessManager::new(capabilities, groups)
            .with_clock(Arc::new(ManualClock::new(T0)));

        if member {
            manager.assign_group(user, "finance", None, ADMIN, None).unwrap();
        }
        if granted {
            manager
                .grant_capability(user, "finance.payouts.approve", "case", ADMIN, None)
                .unwrap();
        }
        if revoked {
            manager
                .revoke_capability(user, "finance.payouts.approve", "case", ADMIN, None)
                .unwrap();
        }

        for _ in 0..calls {
            manager
                .authorize(user, "finance.payouts.approve", &RequestContext::new())
                .unwrap();
        }

        let decisions = manager
            .audit()
            .for_user(user, 100)
            .into_iter()
            .filter(|entry| entry.action == access_engine::AuditAction::Decision)
            .count();
        prop_assert_eq!(decisions, calls);
    }
}
