/*!
 * Access Types Module
 * Core types and traits for the authorization subsystem
 */

pub mod core;
pub mod traits;

pub use core::{
    AccessDecision, AccessRequest, EffectiveGrants, ExceptionalGrant, GrantKind, Membership,
    Outcome,
};
pub use traits::{AuditSink, Authorizer, ExceptionalGrantStore, MembershipStore};
