/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Group,
    Capability,
    Membership,
    Grant,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::User => "user",
            ResourceKind::Group => "group",
            ResourceKind::Capability => "capability",
            ResourceKind::Membership => "membership",
            ResourceKind::Grant => "grant",
        };
        f.write_str(name)
    }
}

/// Backing-store failures, surfaced distinct from `denied`
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StorageError {
    #[error("store unreachable: {0}")]
    #[diagnostic(
        code(access::store_unreachable),
        help("The backing store did not respond. Callers must fail closed, not treat this as denied.")
    )]
    Unreachable(String),

    #[error("store returned an inconsistent result: {0}")]
    #[diagnostic(
        code(access::store_inconsistent),
        help("The store answered but the result violates an engine invariant. Check store health.")
    )]
    Inconsistent(String),
}

/// Audit persistence failed after a decision was already computed
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AuditWriteError {
    #[error("audit sink unavailable: {0}")]
    #[diagnostic(
        code(audit::sink_unavailable),
        help("The decision stands; retry the audit write or escalate.")
    )]
    Unavailable(String),

    #[error("audit sink rejected entry: {0}")]
    #[diagnostic(
        code(audit::entry_rejected),
        help("The decision stands; the entry was malformed or refused by the sink.")
    )]
    Rejected(String),
}

/// Engine-level errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AccessError {
    #[error("validation failed: {reason}")]
    #[diagnostic(
        code(access::validation_failed),
        help("Malformed input to a mutation. Fix the arguments and retry; no state was changed.")
    )]
    Validation { reason: String },

    #[error("{kind} not found: {key}")]
    #[diagnostic(
        code(access::not_found),
        help("The referenced record does not exist. Authorization reads collapse this into denied.")
    )]
    NotFound { kind: ResourceKind, key: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    AuditWrite(#[from] AuditWriteError),

    #[error("deadline exceeded before a decision could be reached")]
    #[diagnostic(
        code(access::deadline_exceeded),
        help("The caller's deadline elapsed. No decision was made; never treat this as allowed.")
    )]
    DeadlineExceeded,
}

impl AccessError {
    /// Validation error from any displayable reason
    pub fn validation(reason: impl Into<String>) -> Self {
        AccessError::Validation {
            reason: reason.into(),
        }
    }

    /// NotFound error for a record kind and its natural key
    pub fn not_found(kind: ResourceKind, key: impl Into<String>) -> Self {
        AccessError::NotFound {
            kind,
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = AccessError::not_found(ResourceKind::Group, "frontline");
        assert_eq!(err.to_string(), "group not found: frontline");
    }

    #[test]
    fn test_storage_error_is_distinct_from_denied() {
        let err: AccessError = StorageError::Unreachable("membership db down".into()).into();
        assert!(matches!(err, AccessError::Storage(_)));
    }

    #[test]
    fn test_serde_tagging() {
        let err = AccessError::validation("reason is required");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("validation"));
    }
}
