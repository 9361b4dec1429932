/*!
 * Evaluation Context
 * Caller-supplied request context and per-call evaluation state
 */

use crate::access::types::core::EffectiveGrants;
use crate::access::types::traits::ExceptionalGrantStore;
use crate::core::errors::StorageError;
use crate::core::types::UserId;
use ahash::HashMap;
use std::net::IpAddr;
use std::time::SystemTime;

/// Caller-supplied context for one authorization request.
///
/// Everything here is optional: the resource reference and network origin
/// flow into audit entries, the deadline bounds the evaluation itself.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Reference to the concrete resource being acted on
    pub resource: Option<String>,
    /// Network origin of the caller
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    /// Free-form metadata carried into audit entries
    pub metadata: HashMap<String, String>,
    /// Evaluation must finish before this instant or fail with an error
    pub deadline: Option<SystemTime>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_deadline(mut self, deadline: SystemTime) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Per-call evaluation state shared by the pipeline stages.
///
/// The exceptional-grant lookup is memoized so the revoke and grant
/// stages share one store read.
pub struct EvaluationContext {
    /// Reference timestamp for every window and expiration check
    pub as_of: SystemTime,
    grants: Option<EffectiveGrants>,
}

impl EvaluationContext {
    pub fn new(as_of: SystemTime) -> Self {
        Self {
            as_of,
            grants: None,
        }
    }

    /// Effective overrides for the user, fetched once per evaluation
    pub fn effective_grants(
        &mut self,
        store: &dyn ExceptionalGrantStore,
        user: UserId,
    ) -> Result<&EffectiveGrants, StorageError> {
        let grants = match self.grants.take() {
            Some(grants) => grants,
            None => store.effective_grants(user, self.as_of)?,
        };
        Ok(self.grants.insert(grants))
    }
}
