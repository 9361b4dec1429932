/*!
 * Core Types
 * Common types used across the access engine
 */

/// User identifier assigned by the surrounding platform
pub type UserId = u64;

/// Capability code in `domain.resource.action` form
pub type CapabilityCode = String;

/// Functional group code, e.g. `frontline`
pub type GroupCode = String;

/// Common result type for engine operations
pub type AccessResult<T> = Result<T, super::errors::AccessError>;
