/*!
 * Core Module
 * Fundamental engine types, errors, and the injectable time source
 */

pub mod clock;
pub mod errors;
pub mod limits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{AccessError, AuditWriteError, ResourceKind, StorageError};
pub use types::{AccessResult, CapabilityCode, GroupCode, UserId};
