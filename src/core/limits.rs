/*!
 * Engine Limits and Constants
 * Centralized defaults for tunable engine knobs
 */

use std::time::Duration;

/// Maximum cached authorization decisions before eviction
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// How long a cached decision may be served.
///
/// Bounds the staleness window for expiring memberships and grants; the
/// cache is additionally invalidated on every mutation touching a user.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);
