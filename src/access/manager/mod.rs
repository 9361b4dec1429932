/*!
 * Access Manager Module
 * Facade over catalogs, stores, evaluator, cache, and audit
 */

pub mod manager;

pub use manager::{AccessManager, EngineConfig};
