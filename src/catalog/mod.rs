/*!
 * Catalog Module
 * Reference data: capability registry and functional group bundles
 */

pub mod capability;
pub mod group;

pub use capability::{Capability, CapabilityCatalog, Sensitivity};
pub use group::{Group, GroupCatalog};
