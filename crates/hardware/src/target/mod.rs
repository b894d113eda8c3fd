//! Hardware target topology.
//!
//! This module models the hierarchy of hardware units. It includes:
//! 1. **Properties:** Untyped byte-string attributes per target.
//! 2. **Targets:** Nodes with class, index, status, and a bound driver.
//! 3. **Topology:** The arena owning every target, with class index and alias map.
//! 4. **Probe engine:** Memoized, parent-first probing and post-order release.
//! 5. **Builder:** Construction from a `TopologyConfig` description.

/// Construction from a description.
pub mod builder;

/// Target nodes and status.
pub mod node;

/// Probe and release.
pub mod probe;

/// Property store.
pub mod property;

/// Arena, class index, and aliases.
pub mod topology;

/// Driver and capability traits.
pub mod traits;

pub use node::{Status, Target, TargetId, parse_segment};
pub use property::PropertyStore;
pub use topology::Topology;
pub use traits::{
    Capabilities, Capability, ChipopAccess, FsiAccess, MemAccess, PibAccess, TargetDriver,
    TranslateFn,
};
