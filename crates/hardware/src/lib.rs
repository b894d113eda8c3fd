//! POWER processor debug access library.
//!
//! This crate models a host's view of POWER processors as a tree of targets
//! and routes register and memory accesses through it:
//! 1. **Topology:** Targets, properties, aliases, probe and release.
//! 2. **Dispatch:** Capability resolution with per-unit address translation.
//! 3. **Chips:** SCOM address fields and translate tables for P8, P9 and P10.
//! 4. **SBE FIFO:** Framing, status and FFDC decoding, and the chip-op catalogue.
//! 5. **Drivers:** Kernel device files, FSI-to-PIB, ADU, SBE-backed access and chip units.
//! 6. **Configuration:** Tunables and topology descriptions loaded from JSON.

/// SCOM address fields and per-generation translation.
pub mod chip;
/// Common types and constants (errors, bit helpers, property names).
pub mod common;
/// Configuration (tunables and topology descriptions).
pub mod config;
/// Capability resolution and bus entry points.
pub mod dispatch;
/// Built-in target drivers.
pub mod drivers;
/// SBE FIFO protocol codec and session.
pub mod sbefifo;
/// Target tree, properties and probe engine.
pub mod target;

/// Tunables; use `Config::default()` or load from JSON.
pub use crate::config::{Config, TopologyConfig};
/// Error type and result alias shared by every module.
pub use crate::common::{Error, ProtocolError, Result};
/// Driver lookup by compatible string.
pub use crate::drivers::DriverRegistry;
/// SBE FIFO session; owns one transport.
pub use crate::sbefifo::Session;
/// Target tree; build with `Topology::from_config`.
pub use crate::target::{Status, TargetId, Topology};
