//! Driver and capability traits.
//!
//! This module defines the contracts a backend implements to take part in the
//! topology. It provides:
//! 1. **Lifecycle:** `TargetDriver` with optional `probe`/`release` hooks and a translate hook.
//! 2. **Capabilities:** `PibAccess`, `FsiAccess`, `MemAccess` and `ChipopAccess`.
//! 3. **Downcasting:** `as_*_mut` casts returning `None` unless the driver provides the capability.
//!
//! Capability presence is a property of the driver type. It is sampled once at
//! attach and cached on the target, so resolution never has to borrow a
//! driver.

use std::fmt;

use crate::common::Result;
use crate::sbefifo::Session;

use super::node::{Target, TargetId};
use super::topology::Topology;

/// Address translation hook: maps an address seen below `target` to the
/// address its parent sees.
pub type TranslateFn = fn(&Target, u64) -> u64;

/// Backend bound to a target through its compatible string.
pub trait TargetDriver: fmt::Debug {
    /// Class tag used when the description does not name one.
    fn class(&self) -> &str;

    /// Checks that the unit is present. An error marks it `Nonexistent`.
    fn probe(&mut self, _topo: &mut Topology, _id: TargetId) -> Result<()> {
        Ok(())
    }

    /// Releases resources taken by `probe`. Only called on enabled targets.
    fn release(&mut self, _topo: &mut Topology, _id: TargetId) -> Result<()> {
        Ok(())
    }

    /// Returns the translate hook for this unit, if it rewrites addresses.
    fn translator(&self) -> Option<TranslateFn> {
        None
    }

    /// Returns `self` as a PIB access provider if supported.
    fn as_pib_mut(&mut self) -> Option<&mut dyn PibAccess> {
        None
    }
    /// Returns `self` as an FSI access provider if supported.
    fn as_fsi_mut(&mut self) -> Option<&mut dyn FsiAccess> {
        None
    }
    /// Returns `self` as a memory access provider if supported.
    fn as_mem_mut(&mut self) -> Option<&mut dyn MemAccess> {
        None
    }
    /// Returns `self` as an SBE chip-op provider if supported.
    fn as_chipop_mut(&mut self) -> Option<&mut dyn ChipopAccess> {
        None
    }
}

/// SCOM register access over the PIB.
pub trait PibAccess {
    /// Reads the 64-bit register at `addr`.
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64) -> Result<u64>;
    /// Writes the 64-bit register at `addr`.
    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, value: u64) -> Result<()>;
}

/// CFAM register access over FSI.
pub trait FsiAccess {
    /// Reads the 32-bit CFAM register at `addr`.
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u32) -> Result<u32>;
    /// Writes the 32-bit CFAM register at `addr`.
    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u32, value: u32) -> Result<()>;
}

/// Host memory access.
pub trait MemAccess {
    /// Fills `buf` from memory starting at `addr`.
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64, buf: &mut [u8]) -> Result<()>;
    /// Writes `data` to memory starting at `addr`.
    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, data: &[u8]) -> Result<()>;
}

/// Access to an SBE FIFO session.
pub trait ChipopAccess {
    /// Returns the connected session.
    fn session(&mut self) -> Result<&mut Session>;
}

/// Capability kinds the dispatcher can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// SCOM access.
    Pib,
    /// CFAM access.
    Fsi,
    /// Memory access.
    Mem,
    /// SBE chip-ops.
    Chipop,
}

impl Capability {
    /// Short name used in errors and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pib => "pib",
            Self::Fsi => "fsi",
            Self::Mem => "mem",
            Self::Chipop => "chipop",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Pib => 1 << 0,
            Self::Fsi => 1 << 1,
            Self::Mem => 1 << 2,
            Self::Chipop => 1 << 3,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of capabilities a target provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    /// Samples the capability casts of a driver.
    pub fn of(driver: &mut dyn TargetDriver) -> Self {
        let mut caps = Self::default();
        if driver.as_pib_mut().is_some() {
            caps.0 |= Capability::Pib.bit();
        }
        if driver.as_fsi_mut().is_some() {
            caps.0 |= Capability::Fsi.bit();
        }
        if driver.as_mem_mut().is_some() {
            caps.0 |= Capability::Mem.bit();
        }
        if driver.as_chipop_mut().is_some() {
            caps.0 |= Capability::Chipop.bit();
        }
        caps
    }

    /// Returns `true` if `cap` is in the set.
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Returns `true` if the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
