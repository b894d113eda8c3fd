//! Capability dispatch.
//!
//! An access starts at any target and walks toward the root until it meets a
//! target providing the requested capability. On the way:
//! 1. **Virtual nodes** are replaced by the concrete node they alias.
//! 2. **Translate hooks** rewrite the address for units that have one.
//! 3. **Base offsets** from `reg` are added for units that do not.
//!
//! The capability-bearing target must be `Enabled`; nothing is retried.

/// Chip-op (SBE) entry points.
pub mod chipop;
/// FSI entry points.
pub mod fsi;
/// Memory entry points.
pub mod mem;
/// PIB entry points and indirect SCOM.
pub mod pib;
/// Per-target sweeps.
pub mod sweep;

use tracing::debug;

use crate::common::{Error, Result};
use crate::target::{Capability, ChipopAccess, FsiAccess, MemAccess, PibAccess, Status, TargetId, Topology};

impl Topology {
    /// Finds the target providing `cap` for an access starting at `start`.
    ///
    /// Returns the capability-bearing target and the address it should see.
    pub fn resolve(&self, start: TargetId, cap: Capability, addr: u64) -> Result<(TargetId, u64)> {
        let mut id = self.to_real(start);
        let mut addr = addr;
        loop {
            let target = self.target(id);
            if target.capabilities().contains(cap) {
                break;
            }
            addr = match target.translator() {
                Some(translate) => translate(target, addr),
                None => addr.wrapping_add(self.base_offset(id)?),
            };
            id = match target.parent() {
                Some(parent) => self.to_real(parent),
                None => {
                    return Err(Error::NoCapability {
                        path: self.path(start),
                        capability: cap.name(),
                    });
                }
            };
        }

        let status = self.status(id);
        if status != Status::Enabled {
            return Err(Error::NotEnabled {
                path: self.path(id),
                status,
            });
        }
        debug!(from = %self.path(start), to = %self.path(id), %cap, addr = format_args!("{addr:#x}"), "resolved");
        Ok((id, addr))
    }

    fn no_capability(&self, id: TargetId, cap: Capability) -> Error {
        Error::NoCapability {
            path: self.path(id),
            capability: cap.name(),
        }
    }

    /// Runs `f` against the PIB provider bound to `id`.
    pub(crate) fn with_pib<R>(
        &mut self,
        id: TargetId,
        f: impl FnOnce(&mut dyn PibAccess, &mut Self) -> Result<R>,
    ) -> Result<R> {
        self.with_driver(id, |driver, topo| driver.as_pib_mut().map(|pib| f(pib, topo)))?
            .flatten()
            .unwrap_or_else(|| Err(self.no_capability(id, Capability::Pib)))
    }

    /// Runs `f` against the FSI provider bound to `id`.
    pub(crate) fn with_fsi<R>(
        &mut self,
        id: TargetId,
        f: impl FnOnce(&mut dyn FsiAccess, &mut Self) -> Result<R>,
    ) -> Result<R> {
        self.with_driver(id, |driver, topo| driver.as_fsi_mut().map(|fsi| f(fsi, topo)))?
            .flatten()
            .unwrap_or_else(|| Err(self.no_capability(id, Capability::Fsi)))
    }

    /// Runs `f` against the memory provider bound to `id`.
    pub(crate) fn with_mem<R>(
        &mut self,
        id: TargetId,
        f: impl FnOnce(&mut dyn MemAccess, &mut Self) -> Result<R>,
    ) -> Result<R> {
        self.with_driver(id, |driver, topo| driver.as_mem_mut().map(|mem| f(mem, topo)))?
            .flatten()
            .unwrap_or_else(|| Err(self.no_capability(id, Capability::Mem)))
    }

    /// Runs `f` against the chip-op provider bound to `id`.
    pub(crate) fn with_chipop_driver<R>(
        &mut self,
        id: TargetId,
        f: impl FnOnce(&mut dyn ChipopAccess) -> Result<R>,
    ) -> Result<R> {
        self.with_driver(id, |driver, _| driver.as_chipop_mut().map(f))?
            .flatten()
            .unwrap_or_else(|| Err(self.no_capability(id, Capability::Chipop)))
    }
}
