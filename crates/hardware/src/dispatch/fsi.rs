//! FSI (CFAM) entry points.

use crate::common::{Error, Result};
use crate::target::{Capability, TargetId, Topology};

impl Topology {
    /// Reads a CFAM register as seen from `id`.
    pub fn fsi_read(&mut self, id: TargetId, addr: u32) -> Result<u32> {
        let (fsi, addr) = self.resolve_fsi(id, addr)?;
        self.with_fsi(fsi, |provider, topo| provider.read(topo, fsi, addr))
    }

    /// Writes a CFAM register as seen from `id`.
    pub fn fsi_write(&mut self, id: TargetId, addr: u32, value: u32) -> Result<()> {
        let (fsi, addr) = self.resolve_fsi(id, addr)?;
        self.with_fsi(fsi, |provider, topo| provider.write(topo, fsi, addr, value))
    }

    /// Read-modify-writes the bits of `value` selected by `mask`.
    pub fn fsi_write_mask(&mut self, id: TargetId, addr: u32, value: u32, mask: u32) -> Result<()> {
        let old = self.fsi_read(id, addr)?;
        self.fsi_write(id, addr, (old & !mask) | (value & mask))
    }

    fn resolve_fsi(&self, id: TargetId, addr: u32) -> Result<(TargetId, u32)> {
        let (fsi, resolved) = self.resolve(id, Capability::Fsi, u64::from(addr))?;
        let resolved = u32::try_from(resolved).map_err(|_| {
            Error::invalid(format!("CFAM address {resolved:#x} from {} exceeds 32 bits", self.path(id)))
        })?;
        Ok((fsi, resolved))
    }
}
