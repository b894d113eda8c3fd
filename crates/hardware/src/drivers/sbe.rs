//! PIB and memory access carried over the SBE.
//!
//! Both drivers sit below an SBE FIFO node and forward every access as a
//! chip-op on the nearest session above them.

use crate::common::Result;
use crate::sbefifo::MemFlags;
use crate::target::{MemAccess, PibAccess, TargetDriver, TargetId, Topology};

/// SCOM access through `GetScom`/`PutScom` chip-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct SbePib;

impl TargetDriver for SbePib {
    fn class(&self) -> &str {
        "pib"
    }

    fn as_pib_mut(&mut self) -> Option<&mut dyn PibAccess> {
        Some(self)
    }
}

impl PibAccess for SbePib {
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64) -> Result<u64> {
        topo.with_chipop(id, |s| s.scom_get(addr))
    }

    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, value: u64) -> Result<()> {
        topo.with_chipop(id, |s| s.scom_put(addr, value))
    }
}

/// Host memory access through `GetMemory`/`PutMemory` chip-ops.
#[derive(Debug, Clone, Copy)]
pub struct SbeMem {
    flags: MemFlags,
}

impl SbeMem {
    /// Processor-direct access.
    pub const fn proc() -> Self {
        Self {
            flags: MemFlags::PROC,
        }
    }

    /// Access through the PBA.
    pub const fn pba() -> Self {
        Self {
            flags: MemFlags::PBA,
        }
    }

    /// Flags sent with every request.
    pub const fn flags(&self) -> MemFlags {
        self.flags
    }
}

impl TargetDriver for SbeMem {
    fn class(&self) -> &str {
        "mem"
    }

    fn as_mem_mut(&mut self) -> Option<&mut dyn MemAccess> {
        Some(self)
    }
}

impl MemAccess for SbeMem {
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64, buf: &mut [u8]) -> Result<()> {
        let flags = self.flags;
        let data = topo.with_chipop(id, |s| s.mem_get(addr, buf.len(), flags))?;
        buf.copy_from_slice(&data.data);
        Ok(())
    }

    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, data: &[u8]) -> Result<()> {
        let flags = self.flags;
        topo.with_chipop(id, |s| s.mem_put(addr, data, flags))
    }
}
