//! Memory entry points.

use tracing::trace;

use crate::common::Result;
use crate::target::{Capability, TargetId, Topology};

impl Topology {
    /// Fills `buf` from memory at `addr`, as seen from `id`.
    pub fn mem_read(&mut self, id: TargetId, addr: u64, buf: &mut [u8]) -> Result<()> {
        let (mem, addr) = self.resolve(id, Capability::Mem, addr)?;
        trace!(addr = format_args!("{addr:#x}"), len = buf.len(), "mem read");
        self.with_mem(mem, |provider, topo| provider.read(topo, mem, addr, buf))
    }

    /// Writes `data` to memory at `addr`, as seen from `id`.
    pub fn mem_write(&mut self, id: TargetId, addr: u64, data: &[u8]) -> Result<()> {
        let (mem, addr) = self.resolve(id, Capability::Mem, addr)?;
        trace!(addr = format_args!("{addr:#x}"), len = data.len(), "mem write");
        self.with_mem(mem, |provider, topo| provider.write(topo, mem, addr, data))
    }
}
