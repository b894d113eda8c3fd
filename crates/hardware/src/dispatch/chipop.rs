//! Chip-op entry points.
//!
//! These resolve the nearest SBE FIFO provider above a target and run one
//! codec round trip on its session. FFDC from a failed operation stays on the
//! session until the next operation, and can be read back with `sbe_ffdc`.

use crate::common::{Error, Result};
use crate::sbefifo::{Ffdc, SbeCapabilities, Session, ThreadMode, ThreadOp};
use crate::target::{Capability, TargetId, Topology};

impl Topology {
    /// Runs `f` on the SBE FIFO session serving `id`.
    pub fn with_chipop<R>(&mut self, id: TargetId, f: impl FnOnce(&mut Session) -> Result<R>) -> Result<R> {
        let (chipop, _) = self.resolve(id, Capability::Chipop, 0)?;
        self.with_chipop_driver(chipop, |provider| provider.session().and_then(f))
    }

    /// Executes istep `major.minor`.
    pub fn sbe_istep(&mut self, id: TargetId, major: u8, minor: u8) -> Result<()> {
        self.with_chipop(id, |s| s.istep_execute(major, minor))
    }

    /// Enters MPIPL.
    pub fn sbe_mpipl_enter(&mut self, id: TargetId) -> Result<()> {
        self.with_chipop(id, Session::mpipl_enter)
    }

    /// Continues MPIPL.
    pub fn sbe_mpipl_continue(&mut self, id: TargetId) -> Result<()> {
        self.with_chipop(id, Session::mpipl_continue)
    }

    /// Fetches the SBE's stored FFDC.
    pub fn sbe_get_ffdc(&mut self, id: TargetId) -> Result<Vec<u8>> {
        self.with_chipop(id, Session::get_ffdc)
    }

    /// Returns the FFDC retained from the last failed operation, if any.
    pub fn sbe_ffdc(&mut self, id: TargetId) -> Result<Option<Ffdc>> {
        self.with_chipop(id, |s| Ok(s.ffdc().cloned()))
    }

    /// Fetches SBE firmware capabilities.
    pub fn sbe_capabilities(&mut self, id: TargetId) -> Result<SbeCapabilities> {
        self.with_chipop(id, Session::get_capabilities)
    }

    /// Applies `op` to a thread target.
    ///
    /// The core id is the index of the thread's parent and the thread id is the
    /// thread's own index.
    pub fn thread_control(&mut self, thread: TargetId, op: ThreadOp) -> Result<()> {
        let target = self.target(thread);
        let thread_id = target.index().ok_or_else(|| self.unindexed(thread))?;
        let core = target.parent().ok_or_else(|| self.unindexed(thread))?;
        let core_id = self.target(core).index().ok_or_else(|| self.unindexed(core))?;
        let (core_id, thread_id) = (narrow(core_id)?, narrow(thread_id)?);
        self.with_chipop(thread, |s| s.control_instruction(core_id, thread_id, op, ThreadMode::Normal))
    }

    fn unindexed(&self, id: TargetId) -> Error {
        Error::config(format!("{} has no index", self.path(id)))
    }
}

fn narrow(index: u32) -> Result<u8> {
    u8::try_from(index).map_err(|_| Error::invalid(format!("unit index {index} exceeds 8 bits")))
}
