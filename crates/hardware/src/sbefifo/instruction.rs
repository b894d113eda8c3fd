//! Instruction class: thread start, stop, step and sreset.

use crate::common::{Error, Result};

use super::command::Command;
use super::frame::Request;
use super::session::Session;

/// Thread control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ThreadOp {
    /// Start instruction execution.
    Start = 0x0,
    /// Stop instruction execution.
    Stop = 0x1,
    /// Step one instruction.
    Step = 0x2,
    /// System reset.
    Sreset = 0x3,
}

/// Thread control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ThreadMode {
    /// Fail if the thread is not in the expected state.
    #[default]
    Normal = 0x0,
    /// Skip state checks; only warn.
    WarnOnly = 0x1,
}

/// Thread id that addresses every thread of the core.
pub const ALL_THREADS: u8 = 0xF;

impl Session {
    /// Applies `op` to one thread, or to all with [`ALL_THREADS`].
    pub fn control_instruction(
        &mut self,
        core: u8,
        thread: u8,
        op: ThreadOp,
        mode: ThreadMode,
    ) -> Result<()> {
        if thread > ALL_THREADS {
            return Err(Error::invalid(format!("thread id {thread} exceeds 4 bits")));
        }
        let word = ((mode as u32) << 16) | ((core as u32) << 8) | ((thread as u32) << 4) | op as u32;
        self.operation_no_reply(&Request::new(Command::ControlInstruction).word(word))
    }
}
