//! Array class: fast array control and trace array collection.
//!
//! Both commands can keep the SBE busy for a long time and run under the
//! session's long read timeout.

use crate::common::Result;

use super::command::{Command, SbeTargetType};
use super::frame::{Request, split_bit_length};
use super::session::Session;

/// Fast array control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FastArrayMode {
    /// Prepare the array for dumping.
    Setup = 1,
    /// Restore functional mode.
    Cleanup = 2,
}

/// Trace array operations, OR-able.
pub mod trace_op {
    /// Reset the trace array.
    pub const RESET: u16 = 0x0001;
    /// Restart tracing.
    pub const RESTART: u16 = 0x0002;
    /// Stop tracing.
    pub const STOP: u16 = 0x0004;
    /// Collect the trace data.
    pub const COLLECT_DUMP: u16 = 0x0008;
}

impl Session {
    /// Runs fast array control on a chiplet.
    pub fn fast_array(
        &mut self,
        target: SbeTargetType,
        chiplet: u8,
        mode: FastArrayMode,
        clock_cycle: u32,
    ) -> Result<()> {
        let request = Request::new(Command::FastArray)
            .word(target.word(chiplet))
            .word(mode as u32)
            .word(clock_cycle);
        self.operation_no_reply(&request)
    }

    /// Runs a trace array operation, returning any collected trace bytes.
    pub fn trace_array(
        &mut self,
        target: SbeTargetType,
        chiplet: u8,
        array_id: u16,
        operation: u16,
    ) -> Result<Vec<u8>> {
        let request = Request::new(Command::TraceArray)
            .word(target.word(chiplet))
            .word(((array_id as u32) << 16) | operation as u32);
        let capacity = self.max_reply();
        let payload = self.operation(&request, capacity)?;
        let (data, _bits) = split_bit_length(&payload)?;
        Ok(data)
    }
}
