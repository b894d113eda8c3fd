//! Control class: istep execution and I/O suspension.

use crate::common::Result;

use super::command::Command;
use super::frame::Request;
use super::session::Session;

impl Session {
    /// Executes istep `major.minor`.
    pub fn istep_execute(&mut self, major: u8, minor: u8) -> Result<()> {
        let request = Request::new(Command::IstepExecute).word(((major as u32) << 16) | minor as u32);
        self.operation_no_reply(&request)
    }

    /// Suspends SBE-driven I/O ahead of a host takeover.
    pub fn suspend_io(&mut self) -> Result<()> {
        self.operation_no_reply(&Request::new(Command::SuspendIo))
    }
}
