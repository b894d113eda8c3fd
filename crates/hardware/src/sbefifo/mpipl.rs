//! MPIPL class: memory-preserving re-IPL, clock stop, and TI info.

use crate::common::Result;

use super::command::{Command, SbeTargetType};
use super::frame::Request;
use super::session::Session;

impl Session {
    /// Enters MPIPL. Runs under the long read timeout.
    pub fn mpipl_enter(&mut self) -> Result<()> {
        self.operation_no_reply(&Request::new(Command::EnterMpipl))
    }

    /// Continues MPIPL. Runs under the long read timeout.
    pub fn mpipl_continue(&mut self) -> Result<()> {
        self.operation_no_reply(&Request::new(Command::ContinueMpipl))
    }

    /// Stops clocks on a target or chiplet.
    pub fn stop_clocks(&mut self, target: SbeTargetType, chiplet: u8) -> Result<()> {
        self.operation_no_reply(&Request::new(Command::StopClocks).word(target.word(chiplet)))
    }

    /// Fetches terminate-immediate information. Runs under the long read timeout.
    pub fn get_ti_info(&mut self) -> Result<Vec<u8>> {
        let capacity = self.max_reply();
        self.operation(&Request::new(Command::GetTiInfo), capacity)
    }
}
