//! Ring class: scan ring get/put and put from the stored image.

use crate::common::{Error, Result};

use super::command::{Command, SbeTargetType};
use super::frame::{Request, split_bit_length};
use super::session::Session;

/// Ring access flags.
pub mod flags {
    /// Scan the ring through the pervasive scan engine.
    pub const SCAN_REGION: u32 = 0x0001;
    /// Apply header check on the ring.
    pub const HEADER_CHECK: u32 = 0x0002;
    /// Fast scan mode.
    pub const FAST: u32 = 0x0004;
}

impl Session {
    /// Reads `bits` bits of the ring at `ring_addr`.
    ///
    /// Returns the ring data and the bit length the SBE reported.
    pub fn ring_get(&mut self, ring_addr: u32, bits: u32, flags: u32) -> Result<(Vec<u8>, u32)> {
        let data_len = (bits as usize).div_ceil(32) * 4;
        self.check_reply_size(data_len + 4)?;
        let request = Request::new(Command::GetRing)
            .word(ring_addr)
            .word(bits)
            .word(flags);
        let payload = self.operation(&request, data_len + 4)?;
        Ok(split_bit_length(&payload)?)
    }

    /// Writes `bits` bits of `data` to the ring at `ring_addr`.
    pub fn ring_put(&mut self, ring_addr: u32, bits: u32, flags: u32, data: &[u8]) -> Result<()> {
        if data.len() < (bits as usize).div_ceil(8) {
            return Err(Error::invalid(format!(
                "{} bytes cannot hold {bits} ring bits",
                data.len()
            )));
        }
        let request = Request::new(Command::PutRing)
            .word(ring_addr)
            .word(bits)
            .word(flags)
            .bytes(data);
        self.operation_no_reply(&request)
    }

    /// Loads a ring from the SBE's stored image.
    pub fn ring_put_from_image(
        &mut self,
        target: SbeTargetType,
        chiplet: u8,
        ring_id: u16,
        ring_mode: u16,
    ) -> Result<()> {
        let request = Request::new(Command::PutRingFromImage)
            .word(target.word(chiplet))
            .word(((ring_id as u32) << 16) | ring_mode as u32);
        self.operation_no_reply(&request)
    }
}
