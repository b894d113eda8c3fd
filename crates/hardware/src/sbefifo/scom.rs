//! SCOM class: get, put, modify, and put under mask.

use crate::common::{Result, join_u64};

use super::command::Command;
use super::frame::{Request, word_at};
use super::session::{Session, expect_len};

/// Operand of a modify-SCOM request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ModifyOp {
    /// `reg |= data`
    Or = 1,
    /// `reg &= data`
    And = 2,
    /// `reg ^= data`
    Xor = 3,
}

impl Session {
    /// Reads the SCOM register at `addr`.
    pub fn scom_get(&mut self, addr: u64) -> Result<u64> {
        let payload = self.operation(&Request::new(Command::GetScom).u64(addr), 8)?;
        expect_len(&payload, 8)?;
        Ok(join_u64(
            word_at(&payload, 0).unwrap_or_default(),
            word_at(&payload, 1).unwrap_or_default(),
        ))
    }

    /// Writes `value` to the SCOM register at `addr`.
    pub fn scom_put(&mut self, addr: u64, value: u64) -> Result<()> {
        self.operation_no_reply(&Request::new(Command::PutScom).u64(addr).u64(value))
    }

    /// Applies `op` with `data` to the SCOM register at `addr` on the SBE.
    pub fn scom_modify(&mut self, addr: u64, op: ModifyOp, data: u64) -> Result<()> {
        let request = Request::new(Command::ModifyScom)
            .word(op as u32)
            .u64(addr)
            .u64(data);
        self.operation_no_reply(&request)
    }

    /// Writes the bits of `value` selected by `mask`.
    pub fn scom_put_mask(&mut self, addr: u64, value: u64, mask: u64) -> Result<()> {
        let request = Request::new(Command::PutScomUnderMask)
            .u64(addr)
            .u64(value)
            .u64(mask);
        self.operation_no_reply(&request)
    }
}
