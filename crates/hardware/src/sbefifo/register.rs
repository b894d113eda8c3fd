//! Register class: batched core register get/put.
//!
//! One request moves up to 64 registers of a single type for one thread. The
//! header word packs `(core << 16) | (thread << 12) | (type << 8) | count`.

use crate::common::{Error, Result, join_u64};

use super::command::Command;
use super::frame::{Request, word_at};
use super::session::{Session, expect_len};

/// Largest batch a single request may carry.
pub const MAX_REGISTERS: usize = 64;

/// Register file selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RegisterType {
    /// General purpose registers.
    Gpr = 0,
    /// Special purpose registers.
    Spr = 1,
    /// Floating point registers.
    Fpr = 2,
}

fn header(core: u8, thread: u8, kind: RegisterType, count: usize) -> Result<u32> {
    if !(1..=MAX_REGISTERS).contains(&count) {
        return Err(Error::invalid(format!(
            "register batch of {count} is outside 1..={MAX_REGISTERS}"
        )));
    }
    if thread > 0xF {
        return Err(Error::invalid(format!("thread id {thread} exceeds 4 bits")));
    }
    Ok(((core as u32) << 16) | ((thread as u32) << 12) | ((kind as u32) << 8) | count as u32)
}

impl Session {
    /// Reads the registers `ids` of one thread.
    pub fn register_get(
        &mut self,
        core: u8,
        thread: u8,
        kind: RegisterType,
        ids: &[u32],
    ) -> Result<Vec<u64>> {
        let mut request = Request::new(Command::GetRegisters).word(header(core, thread, kind, ids.len())?);
        for &id in ids {
            request = request.word(id);
        }
        let payload = self.operation(&request, ids.len() * 8)?;
        expect_len(&payload, ids.len() * 8)?;
        Ok((0..ids.len())
            .map(|i| {
                join_u64(
                    word_at(&payload, 2 * i).unwrap_or_default(),
                    word_at(&payload, 2 * i + 1).unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Writes `values[i]` to register `ids[i]` of one thread.
    pub fn register_put(
        &mut self,
        core: u8,
        thread: u8,
        kind: RegisterType,
        ids: &[u32],
        values: &[u64],
    ) -> Result<()> {
        if ids.len() != values.len() {
            return Err(Error::invalid(format!(
                "{} register ids but {} values",
                ids.len(),
                values.len()
            )));
        }
        let mut request = Request::new(Command::PutRegisters).word(header(core, thread, kind, ids.len())?);
        for (&id, &value) in ids.iter().zip(values) {
            request = request.word(id).u64(value);
        }
        self.operation_no_reply(&request)
    }
}
