//! Memory class: host memory and SBE SRAM.
//!
//! Processor-direct accesses move 8-byte granules; PBA accesses move 128-byte
//! granules. Reads are widened to whole granules and trimmed afterwards;
//! writes must already be aligned. When ECC or tag data is requested, the SBE
//! appends one extra byte after every 8 data bytes.

use std::ops::BitOr;

use crate::common::{Error, ProtocolError, Result};

use super::command::Command;
use super::frame::{Request, word_at};
use super::session::Session;

/// Memory access flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemFlags(pub u32);

impl MemFlags {
    /// Processor-direct access (8-byte granules).
    pub const PROC: Self = Self(0x0001);
    /// Access through the PBA (128-byte granules).
    pub const PBA: Self = Self(0x0002);
    /// Auto-increment the address.
    pub const AUTO_INCREMENT: Self = Self(0x0004);
    /// Return one ECC byte per 8 data bytes.
    pub const ECC: Self = Self(0x0008);
    /// Return one tag byte per 8 data bytes.
    pub const TAG: Self = Self(0x0010);
    /// Fast mode.
    pub const FAST: Self = Self(0x0020);
    /// LCO mode.
    pub const LCO: Self = Self(0x0040);
    /// Cache-inhibited access.
    pub const CACHE_INHIBIT: Self = Self(0x0080);
    /// Pass-through mode.
    pub const PASS_THROUGH: Self = Self(0x0100);

    /// Returns `true` if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Transfer granule in bytes.
    pub fn granule(self) -> Result<u64> {
        match (self.contains(Self::PROC), self.contains(Self::PBA)) {
            (true, false) => Ok(8),
            (false, true) => Ok(128),
            _ => Err(Error::invalid(format!(
                "memory flags {:#06x} must select exactly one of proc and PBA",
                self.0
            ))),
        }
    }

    const fn has_extra(self) -> bool {
        self.0 & (Self::ECC.0 | Self::TAG.0) != 0
    }
}

impl BitOr for MemFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Data returned by [`Session::mem_get`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemData {
    /// Requested bytes.
    pub data: Vec<u8>,
    /// ECC or tag bytes, one per 8-byte group touched by the request.
    pub extra: Vec<u8>,
}

fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid(format!("{what} {value:#x} exceeds 32 bits")))
}

impl Session {
    /// Reads `len` bytes of host memory at `addr`.
    pub fn mem_get(&mut self, addr: u64, len: usize, flags: MemFlags) -> Result<MemData> {
        let granule = flags.granule()?;
        if len == 0 {
            return Ok(MemData::default());
        }
        let end = addr
            .checked_add(len as u64)
            .and_then(|end| end.checked_next_multiple_of(granule))
            .ok_or_else(|| Error::invalid("memory range wraps"))?;
        let start = addr & !(granule - 1);
        let aligned_len = end - start;
        let aligned_len32 = to_u32(aligned_len, "length")?;
        let aligned_len = aligned_len as usize;
        let extra_len = if flags.has_extra() { aligned_len / 8 } else { 0 };
        let data_len = aligned_len + extra_len;
        // the FIFO moves whole words, so interleaved replies arrive padded
        let wire_len = data_len.next_multiple_of(4);
        self.check_reply_size(wire_len)?;

        let request = Request::new(Command::GetMemory)
            .word(flags.0)
            .u64(start)
            .word(aligned_len32);
        let mut payload = self.operation(&request, wire_len)?;
        if payload.len() != wire_len {
            return Err(ProtocolError::Length {
                expected: wire_len,
                found: payload.len(),
            }
            .into());
        }
        payload.truncate(data_len);

        let (full, extra) = if extra_len == 0 {
            (payload, Vec::new())
        } else {
            deinterleave(&payload)
        };

        let skip = (addr - start) as usize;
        let first_group = skip / 8;
        let last_group = (skip + len).div_ceil(8);
        Ok(MemData {
            data: full[skip..skip + len].to_vec(),
            extra: extra
                .get(first_group..last_group)
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
        })
    }

    /// Writes `data` to host memory at `addr`; both must be granule aligned.
    pub fn mem_put(&mut self, addr: u64, data: &[u8], flags: MemFlags) -> Result<()> {
        let granule = flags.granule()?;
        if addr % granule != 0 || data.len() as u64 % granule != 0 {
            return Err(Error::invalid(format!(
                "memory write of {} bytes at {addr:#x} is not {granule}-byte aligned",
                data.len()
            )));
        }
        let len = to_u32(data.len() as u64, "length")?;
        let request = Request::new(Command::PutMemory)
            .word(flags.0)
            .u64(addr)
            .word(len)
            .bytes(data);
        let payload = self.operation(&request, 4)?;
        check_written(&payload, data.len())
    }

    /// Reads `len` bytes of SBE SRAM at `addr`.
    pub fn sram_get(&mut self, addr: u64, len: usize, mode: u32) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = addr & !7;
        let end = addr
            .checked_add(len as u64)
            .and_then(|end| end.checked_next_multiple_of(8))
            .ok_or_else(|| Error::invalid("SRAM range wraps"))?;
        let aligned_len = (end - start) as usize;
        self.check_reply_size(aligned_len)?;

        let request = Request::new(Command::GetSram)
            .word(mode)
            .u64(start)
            .word(to_u32(end - start, "length")?);
        let payload = self.operation(&request, aligned_len)?;
        if payload.len() != aligned_len {
            return Err(ProtocolError::Length {
                expected: aligned_len,
                found: payload.len(),
            }
            .into());
        }
        let skip = (addr - start) as usize;
        Ok(payload[skip..skip + len].to_vec())
    }

    /// Writes `data` to SBE SRAM at `addr`; both must be 8-byte aligned.
    pub fn sram_put(&mut self, addr: u64, data: &[u8], mode: u32) -> Result<()> {
        if addr % 8 != 0 || data.len() % 8 != 0 {
            return Err(Error::invalid(format!(
                "SRAM write of {} bytes at {addr:#x} is not 8-byte aligned",
                data.len()
            )));
        }
        let request = Request::new(Command::PutSram)
            .word(mode)
            .u64(addr)
            .word(to_u32(data.len() as u64, "length")?)
            .bytes(data);
        let payload = self.operation(&request, 4)?;
        check_written(&payload, data.len())
    }
}

/// Splits `[8 data bytes, 1 extra byte]` groups.
fn deinterleave(payload: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let groups = payload.len() / 9;
    let mut data = Vec::with_capacity(groups * 8);
    let mut extra = Vec::with_capacity(groups);
    for group in payload.chunks_exact(9) {
        data.extend_from_slice(&group[..8]);
        extra.push(group[8]);
    }
    (data, extra)
}

/// Checks the one-word "bytes written" reply of a put.
fn check_written(payload: &[u8], expected: usize) -> Result<()> {
    let written = match (payload.len(), word_at(payload, 0)) {
        (4, Some(word)) => word as usize,
        _ => {
            return Err(ProtocolError::Length {
                expected: 4,
                found: payload.len(),
            }
            .into());
        }
    };
    if written != expected {
        return Err(ProtocolError::Length {
            expected,
            found: written,
        }
        .into());
    }
    Ok(())
}
