//! PIB (SCOM) entry points.
//!
//! Addresses with IBM bit 0 set are indirect: the PIB provider only sees the
//! direct address, written with the indirect register address and then polled
//! until the completion bit appears.

use tracing::trace;

use crate::common::constants::{
    INDIRECT_BIT, INDIRECT_DATA_MASK, INDIRECT_DIRECT_MASK, INDIRECT_DONE_BIT,
    INDIRECT_ERROR_MASK, INDIRECT_FORM1_BIT, INDIRECT_READ_BIT, INDIRECT_REG_MASK,
};
use crate::common::{Error, Result};
use crate::target::{Capability, TargetId, Topology};

impl Topology {
    /// Reads a SCOM register as seen from `id`.
    pub fn pib_read(&mut self, id: TargetId, addr: u64) -> Result<u64> {
        let (pib, addr) = self.resolve(id, Capability::Pib, addr)?;
        if addr & INDIRECT_BIT != 0 {
            return self.indirect_read(pib, addr);
        }
        let value = self.raw_pib_read(pib, addr)?;
        trace!(addr = format_args!("{addr:#018x}"), value = format_args!("{value:#018x}"), "pib read");
        Ok(value)
    }

    /// Writes a SCOM register as seen from `id`.
    pub fn pib_write(&mut self, id: TargetId, addr: u64, value: u64) -> Result<()> {
        let (pib, addr) = self.resolve(id, Capability::Pib, addr)?;
        if addr & INDIRECT_BIT != 0 {
            return self.indirect_write(pib, addr, value);
        }
        trace!(addr = format_args!("{addr:#018x}"), value = format_args!("{value:#018x}"), "pib write");
        self.raw_pib_write(pib, addr, value)
    }

    /// Read-modify-writes the bits of `value` selected by `mask`.
    pub fn pib_write_mask(&mut self, id: TargetId, addr: u64, value: u64, mask: u64) -> Result<()> {
        let old = self.pib_read(id, addr)?;
        self.pib_write(id, addr, (old & !mask) | (value & mask))
    }

    /// Polls until `(reg & mask) == expected`, returning the final value.
    ///
    /// Makes at most `pib.wait_retries` reads.
    pub fn pib_wait(&mut self, id: TargetId, addr: u64, mask: u64, expected: u64) -> Result<u64> {
        let attempts = self.config().pib.wait_retries;
        for _ in 0..attempts {
            let value = self.pib_read(id, addr)?;
            if value & mask == expected {
                return Ok(value);
            }
        }
        Err(Error::RetryExhausted {
            operation: "pib wait",
            attempts,
        })
    }

    fn raw_pib_read(&mut self, pib: TargetId, addr: u64) -> Result<u64> {
        self.with_pib(pib, |provider, topo| provider.read(topo, pib, addr))
    }

    fn raw_pib_write(&mut self, pib: TargetId, addr: u64, value: u64) -> Result<()> {
        self.with_pib(pib, |provider, topo| provider.write(topo, pib, addr, value))
    }

    fn indirect_read(&mut self, pib: TargetId, addr: u64) -> Result<u64> {
        check_form(addr)?;
        let direct = addr & INDIRECT_DIRECT_MASK;
        self.raw_pib_write(pib, direct, INDIRECT_READ_BIT | (addr & INDIRECT_REG_MASK))?;
        let status = self.indirect_poll(pib, addr)?;
        Ok(status & INDIRECT_DATA_MASK)
    }

    fn indirect_write(&mut self, pib: TargetId, addr: u64, value: u64) -> Result<()> {
        check_form(addr)?;
        let direct = addr & INDIRECT_DIRECT_MASK;
        self.raw_pib_write(pib, direct, (addr & INDIRECT_REG_MASK) | (value & INDIRECT_DATA_MASK))?;
        let _ = self.indirect_poll(pib, addr)?;
        Ok(())
    }

    fn indirect_poll(&mut self, pib: TargetId, addr: u64) -> Result<u64> {
        let direct = addr & INDIRECT_DIRECT_MASK;
        let attempts = self.config().pib.indirect_retries;
        for _ in 0..attempts {
            let status = self.raw_pib_read(pib, direct)?;
            if status & INDIRECT_DONE_BIT != 0 {
                if status & INDIRECT_ERROR_MASK != 0 {
                    return Err(Error::IndirectScom { addr, status });
                }
                return Ok(status);
            }
        }
        Err(Error::RetryExhausted {
            operation: "indirect scom",
            attempts,
        })
    }
}

fn check_form(addr: u64) -> Result<()> {
    if addr & INDIRECT_FORM1_BIT != 0 {
        return Err(Error::invalid(format!(
            "indirect form 1 address {addr:#018x} is not supported"
        )));
    }
    Ok(())
}
