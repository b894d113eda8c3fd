//! FSI-to-PIB bridge.
//!
//! A small CFAM engine that turns pairs of 32-bit FSI accesses into one SCOM.
//! Register offsets are relative to the bridge's `reg`, which the dispatcher
//! adds on the way up to the FSI provider.

use std::io;

use tracing::warn;

use crate::common::bits::{join_u64, split_u64};
use crate::common::{Error, Result};
use crate::target::{PibAccess, TargetDriver, TargetId, Topology};

/// High data word.
const REG_DATA0: u32 = 0x00;
/// Low data word.
const REG_DATA1: u32 = 0x04;
/// Command register; writing an address starts the access.
const REG_CMD: u32 = 0x08;
/// Engine reset.
const REG_RESET: u32 = 0x18;
/// Engine status.
const REG_STATUS: u32 = 0x1C;

/// Command bit selecting a write.
const CMD_WRITE: u32 = 0x8000_0000;
/// PIB response code in the status register.
const STATUS_PIB_ERROR: u32 = 0x0000_7000;

/// SCOM provider layered on an FSI provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fsi2Pib;

fn command(addr: u64) -> Result<u32> {
    u32::try_from(addr)
        .ok()
        .filter(|cmd| cmd & CMD_WRITE == 0)
        .ok_or_else(|| Error::invalid(format!("SCOM address {addr:#x} exceeds 31 bits")))
}

fn check_status(topo: &mut Topology, id: TargetId, addr: u64) -> Result<()> {
    let status = topo.fsi_read(id, REG_STATUS)?;
    if status & STATUS_PIB_ERROR == 0 {
        return Ok(());
    }
    warn!(path = %topo.path(id), addr = format_args!("{addr:#x}"), status = format_args!("{status:#010x}"), "PIB error, resetting bridge");
    topo.fsi_write(id, REG_RESET, 0)?;
    Err(Error::Transport(io::Error::other(format!(
        "PIB error {:#x} at SCOM {addr:#x}",
        (status & STATUS_PIB_ERROR) >> 12
    ))))
}

impl TargetDriver for Fsi2Pib {
    fn class(&self) -> &str {
        "pib"
    }

    fn as_pib_mut(&mut self) -> Option<&mut dyn PibAccess> {
        Some(self)
    }
}

impl PibAccess for Fsi2Pib {
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64) -> Result<u64> {
        topo.fsi_write(id, REG_CMD, command(addr)?)?;
        check_status(topo, id, addr)?;
        let hi = topo.fsi_read(id, REG_DATA0)?;
        let lo = topo.fsi_read(id, REG_DATA1)?;
        Ok(join_u64(hi, lo))
    }

    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, value: u64) -> Result<()> {
        let cmd = command(addr)? | CMD_WRITE;
        let (hi, lo) = split_u64(value);
        topo.fsi_write(id, REG_DATA0, hi)?;
        topo.fsi_write(id, REG_DATA1, lo)?;
        topo.fsi_write(id, REG_CMD, cmd)?;
        check_status(topo, id, addr)
    }
}
