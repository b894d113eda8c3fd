//! Alter/display unit (ADU).
//!
//! The ADU moves 8-byte words between the PIB and the fabric. A transfer:
//! 1. **Locks** the unit, failing with `TargetBusy` if another master holds it.
//! 2. **Resets** the state machine and clears stale status.
//! 3. **Runs** one command per word, polling status a bounded number of times.
//! 4. **Unlocks** the unit on every exit path.
//!
//! Unaligned ranges are handled by read-modify-write of the edge words.

use std::ops::Range;

use tracing::{trace, warn};

use crate::chip::Generation;
use crate::common::bits::{ppc_bit, ppc_bitmask, set_field};
use crate::common::{Error, Result};
use crate::target::{MemAccess, TargetDriver, TargetId, Topology};

/// Command bit starting an operation.
const CMD_START_OP: u64 = ppc_bit(2);
/// Command bit clearing the status register.
const CMD_CLEAR_STATUS: u64 = ppc_bit(3);
/// Command bit resetting the state machine.
const CMD_RESET_FSM: u64 = ppc_bit(4);
/// Command bit selecting a read.
const CMD_READ: u64 = ppc_bit(5);
/// Command bit holding the lock.
const CMD_LOCKED: u64 = ppc_bit(11);
/// Transfer size field.
const CMD_SIZE: u64 = ppc_bitmask(32, 39);

/// Status bit set while a command runs.
const STATUS_BUSY: u64 = ppc_bit(0);
/// Status bit set once the address phase completes.
const STATUS_ADDR_DONE: u64 = ppc_bit(2);
/// Status bit set once the data phase completes.
const STATUS_DATA_DONE: u64 = ppc_bit(3);
/// Status bits reporting a failed command.
const STATUS_ERRORS: u64 = ppc_bitmask(4, 8);

/// Bytes moved per command.
const WORD: u64 = 8;

/// ADU register block for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registers {
    control: u64,
    cmd: u64,
    status: u64,
    data: u64,
}

impl Registers {
    const fn for_generation(generation: Generation) -> Self {
        let base = match generation {
            Generation::P8 => 0x0202_0000,
            Generation::P9Nimbus | Generation::P9Cumulus | Generation::P10 => 0x0009_0000,
        };
        Self {
            control: base,
            cmd: base + 1,
            status: base + 3,
            data: base + 4,
        }
    }
}

/// Memory provider driving the ADU over the PIB of its parent.
#[derive(Debug, Clone, Copy)]
pub struct Adu {
    generation: Generation,
    regs: Registers,
    retries: u32,
}

impl Adu {
    /// Creates a driver for `generation` that polls status at most `retries` times.
    pub const fn new(generation: Generation, retries: u32) -> Self {
        Self {
            generation,
            regs: Registers::for_generation(generation),
            retries,
        }
    }

    /// Generation whose register layout is used.
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Runs `f` with the ADU locked, unlocking afterwards whatever `f` returns.
    fn locked<R>(
        self,
        topo: &mut Topology,
        id: TargetId,
        f: impl FnOnce(Self, &mut Topology) -> Result<R>,
    ) -> Result<R> {
        if topo.pib_read(id, self.regs.cmd)? & CMD_LOCKED != 0 {
            return Err(Error::TargetBusy(topo.path(id)));
        }
        topo.pib_write(id, self.regs.cmd, CMD_LOCKED)?;

        let result = topo
            .pib_write(id, self.regs.cmd, CMD_LOCKED | CMD_RESET_FSM | CMD_CLEAR_STATUS)
            .and_then(|()| f(self, topo));

        let unlock = topo.pib_write(id, self.regs.cmd, 0);
        match (result, unlock) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), unlock) => {
                if let Err(unlock) = unlock {
                    warn!(path = %topo.path(id), error = %unlock, "ADU unlock failed");
                }
                Err(e)
            }
        }
    }

    fn start(self, topo: &mut Topology, id: TargetId, addr: u64, read: bool) -> Result<()> {
        topo.pib_write(id, self.regs.control, addr)?;
        let mut cmd = set_field(CMD_SIZE, CMD_LOCKED | CMD_START_OP, WORD);
        if read {
            cmd |= CMD_READ;
        }
        topo.pib_write(id, self.regs.cmd, cmd)
    }

    fn wait(self, topo: &mut Topology, id: TargetId, addr: u64) -> Result<()> {
        for _ in 0..self.retries {
            let status = topo.pib_read(id, self.regs.status)?;
            if status & STATUS_BUSY != 0 {
                continue;
            }
            if status & STATUS_ERRORS != 0 {
                return Err(Error::invalid(format!(
                    "ADU command at {addr:#x} failed with status {status:#018x}"
                )));
            }
            if status & (STATUS_ADDR_DONE | STATUS_DATA_DONE) == STATUS_ADDR_DONE | STATUS_DATA_DONE {
                return Ok(());
            }
        }
        Err(Error::RetryExhausted {
            operation: "adu status",
            attempts: self.retries,
        })
    }

    fn read_word(self, topo: &mut Topology, id: TargetId, addr: u64) -> Result<[u8; 8]> {
        self.start(topo, id, addr, true)?;
        self.wait(topo, id, addr)?;
        let value = topo.pib_read(id, self.regs.data)?;
        trace!(addr = format_args!("{addr:#x}"), value = format_args!("{value:#018x}"), "adu read");
        Ok(value.to_be_bytes())
    }

    fn write_word(self, topo: &mut Topology, id: TargetId, addr: u64, bytes: [u8; 8]) -> Result<()> {
        self.start(topo, id, addr, false)?;
        topo.pib_write(id, self.regs.data, u64::from_be_bytes(bytes))?;
        self.wait(topo, id, addr)
    }
}

/// One aligned word touched by a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    /// Word address.
    word: u64,
    /// Overlapping part of the caller's buffer.
    buf: Range<usize>,
    /// Overlapping part of the word.
    within: Range<usize>,
}

/// Aligned words covering `addr..addr + len`.
fn spans(addr: u64, len: usize) -> Result<Vec<Span>> {
    let end = addr
        .checked_add(len as u64)
        .ok_or_else(|| Error::invalid("memory range wraps"))?;
    let mut spans = Vec::new();
    let mut word = addr & !(WORD - 1);
    while word < end {
        let lo = word.max(addr);
        let hi = (word + WORD).min(end);
        spans.push(Span {
            word,
            buf: (lo - addr) as usize..(hi - addr) as usize,
            within: (lo - word) as usize..(hi - word) as usize,
        });
        word += WORD;
    }
    Ok(spans)
}

impl TargetDriver for Adu {
    fn class(&self) -> &str {
        "mem"
    }

    fn as_mem_mut(&mut self) -> Option<&mut dyn MemAccess> {
        Some(self)
    }
}

impl MemAccess for Adu {
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64, buf: &mut [u8]) -> Result<()> {
        let spans = spans(addr, buf.len())?;
        self.locked(topo, id, |adu, topo| {
            for span in spans {
                let bytes = adu.read_word(topo, id, span.word)?;
                buf[span.buf].copy_from_slice(&bytes[span.within]);
            }
            Ok(())
        })
    }

    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, data: &[u8]) -> Result<()> {
        let spans = spans(addr, data.len())?;
        self.locked(topo, id, |adu, topo| {
            for span in spans {
                let mut bytes = if span.within.len() == WORD as usize {
                    [0; 8]
                } else {
                    adu.read_word(topo, id, span.word)?
                };
                bytes[span.within].copy_from_slice(&data[span.buf]);
                adu.write_word(topo, id, span.word, bytes)?;
            }
            Ok(())
        })
    }
}
