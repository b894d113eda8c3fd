//! Kernel SCOM and CFAM device files.
//!
//! The kernel exposes both buses as seekable character devices where the file
//! offset is the register address:
//! 1. **SCOM:** 8-byte registers in host byte order.
//! 2. **CFAM:** 4-byte registers in big-endian order.
//!
//! The device path comes from the node's `device` property and is opened at
//! probe time; a missing or unopenable device marks the target absent.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use tracing::debug;

use crate::common::constants::PROP_DEVICE;
use crate::common::{Error, Result};
use crate::target::{FsiAccess, PibAccess, TargetDriver, TargetId, Topology};

fn open_device(topo: &Topology, id: TargetId) -> Result<File> {
    let device = topo.property_str(id, PROP_DEVICE)?.ok_or_else(|| Error::ProbeFailed {
        path: topo.path(id),
        reason: format!("no {PROP_DEVICE} property"),
    })?;
    let file = open_rw(Path::new(device))?;
    debug!(path = %topo.path(id), device, "opened kernel device");
    Ok(file)
}

fn open_rw(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().read(true).write(true).open(path)?)
}

fn not_open(topo: &Topology, id: TargetId) -> Error {
    Error::config(format!("{} has no open device", topo.path(id)))
}

/// SCOM access through `/dev/scom*`.
#[derive(Debug, Default)]
pub struct KernelScom {
    file: Option<File>,
}

impl KernelScom {
    /// Creates a driver that opens its device when probed.
    pub const fn new() -> Self {
        Self { file: None }
    }

    /// Creates a driver over an explicit device path, opened immediately.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: Some(open_rw(path.as_ref())?),
        })
    }
}

impl TargetDriver for KernelScom {
    fn class(&self) -> &str {
        "pib"
    }

    fn probe(&mut self, topo: &mut Topology, id: TargetId) -> Result<()> {
        if self.file.is_none() {
            self.file = Some(open_device(topo, id)?);
        }
        Ok(())
    }

    fn release(&mut self, _topo: &mut Topology, _id: TargetId) -> Result<()> {
        self.file = None;
        Ok(())
    }

    fn as_pib_mut(&mut self) -> Option<&mut dyn PibAccess> {
        Some(self)
    }
}

impl PibAccess for KernelScom {
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u64) -> Result<u64> {
        let file = self.file.as_ref().ok_or_else(|| not_open(topo, id))?;
        let mut buf = [0u8; 8];
        file.read_exact_at(&mut buf, addr)?;
        Ok(u64::from_ne_bytes(buf))
    }

    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u64, value: u64) -> Result<()> {
        let file = self.file.as_ref().ok_or_else(|| not_open(topo, id))?;
        file.write_all_at(&value.to_ne_bytes(), addr)?;
        Ok(())
    }
}

/// CFAM access through the kernel FSI `raw` file.
#[derive(Debug, Default)]
pub struct KernelFsi {
    file: Option<File>,
}

impl KernelFsi {
    /// Creates a driver that opens its device when probed.
    pub const fn new() -> Self {
        Self { file: None }
    }

    /// Creates a driver over an explicit device path, opened immediately.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: Some(open_rw(path.as_ref())?),
        })
    }
}

impl TargetDriver for KernelFsi {
    fn class(&self) -> &str {
        "fsi"
    }

    fn probe(&mut self, topo: &mut Topology, id: TargetId) -> Result<()> {
        if self.file.is_none() {
            self.file = Some(open_device(topo, id)?);
        }
        Ok(())
    }

    fn release(&mut self, _topo: &mut Topology, _id: TargetId) -> Result<()> {
        self.file = None;
        Ok(())
    }

    fn as_fsi_mut(&mut self) -> Option<&mut dyn FsiAccess> {
        Some(self)
    }
}

impl FsiAccess for KernelFsi {
    fn read(&mut self, topo: &mut Topology, id: TargetId, addr: u32) -> Result<u32> {
        let file = self.file.as_ref().ok_or_else(|| not_open(topo, id))?;
        let mut buf = [0u8; 4];
        file.read_exact_at(&mut buf, u64::from(addr))?;
        Ok(u32::from_be_bytes(buf))
    }

    fn write(&mut self, topo: &mut Topology, id: TargetId, addr: u32, value: u32) -> Result<()> {
        let file = self.file.as_ref().ok_or_else(|| not_open(topo, id))?;
        file.write_all_at(&value.to_be_bytes(), u64::from(addr))?;
        Ok(())
    }
}
