//! SBE FIFO chip-op provider.
//!
//! Connects to the character device named by the node's `device` property
//! when probed, and disconnects on release. A session handed in up front is
//! used as-is and the device property is ignored.

use std::io;
use std::path::PathBuf;

use tracing::info;

use crate::common::constants::PROP_DEVICE;
use crate::common::{Error, Result};
use crate::config::SbefifoConfig;
use crate::sbefifo::Session;
use crate::target::{ChipopAccess, TargetDriver, TargetId, Topology};

/// Chip-op provider backed by an SBE FIFO session.
#[derive(Debug)]
pub struct SbefifoChipop {
    config: SbefifoConfig,
    session: Option<Session>,
}

impl SbefifoChipop {
    /// Creates a provider that connects when probed.
    pub const fn new(config: SbefifoConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Creates a provider around an already connected session.
    pub fn with_session(session: Session) -> Self {
        Self {
            config: SbefifoConfig::default(),
            session: Some(session),
        }
    }

    /// Returns `true` while a session is held.
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

impl TargetDriver for SbefifoChipop {
    fn class(&self) -> &str {
        "sbefifo"
    }

    fn probe(&mut self, topo: &mut Topology, id: TargetId) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let device = topo
            .property_str(id, PROP_DEVICE)?
            .map(PathBuf::from)
            .ok_or_else(|| Error::ProbeFailed {
                path: topo.path(id),
                reason: format!("no {PROP_DEVICE} property"),
            })?;
        self.session = Some(Session::connect(&device, &self.config)?);
        info!(path = %topo.path(id), device = %device.display(), "SBE FIFO ready");
        Ok(())
    }

    fn release(&mut self, _topo: &mut Topology, _id: TargetId) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.disconnect();
        }
        Ok(())
    }

    fn as_chipop_mut(&mut self) -> Option<&mut dyn ChipopAccess> {
        Some(self)
    }
}

impl ChipopAccess for SbefifoChipop {
    fn session(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or_else(|| {
            Error::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "SBE FIFO session is not connected",
            ))
        })
    }
}
