//! Generic class: FFDC, capabilities, quiesce, and LPC timeout.

use crate::common::{ProtocolError, Result};

use super::command::Command;
use super::frame::{Request, word_at};
use super::session::{Session, expect_len};

/// Words in a GetCapabilities reply.
pub const CAPABILITIES_WORDS: usize = 28;

/// Capability words following the identification fields.
pub const CAPABILITY_BITMAP_WORDS: usize = 20;

/// Decoded GetCapabilities reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbeCapabilities {
    /// Firmware version, major in the high half.
    pub version: u32,
    /// Eight-character commit id.
    pub commit_id: String,
    /// Release tag, up to 20 characters.
    pub release_tag: String,
    /// Capability bitmap words.
    pub capabilities: [u32; CAPABILITY_BITMAP_WORDS],
}

impl SbeCapabilities {
    /// Decodes the 28-word reply payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        expect_len(payload, CAPABILITIES_WORDS * 4)?;
        let mut capabilities = [0u32; CAPABILITY_BITMAP_WORDS];
        for (i, cap) in capabilities.iter_mut().enumerate() {
            *cap = word_at(payload, 8 + i).unwrap_or_default();
        }
        Ok(Self {
            version: word_at(payload, 0).unwrap_or_default(),
            commit_id: text(&payload[4..12]),
            release_tag: text(&payload[12..32]),
            capabilities,
        })
    }

    /// Major firmware version.
    pub const fn major(&self) -> u16 {
        (self.version >> 16) as u16
    }

    /// Minor firmware version.
    pub const fn minor(&self) -> u16 {
        self.version as u16
    }
}

/// Fixed-width text field, trimmed at the first NUL.
fn text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl Session {
    /// Fetches the SBE's stored FFDC.
    pub fn get_ffdc(&mut self) -> Result<Vec<u8>> {
        let capacity = self.max_reply();
        self.operation(&Request::new(Command::GetFfdc), capacity)
    }

    /// Fetches firmware identification and capabilities.
    pub fn get_capabilities(&mut self) -> Result<SbeCapabilities> {
        let payload = self.operation(&Request::new(Command::GetCapabilities), CAPABILITIES_WORDS * 4)?;
        SbeCapabilities::parse(&payload)
    }

    /// Quiesces the SBE.
    pub fn quiesce(&mut self) -> Result<()> {
        self.operation_no_reply(&Request::new(Command::Quiesce))
    }

    /// Returns `true` if an LPC timeout has been recorded.
    pub fn lpc_timeout(&mut self) -> Result<bool> {
        let payload = self.operation(&Request::new(Command::LpcTimeout), 4)?;
        match (payload.len(), word_at(&payload, 0)) {
            (4, Some(flag)) => Ok(flag != 0),
            (found, _) => Err(ProtocolError::Length { expected: 4, found }.into()),
        }
    }
}
