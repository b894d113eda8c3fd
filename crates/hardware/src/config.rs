//! Configuration system for topology access and the SBE FIFO codec.
//!
//! This module defines all configuration structures used to parameterise the
//! library. It provides:
//! 1. **Defaults:** Timeouts, FFDC reservations, and busy-poll bounds.
//! 2. **Structures:** General, SBE FIFO, PIB, and memory sections.
//! 3. **Topology description:** The backend and system trees that stand in for
//!    compiled device-tree blobs.
//!
//! Configuration is supplied as JSON (`Config::from_file`) or built with
//! `Config::default()`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::chip::Generation;
use crate::common::{Error, Result};

/// Default configuration constants.
///
/// These values apply when a section or field is absent from the JSON input.
mod defaults {
    /// Read timeout for ordinary SBE operations (milliseconds).
    ///
    /// Matches the kernel fsi-sbefifo driver's own response timeout.
    pub const READ_TIMEOUT_MS: u64 = 10_000;

    /// Read timeout installed around long-running SBE operations (seconds).
    ///
    /// MPIPL entry and trace array collection can keep the SBE busy well past
    /// the kernel driver's default timeout.
    pub const LONG_TIMEOUT_SECS: u64 = 30;

    /// Reply capacity reserved for FFDC on top of the expected payload (8 KiB).
    pub const MAX_FFDC_BYTES: usize = 0x2000;

    /// Upper bound on any single reply buffer (1 MiB).
    pub const MAX_REPLY_BYTES: usize = 0x10_0000;

    /// Polls of the indirect SCOM status before giving up.
    pub const INDIRECT_RETRIES: u32 = 10;

    /// Polls made by `pib_wait` before giving up.
    pub const WAIT_RETRIES: u32 = 100;

    /// Polls of the ADU status register per transferred word.
    pub const ADU_RETRIES: u32 = 10;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use powerdbg_core::config::Config;
/// use powerdbg_core::chip::Generation;
///
/// let json = r#"{ "general": { "generation": "P10" }, "pib": { "indirect_retries": 4 } }"#;
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.generation, Generation::P10);
/// assert_eq!(config.pib.indirect_retries, 4);
/// assert_eq!(config.sbefifo.long_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Processor generation and other global settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// SBE FIFO session settings.
    #[serde(default)]
    pub sbefifo: SbefifoConfig,
    /// PIB dispatch settings.
    #[serde(default)]
    pub pib: PibConfig,
    /// Memory access settings.
    #[serde(default)]
    pub mem: MemConfig,
}

impl Config {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("invalid config: {e}")))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }
}

/// Global settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Processor generation whose translation tables and drivers are bound.
    #[serde(default)]
    pub generation: Generation,
}

/// SBE FIFO session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SbefifoConfig {
    /// Read timeout for ordinary operations, in milliseconds.
    #[serde(default = "SbefifoConfig::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Read timeout installed around long-running operations, in seconds.
    #[serde(default = "SbefifoConfig::default_long_timeout_secs")]
    pub long_timeout_secs: u64,
    /// Reply capacity reserved for FFDC on top of the expected payload.
    #[serde(default = "SbefifoConfig::default_max_ffdc_bytes")]
    pub max_ffdc_bytes: usize,
    /// Upper bound on a single reply buffer.
    #[serde(default = "SbefifoConfig::default_max_reply_bytes")]
    pub max_reply_bytes: usize,
}

impl SbefifoConfig {
    fn default_read_timeout_ms() -> u64 {
        defaults::READ_TIMEOUT_MS
    }
    fn default_long_timeout_secs() -> u64 {
        defaults::LONG_TIMEOUT_SECS
    }
    fn default_max_ffdc_bytes() -> usize {
        defaults::MAX_FFDC_BYTES
    }
    fn default_max_reply_bytes() -> usize {
        defaults::MAX_REPLY_BYTES
    }

    /// Returns the ordinary read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Returns the long-operation timeout as a `Duration`.
    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }
}

impl Default for SbefifoConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: defaults::READ_TIMEOUT_MS,
            long_timeout_secs: defaults::LONG_TIMEOUT_SECS,
            max_ffdc_bytes: defaults::MAX_FFDC_BYTES,
            max_reply_bytes: defaults::MAX_REPLY_BYTES,
        }
    }
}

/// PIB dispatch settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PibConfig {
    /// Status polls allowed for an indirect SCOM.
    #[serde(default = "PibConfig::default_indirect_retries")]
    pub indirect_retries: u32,
    /// Polls allowed for `pib_wait`.
    #[serde(default = "PibConfig::default_wait_retries")]
    pub wait_retries: u32,
}

impl PibConfig {
    fn default_indirect_retries() -> u32 {
        defaults::INDIRECT_RETRIES
    }
    fn default_wait_retries() -> u32 {
        defaults::WAIT_RETRIES
    }
}

impl Default for PibConfig {
    fn default() -> Self {
        Self {
            indirect_retries: defaults::INDIRECT_RETRIES,
            wait_retries: defaults::WAIT_RETRIES,
        }
    }
}

/// Memory access settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MemConfig {
    /// ADU status polls allowed per transferred word.
    #[serde(default = "MemConfig::default_adu_retries")]
    pub adu_retries: u32,
}

impl MemConfig {
    fn default_adu_retries() -> u32 {
        defaults::ADU_RETRIES
    }
}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            adu_retries: defaults::ADU_RETRIES,
        }
    }
}

/// Description of the backend and system trees.
///
/// The backend tree holds the hardware units actually reachable through a
/// transport. The system tree holds the logical view (processors, cores,
/// threads). A system node carrying a `device-path` property is aliased to the
/// backend node at that path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologyConfig {
    /// Backend tree root; its own name is ignored.
    #[serde(default)]
    pub backend: NodeConfig,
    /// System tree root; its own name is ignored.
    #[serde(default)]
    pub system: NodeConfig,
}

impl TopologyConfig {
    /// Parses a topology description from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("invalid topology: {e}")))
    }

    /// Reads and parses a JSON topology description.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }
}

/// One node of a topology description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Node name, optionally suffixed with `@<hex unit address>`.
    #[serde(default)]
    pub name: String,
    /// Class tag; defaults to the driver's class, then to the base name.
    #[serde(default)]
    pub class: Option<String>,
    /// Compatible string selecting a driver. Absent for virtual nodes.
    #[serde(default)]
    pub compatible: Option<String>,
    /// Unit number within the class.
    #[serde(default)]
    pub index: Option<u32>,
    /// Initial status override.
    #[serde(default)]
    pub status: Option<StatusConfig>,
    /// Raw properties.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<NodeConfig>,
}

/// Status overrides accepted in a topology description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusConfig {
    /// Leave the node to be probed.
    Okay,
    /// Never probe the node.
    Disabled,
    /// A failed probe is fatal.
    MustExist,
}

/// A property value in a topology description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A single 32-bit cell.
    Cell(u32),
    /// A list of 32-bit cells.
    Cells(Vec<u32>),
    /// A string, stored NUL-terminated.
    Text(String),
    /// Raw bytes.
    Bytes {
        /// Property bytes.
        bytes: Vec<u8>,
    },
}

impl PropertyValue {
    /// Encodes the value the way a flattened device tree stores it.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Cell(cell) => cell.to_be_bytes().to_vec(),
            Self::Cells(cells) => cells.iter().flat_map(|c| c.to_be_bytes()).collect(),
            Self::Text(text) => {
                let mut bytes = text.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
            Self::Bytes { bytes } => bytes.clone(),
        }
    }
}
