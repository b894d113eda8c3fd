//! SBE status words and First Failure Data Capture.
//!
//! A non-zero status word is `(primary << 16) | secondary`. The bytes that
//! follow it in the reply are FFDC, a sequence of packages each introduced by
//! a `0xFFDC << 16 | length_in_words` header word.

use std::fmt;

/// Magic in the high half of an FFDC package header.
pub const FFDC_MAGIC: u16 = 0xFFDC;

/// An SBE status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SbeStatus(pub u32);

impl SbeStatus {
    /// Success.
    pub const SUCCESS: Self = Self(0);

    /// Builds a status from its two codes.
    pub const fn new(primary: u16, secondary: u16) -> Self {
        Self(((primary as u32) << 16) | secondary as u32)
    }

    /// Primary response code.
    pub const fn primary(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Secondary response code.
    pub const fn secondary(self) -> u16 {
        self.0 as u16
    }

    /// Returns `true` for the zero status word.
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Name of the primary code, if known.
    pub const fn primary_name(self) -> Option<&'static str> {
        Some(match self.primary() {
            0x00 => "success",
            0x01 => "invalid command",
            0x02 => "invalid data",
            0x03 => "sequence error",
            0x04 => "internal error",
            0x05 => "unsecure access denied",
            0xFE => "generic execution failure",
            _ => return None,
        })
    }

    /// Name of the secondary code, if known.
    pub const fn secondary_name(self) -> Option<&'static str> {
        Some(match self.secondary() {
            0x00 => "success",
            0x01 => "command class not supported",
            0x02 => "command not supported",
            0x03 => "invalid address",
            0x04 => "invalid target type",
            0x05 => "invalid chiplet id",
            0x06 => "target not present",
            0x07 => "target not functional",
            0x08 => "command not allowed in this state",
            0x09 => "functionality not supported",
            0x0A => "generic failure in execution",
            0x0B => "blacklisted register access",
            0x0C => "OS failure",
            0x0D => "FIFO access failure",
            0x0E => "insufficient data",
            0x0F => "excess data",
            0x10 => "SBE busy",
            _ => return None,
        })
    }
}

impl fmt::Display for SbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primary {:#04x}", self.primary())?;
        if let Some(name) = self.primary_name() {
            write!(f, " ({name})")?;
        }
        write!(f, ", secondary {:#04x}", self.secondary())?;
        if let Some(name) = self.secondary_name() {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

/// FFDC retained from the most recent failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ffdc {
    /// Status word of the failed operation.
    pub status: SbeStatus,
    /// Raw diagnostic bytes.
    pub data: Vec<u8>,
}

impl Ffdc {
    /// Length of the diagnostic data in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the SBE sent no diagnostic data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over the FFDC packages.
    ///
    /// Iteration stops at the first header without the FFDC magic or whose
    /// length runs past the end of the data.
    pub fn packages(&self) -> FfdcPackages<'_> {
        FfdcPackages { rest: &self.data }
    }
}

/// One FFDC package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfdcPackage<'a> {
    /// Package length in words, header included.
    pub words: u16,
    /// Package bytes after the header word.
    pub body: &'a [u8],
}

/// Iterator returned by [`Ffdc::packages`].
#[derive(Debug, Clone)]
pub struct FfdcPackages<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for FfdcPackages<'a> {
    type Item = FfdcPackage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.rest.get(..4)?;
        let header = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let words = header as u16;
        let len = words as usize * 4;
        if (header >> 16) as u16 != FFDC_MAGIC || words == 0 || len > self.rest.len() {
            self.rest = &[];
            return None;
        }
        let package = FfdcPackage {
            words,
            body: &self.rest[4..len],
        };
        self.rest = &self.rest[len..];
        Some(package)
    }
}
