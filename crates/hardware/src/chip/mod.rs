//! Processor generations and their SCOM address translation.
//!
//! This module binds logical unit numbers to physical SCOM fields. It includes:
//! 1. **Generations:** P8, P9 Nimbus, P9 Cumulus and P10.
//! 2. **Units:** The chip unit kinds that rewrite addresses on the way up.
//! 3. **Fields:** Chiplet, port, region, ring and satellite accessors.
//! 4. **Tables:** One translate function per (generation, unit) pair.

/// POWER8 translation.
pub mod p8;
/// POWER9 translation.
pub mod p9;
/// POWER10 translation.
pub mod p10;
/// SCOM address fields.
pub mod scom_addr;

use std::fmt;

use serde::Deserialize;

use crate::target::{Target, TranslateFn};

use self::scom_addr::set_chiplet_id;

/// Processor generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Generation {
    /// POWER8.
    P8,
    /// POWER9 scale-out.
    #[default]
    P9Nimbus,
    /// POWER9 scale-up.
    P9Cumulus,
    /// POWER10.
    P10,
}

impl Generation {
    /// Family part of compatible strings, as in `ibm,power9-core`.
    pub const fn family(self) -> &'static str {
        match self {
            Self::P8 => "power8",
            Self::P9Nimbus | Self::P9Cumulus => "power9",
            Self::P10 => "power10",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::P8 => "P8",
            Self::P9Nimbus => "P9 Nimbus",
            Self::P9Cumulus => "P9 Cumulus",
            Self::P10 => "P10",
        };
        f.write_str(s)
    }
}

/// Chip unit kinds that translate addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipUnit {
    /// A whole chiplet, selected by index.
    Chiplet,
    /// A core.
    Core,
    /// A core pair (P8, P9).
    Ex,
    /// A quad.
    Eq,
    /// A fused core (P10).
    Fc,
    /// Memory controller synchronous unit (P9 Nimbus).
    Mcs,
    /// Memory built-in self test unit (P9 Nimbus).
    Mcbist,
    /// Memory controller (P9 Cumulus, P10).
    Mc,
    /// Memory interface (P9 Cumulus).
    Mi,
    /// Memory channel (P10).
    Mcc,
}

impl ChipUnit {
    /// Every unit kind.
    pub const ALL: [Self; 10] = [
        Self::Chiplet,
        Self::Core,
        Self::Ex,
        Self::Eq,
        Self::Fc,
        Self::Mcs,
        Self::Mcbist,
        Self::Mc,
        Self::Mi,
        Self::Mcc,
    ];

    /// Class tag and compatible suffix.
    pub const fn class(self) -> &'static str {
        match self {
            Self::Chiplet => "chiplet",
            Self::Core => "core",
            Self::Ex => "ex",
            Self::Eq => "eq",
            Self::Fc => "fc",
            Self::Mcs => "mcs",
            Self::Mcbist => "mcbist",
            Self::Mc => "mc",
            Self::Mi => "mi",
            Self::Mcc => "mcc",
        }
    }

    /// Compatible string of this unit for `generation`.
    pub fn compatible(self, generation: Generation) -> String {
        format!("ibm,{}-{}", generation.family(), self.class())
    }

    /// Parses `ibm,<family>-<unit>` for the given generation.
    pub fn from_compatible(generation: Generation, compatible: &str) -> Option<Self> {
        let suffix = compatible
            .strip_prefix("ibm,")?
            .strip_prefix(generation.family())?
            .strip_prefix('-')?;
        Self::ALL.into_iter().find(|unit| unit.class() == suffix)
    }

    /// Translate function for this unit on `generation`, if the unit exists there.
    pub fn translator(self, generation: Generation) -> Option<TranslateFn> {
        use Generation::{P8, P9Cumulus, P9Nimbus, P10};

        let f: TranslateFn = match (generation, self) {
            (_, Self::Chiplet) => chiplet_translate,
            (P8, Self::Core | Self::Ex) => p8::core_translate,
            (P9Nimbus | P9Cumulus, Self::Core) => p9::core_translate,
            (P9Nimbus | P9Cumulus, Self::Eq) => p9::eq_translate,
            (P9Nimbus | P9Cumulus, Self::Ex) => p9::ex_translate,
            (P9Nimbus, Self::Mcs) | (P9Cumulus, Self::Mi) => p9::mcs_translate,
            (P9Nimbus, Self::Mcbist) | (P9Cumulus, Self::Mc) => p9::mcbist_translate,
            (P10, Self::Eq) => p10::eq_translate,
            (P10, Self::Core) => p10::core_translate,
            (P10, Self::Fc) => p10::fc_translate,
            (P10, Self::Mc) => p10::mc_translate,
            (P10, Self::Mcc) => p10::mcc_translate,
            _ => return None,
        };
        Some(f)
    }

    /// Returns `true` if the unit checks `NET_CTRL0` when probed.
    pub const fn probes_chiplet_enable(self, generation: Generation) -> bool {
        !matches!(generation, Generation::P8)
            && matches!(self, Self::Chiplet | Self::Core | Self::Eq)
    }
}

/// Unit number of a target, 0 when absent.
pub(crate) fn unit_index(target: &Target) -> u64 {
    target.index().unwrap_or_default() as u64
}

/// Chiplet: chiplet id `i`, on every generation.
pub fn chiplet_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, unit_index(target))
}
