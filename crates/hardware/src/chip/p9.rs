//! POWER9 translation.
//!
//! Nimbus and Cumulus share the core, quad and EX layout and differ in the
//! memory units: Nimbus has MCS/MCBIST, Cumulus has MC/MI.

use crate::target::Target;

use super::scom_addr::{chiplet_id, ring_id, set_chiplet_id, set_ring_id, set_sat_id};
use super::unit_index;

/// Chiplet of quad 0.
pub const EQ_CHIPLET_BASE: u64 = 0x10;
/// Chiplet of core 0.
pub const CORE_CHIPLET_BASE: u64 = 0x20;
/// Chiplet of the first memory unit.
pub const MC_CHIPLET_BASE: u64 = 0x07;

/// Core: chiplet `0x20 + i`.
pub fn core_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, CORE_CHIPLET_BASE + unit_index(target))
}

/// Quad: chiplet `0x10 + i`.
pub fn eq_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, EQ_CHIPLET_BASE + unit_index(target))
}

/// EX, a core pair within a quad.
///
/// Quad-range addresses pick the quad and the ring of the same parity as the
/// EX. Core-range addresses keep the core parity and pick the pair.
pub fn ex_translate(target: &Target, addr: u64) -> u64 {
    let i = unit_index(target);
    let chiplet = chiplet_id(addr);
    match chiplet {
        0x10..=0x15 => {
            let ring = ring_id(addr);
            let addr = set_chiplet_id(addr, EQ_CHIPLET_BASE + i / 2);
            set_ring_id(addr, ring - ring % 2 + i % 2)
        }
        0x20..=0x37 => set_chiplet_id(addr, CORE_CHIPLET_BASE + chiplet % 2 + 2 * i),
        _ => addr,
    }
}

/// Nimbus MCS and Cumulus MI: chiplet `0x07 + i/2`, satellite `2 * (i % 2)`.
pub fn mcs_translate(target: &Target, addr: u64) -> u64 {
    let i = unit_index(target);
    set_sat_id(set_chiplet_id(addr, MC_CHIPLET_BASE + i / 2), 2 * (i % 2))
}

/// Nimbus MCBIST and Cumulus MC: chiplet `0x07 + i`.
pub fn mcbist_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, MC_CHIPLET_BASE + unit_index(target))
}
