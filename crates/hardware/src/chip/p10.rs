//! POWER10 translation.
//!
//! Four cores share a quad chiplet and are selected by a one-hot region
//! field. Fused cores select a region pair. Memory channels are banked by odd
//! and even instance across satellite ids and offsets.

use crate::target::Target;

use super::scom_addr::{
    sat_id, sat_offset, set_chiplet_id, set_region, set_sat_id, set_sat_offset,
};
use super::unit_index;

/// Chiplet of quad 0.
pub const EQ_CHIPLET_BASE: u64 = 0x20;
/// Chiplet of memory controller 0.
pub const MC_CHIPLET_BASE: u64 = 0x0C;

/// Quad: chiplet `0x20 + i`.
pub fn eq_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, EQ_CHIPLET_BASE + unit_index(target))
}

/// Core: chiplet `0x20 + i/4`, region `0x8 >> (i % 4)`.
pub fn core_translate(target: &Target, addr: u64) -> u64 {
    let i = unit_index(target);
    set_region(set_chiplet_id(addr, EQ_CHIPLET_BASE + i / 4), 0x8 >> (i % 4))
}

/// Fused core: chiplet `0x20 + i/2`, region `0xC` for even and `0x3` for odd.
pub fn fc_translate(target: &Target, addr: u64) -> u64 {
    let i = unit_index(target);
    let region = if i % 2 == 0 { 0xC } else { 0x3 };
    set_region(set_chiplet_id(addr, EQ_CHIPLET_BASE + i / 2), region)
}

/// Memory controller: chiplet `0x0C + i`.
pub fn mc_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, MC_CHIPLET_BASE + unit_index(target))
}

/// Memory channel: chiplet `0x0C + i/4`, banked satellite id and offset.
pub fn mcc_translate(target: &Target, addr: u64) -> u64 {
    let i = unit_index(target);
    let addr = set_chiplet_id(addr, MC_CHIPLET_BASE + i / 4);
    let addr = set_sat_id(addr, (sat_id(addr) & !1) | ((i / 2) % 2));
    set_sat_offset(addr, (sat_offset(addr) & 0x0F) | ((i % 2) << 4))
}
