//! SCOM address field accessors.
//!
//! Fields live in the low 32 bits of a SCOM address. Setters replace only the
//! selected field and leave the indirect bits in the high word untouched.

use crate::common::{get_field, set_field};

/// Chiplet id, IBM bits 2..7 of the low word.
pub const CHIPLET_MASK: u64 = 0x3F00_0000;
/// Port or endpoint, IBM bits 12..15.
pub const PORT_MASK: u64 = 0x000F_0000;
/// P10 region select, IBM bits 16..19.
pub const REGION_MASK: u64 = 0x0000_F000;
/// Ring id, IBM bits 18..21.
pub const RING_MASK: u64 = 0x0000_3C00;
/// Satellite id, IBM bits 22..25.
pub const SAT_ID_MASK: u64 = 0x0000_03C0;
/// Satellite register offset, IBM bits 26..31.
pub const SAT_OFFSET_MASK: u64 = 0x0000_003F;

/// Returns the chiplet id field.
#[inline(always)]
pub const fn chiplet_id(addr: u64) -> u64 {
    get_field(CHIPLET_MASK, addr)
}

/// Replaces the chiplet id field.
#[inline(always)]
pub const fn set_chiplet_id(addr: u64, value: u64) -> u64 {
    set_field(CHIPLET_MASK, addr, value)
}

/// Returns the port field.
#[inline(always)]
pub const fn port(addr: u64) -> u64 {
    get_field(PORT_MASK, addr)
}

/// Replaces the port field.
#[inline(always)]
pub const fn set_port(addr: u64, value: u64) -> u64 {
    set_field(PORT_MASK, addr, value)
}

/// Returns the P10 region select field.
#[inline(always)]
pub const fn region(addr: u64) -> u64 {
    get_field(REGION_MASK, addr)
}

/// Replaces the P10 region select field.
#[inline(always)]
pub const fn set_region(addr: u64, value: u64) -> u64 {
    set_field(REGION_MASK, addr, value)
}

/// Returns the ring id field.
#[inline(always)]
pub const fn ring_id(addr: u64) -> u64 {
    get_field(RING_MASK, addr)
}

/// Replaces the ring id field.
#[inline(always)]
pub const fn set_ring_id(addr: u64, value: u64) -> u64 {
    set_field(RING_MASK, addr, value)
}

/// Returns the satellite id field.
#[inline(always)]
pub const fn sat_id(addr: u64) -> u64 {
    get_field(SAT_ID_MASK, addr)
}

/// Replaces the satellite id field.
#[inline(always)]
pub const fn set_sat_id(addr: u64, value: u64) -> u64 {
    set_field(SAT_ID_MASK, addr, value)
}

/// Returns the satellite offset field.
#[inline(always)]
pub const fn sat_offset(addr: u64) -> u64 {
    get_field(SAT_OFFSET_MASK, addr)
}

/// Replaces the satellite offset field.
#[inline(always)]
pub const fn set_sat_offset(addr: u64, value: u64) -> u64 {
    set_field(SAT_OFFSET_MASK, addr, value)
}
