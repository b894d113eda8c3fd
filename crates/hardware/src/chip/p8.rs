//! POWER8 translation.
//!
//! Cores and EXs share one chiplet per core, starting at `0x10`.

use crate::target::Target;

use super::scom_addr::set_chiplet_id;
use super::unit_index;

/// Chiplet of core 0.
pub const CORE_CHIPLET_BASE: u64 = 0x10;

/// Core and EX: chiplet `0x10 + i`.
pub fn core_translate(target: &Target, addr: u64) -> u64 {
    set_chiplet_id(addr, CORE_CHIPLET_BASE + unit_index(target))
}
