//! IBM (MSB-0) bit numbering helpers.
//!
//! POWER documentation numbers bits from the most significant end: bit 0 of a
//! 64-bit register is `1 << 63`. These helpers keep register definitions in
//! that numbering so they can be compared directly against hardware manuals.

/// Returns the mask for IBM bit `bit` of a 64-bit value.
#[inline(always)]
pub const fn ppc_bit(bit: u32) -> u64 {
    0x8000_0000_0000_0000 >> bit
}

/// Returns the mask covering IBM bits `from..=to` of a 64-bit value.
#[inline(always)]
pub const fn ppc_bitmask(from: u32, to: u32) -> u64 {
    (ppc_bit(from) - ppc_bit(to)) | ppc_bit(from)
}

/// Returns the mask for IBM bit `bit` of a 32-bit value.
#[inline(always)]
pub const fn ppc_bit32(bit: u32) -> u32 {
    0x8000_0000 >> bit
}

/// Extracts the field selected by `mask`, shifted down to bit 0.
#[inline(always)]
pub const fn get_field(mask: u64, value: u64) -> u64 {
    (value & mask) >> mask.trailing_zeros()
}

/// Replaces the field selected by `mask` with `field`.
#[inline(always)]
pub const fn set_field(mask: u64, value: u64, field: u64) -> u64 {
    (value & !mask) | ((field << mask.trailing_zeros()) & mask)
}

/// Splits a 64-bit quantity into its big-endian word halves.
#[inline(always)]
pub const fn split_u64(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, value as u32)
}

/// Joins two big-endian word halves.
#[inline(always)]
pub const fn join_u64(hi: u32, lo: u32) -> u64 {
    ((hi as u64) << 32) | lo as u64
}
