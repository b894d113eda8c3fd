//! Common utilities and types used throughout the crate.
//!
//! This module provides the building blocks shared by the topology, the
//! dispatcher, and the SBE FIFO codec. It includes:
//! 1. **Bit helpers:** IBM (MSB-0) bit numbering and field extraction.
//! 2. **Constants:** Property names, indirect SCOM bits, and chiplet registers.
//! 3. **Error Handling:** The crate-wide `Error` and framing `ProtocolError`.

/// IBM bit numbering and field helpers.
pub mod bits;

/// Property names and register constants.
pub mod constants;

/// Error types.
pub mod error;

pub use bits::{get_field, join_u64, ppc_bit, ppc_bit32, ppc_bitmask, set_field, split_u64};
pub use error::{Error, ProtocolError, Result};
