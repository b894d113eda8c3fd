//! Constants shared across the topology, dispatcher, and SBE FIFO codec.

use super::bits::ppc_bit;

/// Property naming the unit number of a target within its class.
pub const PROP_INDEX: &str = "index";

/// Property holding a target's address cells (base offset and size).
pub const PROP_REG: &str = "reg";

/// Property on a parent giving the number of address cells in a child's `reg`.
pub const PROP_ADDRESS_CELLS: &str = "#address-cells";

/// Property on a parent giving the number of size cells in a child's `reg`.
pub const PROP_SIZE_CELLS: &str = "#size-cells";

/// Property on a system-tree node naming the backend node it aliases.
pub const PROP_DEVICE_PATH: &str = "device-path";

/// Property naming the kernel device node a backend driver opens.
pub const PROP_DEVICE: &str = "device";

/// Default `#address-cells` when a parent does not declare one.
pub const DEFAULT_ADDRESS_CELLS: usize = 2;

/// Default `#size-cells` when a parent does not declare one.
pub const DEFAULT_SIZE_CELLS: usize = 1;

/// Address bit selecting an indirect SCOM.
pub const INDIRECT_BIT: u64 = ppc_bit(0);

/// Bit set in the indirect register write to request a read.
pub const INDIRECT_READ_BIT: u64 = ppc_bit(0);

/// Address bit selecting indirect form 1, which is not supported.
pub const INDIRECT_FORM1_BIT: u64 = ppc_bit(3);

/// Portion of an indirect address carrying the direct SCOM address.
pub const INDIRECT_DIRECT_MASK: u64 = 0x7FFF_FFFF;

/// Portion of an indirect address carrying the indirect register address.
pub const INDIRECT_REG_MASK: u64 = 0x7FFF_FFFF_0000_0000;

/// Indirect status bit reporting completion.
pub const INDIRECT_DONE_BIT: u64 = ppc_bit(32);

/// Indirect status bits reporting a PCB error.
pub const INDIRECT_ERROR_MASK: u64 = 0x7000_0000;

/// Indirect data field width.
pub const INDIRECT_DATA_MASK: u64 = 0xFFFF;

/// Chiplet network control register used to test whether a chiplet is enabled.
pub const NET_CTRL0: u64 = 0x000F_0040;

/// `NET_CTRL0` bit set when the chiplet is enabled.
pub const NET_CTRL0_CHIPLET_ENABLE: u64 = ppc_bit(0);
