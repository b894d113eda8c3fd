//! SBE FIFO protocol codec.
//!
//! This module frames requests to the Self-Boot Engine and parses its replies.
//! It includes:
//! 1. **Framing:** Command words, request encoding, and trailer-located reply parsing.
//! 2. **Diagnostics:** Status word decoding and FFDC retention.
//! 3. **Transport:** File descriptor and callback channels with a scoped read timeout.
//! 4. **Commands:** One module per command class, each adding operations to `Session`.

/// Array class.
pub mod array;
/// Command classes and opcodes.
pub mod command;
/// Control class.
pub mod control;
/// Status words and FFDC.
pub mod ffdc;
/// Request and reply framing.
pub mod frame;
/// Generic class.
pub mod generic;
/// Instruction class.
pub mod instruction;
/// Memory class.
pub mod memory;
/// MPIPL class.
pub mod mpipl;
/// Register class.
pub mod register;
/// Ring class.
pub mod ring;
/// SCOM class.
pub mod scom;
/// Session state.
pub mod session;
/// Transports.
pub mod transport;

pub use array::FastArrayMode;
pub use command::{Command, CommandClass, SbeTargetType};
pub use ffdc::{Ffdc, SbeStatus};
pub use frame::{Reply, Request, build_reply, parse_reply};
pub use generic::SbeCapabilities;
pub use instruction::{ThreadMode, ThreadOp};
pub use memory::{MemData, MemFlags};
pub use register::RegisterType;
pub use scom::ModifyOp;
pub use session::Session;
pub use transport::{CallbackTransport, FdTransport, TimeoutGuard, Transport};
