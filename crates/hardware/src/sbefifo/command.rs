//! SBE FIFO command classes and opcodes.
//!
//! A command word is the 16-bit class code (`0xA100`..`0xA900`) OR'd with an
//! 8-bit opcode, so GetSCOM is `0x0000_A201`.

use std::fmt;

/// Command classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandClass {
    /// Istep execution and I/O suspension.
    Control,
    /// SCOM register access.
    Scom,
    /// Scan ring access.
    Ring,
    /// Host memory and SBE SRAM access.
    Memory,
    /// Core register access.
    Register,
    /// Fast array and trace array.
    Array,
    /// Thread instruction control.
    Instruction,
    /// FFDC, capabilities, quiesce, LPC timeout.
    Generic,
    /// Memory-preserving IPL.
    Mpipl,
}

impl CommandClass {
    /// The class code occupying bits 8..15 of the command word.
    pub const fn code(self) -> u32 {
        match self {
            Self::Control => 0xA100,
            Self::Scom => 0xA200,
            Self::Ring => 0xA300,
            Self::Memory => 0xA400,
            Self::Register => 0xA500,
            Self::Array => 0xA600,
            Self::Instruction => 0xA700,
            Self::Generic => 0xA800,
            Self::Mpipl => 0xA900,
        }
    }
}

/// Every command the codec can frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Command {
    IstepExecute,
    SuspendIo,
    GetScom,
    PutScom,
    ModifyScom,
    PutScomUnderMask,
    GetRing,
    PutRing,
    PutRingFromImage,
    GetMemory,
    PutMemory,
    GetSram,
    PutSram,
    GetRegisters,
    PutRegisters,
    FastArray,
    TraceArray,
    ControlInstruction,
    GetFfdc,
    GetCapabilities,
    Quiesce,
    LpcTimeout,
    EnterMpipl,
    ContinueMpipl,
    StopClocks,
    GetTiInfo,
}

impl Command {
    /// All commands, in wire order.
    pub const ALL: [Self; 26] = [
        Self::IstepExecute,
        Self::SuspendIo,
        Self::GetScom,
        Self::PutScom,
        Self::ModifyScom,
        Self::PutScomUnderMask,
        Self::GetRing,
        Self::PutRing,
        Self::PutRingFromImage,
        Self::GetMemory,
        Self::PutMemory,
        Self::GetSram,
        Self::PutSram,
        Self::GetRegisters,
        Self::PutRegisters,
        Self::FastArray,
        Self::TraceArray,
        Self::ControlInstruction,
        Self::GetFfdc,
        Self::GetCapabilities,
        Self::Quiesce,
        Self::LpcTimeout,
        Self::EnterMpipl,
        Self::ContinueMpipl,
        Self::StopClocks,
        Self::GetTiInfo,
    ];

    /// Command class.
    pub const fn class(self) -> CommandClass {
        match self {
            Self::IstepExecute | Self::SuspendIo => CommandClass::Control,
            Self::GetScom | Self::PutScom | Self::ModifyScom | Self::PutScomUnderMask => {
                CommandClass::Scom
            }
            Self::GetRing | Self::PutRing | Self::PutRingFromImage => CommandClass::Ring,
            Self::GetMemory | Self::PutMemory | Self::GetSram | Self::PutSram => {
                CommandClass::Memory
            }
            Self::GetRegisters | Self::PutRegisters => CommandClass::Register,
            Self::FastArray | Self::TraceArray => CommandClass::Array,
            Self::ControlInstruction => CommandClass::Instruction,
            Self::GetFfdc | Self::GetCapabilities | Self::Quiesce | Self::LpcTimeout => {
                CommandClass::Generic
            }
            Self::EnterMpipl | Self::ContinueMpipl | Self::StopClocks | Self::GetTiInfo => {
                CommandClass::Mpipl
            }
        }
    }

    /// Opcode within the class.
    pub const fn opcode(self) -> u32 {
        match self {
            Self::IstepExecute
            | Self::GetScom
            | Self::GetRing
            | Self::GetMemory
            | Self::GetRegisters
            | Self::FastArray
            | Self::ControlInstruction
            | Self::GetFfdc
            | Self::EnterMpipl => 0x01,
            Self::SuspendIo
            | Self::PutScom
            | Self::PutRing
            | Self::PutMemory
            | Self::PutRegisters
            | Self::TraceArray
            | Self::GetCapabilities
            | Self::ContinueMpipl => 0x02,
            Self::ModifyScom
            | Self::PutRingFromImage
            | Self::GetSram
            | Self::Quiesce
            | Self::StopClocks => 0x03,
            Self::PutScomUnderMask | Self::PutSram | Self::LpcTimeout | Self::GetTiInfo => 0x04,
        }
    }

    /// Command word sent as word 1 of a request.
    pub const fn code(self) -> u32 {
        self.class().code() | self.opcode()
    }

    /// Looks a command up by its command word.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Returns `true` for commands that need the long read timeout.
    pub const fn is_long_running(self) -> bool {
        matches!(
            self,
            Self::FastArray
                | Self::TraceArray
                | Self::EnterMpipl
                | Self::ContinueMpipl
                | Self::GetTiInfo
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({:#06x})", self.code())
    }
}

/// SBE target types used by ring, array and clock commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SbeTargetType {
    /// The processor chip.
    Proc = 0x0000,
    /// A pervasive chiplet.
    Perv = 0x0001,
    /// An EX pair.
    Ex = 0x0002,
    /// A memory controller synchronous unit.
    Mcs = 0x0003,
    /// A quad.
    Eq = 0x0004,
    /// A core.
    Core = 0x0005,
}

impl SbeTargetType {
    /// Packs the type and chiplet id into the `(type << 16) | chiplet` word.
    pub const fn word(self, chiplet: u8) -> u32 {
        ((self as u32) << 16) | chiplet as u32
    }
}
