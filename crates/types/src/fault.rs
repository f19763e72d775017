use core::fmt;

use crate::privilege::AccessType;

/// Why a translation failed. All of these are recoverable by the guest: they
/// are routed through the trap controller into the S-mode handler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageFaultKind {
    /// PTE valid bit clear, malformed non-leaf at level 0, or misaligned
    /// megapage.
    Invalid,
    /// Leaf permission bits do not allow the requested access.
    Permission,
    /// User-mode access to a page without the U bit.
    Privilege,
    /// A PPN addresses memory outside the configured physical window.
    /// Defined as a fault rather than wrapping: the emulation must stay
    /// deterministic and debuggable.
    OutOfRange,
}

/// A failed translation: kind, faulting virtual address and walk level
/// (1 = root, 0 = leaf table).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageFault {
    pub kind: PageFaultKind,
    pub vaddr: u32,
    pub level: u8,
}

impl PageFault {
    pub const fn new(kind: PageFaultKind, vaddr: u32, level: u8) -> Self {
        Self { kind, vaddr, level }
    }

    /// The scause code this fault raises for a given access type.
    pub fn cause(&self, access: AccessType) -> TrapCause {
        match access {
            AccessType::Execute => TrapCause::InstructionPageFault,
            AccessType::Read => TrapCause::LoadPageFault,
            AccessType::Write => TrapCause::StorePageFault,
        }
    }
}

impl fmt::Display for PageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page fault ({:?}) at 0x{:08x}, level {}",
            self.kind, self.vaddr, self.level
        )
    }
}

/// Synchronous exception causes, with their standard scause encodings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrapCause {
    IllegalInstruction,
    Breakpoint,
    EcallFromUser,
    EcallFromSupervisor,
    EcallFromMachine,
    InstructionPageFault,
    LoadPageFault,
    StorePageFault,
}

impl TrapCause {
    pub fn code(self) -> u32 {
        match self {
            TrapCause::IllegalInstruction => 2,
            TrapCause::Breakpoint => 3,
            TrapCause::EcallFromUser => 8,
            TrapCause::EcallFromSupervisor => 9,
            TrapCause::EcallFromMachine => 11,
            TrapCause::InstructionPageFault => 12,
            TrapCause::LoadPageFault => 13,
            TrapCause::StorePageFault => 15,
        }
    }
}

/// A handled (non-fatal) trap, reported to the host for telemetry only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrapInfo {
    pub cause: TrapCause,
    pub tval: u32,
}

/// Why a hart stopped for good. Fatal conditions are never silently
/// degraded: the core halts and surfaces the reason instead of producing an
/// unverifiable partial state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HaltReason {
    /// stvec had the vectored bit set when a trap was taken.
    UnsupportedVectoredTrap,
    /// A trap was raised while already in Machine mode; no higher level
    /// exists to take it.
    TrapInMachineMode,
    /// A bare-mode physical access landed outside every configured region.
    OutOfRangePhysicalAccess,
    /// The guest executed EBREAK.
    GuestHalt,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            HaltReason::UnsupportedVectoredTrap => "vectored stvec is not supported",
            HaltReason::TrapInMachineMode => "trap taken while in machine mode",
            HaltReason::OutOfRangePhysicalAccess => "bare physical access out of range",
            HaltReason::GuestHalt => "guest requested halt",
        };
        write!(f, "{}", msg)
    }
}
