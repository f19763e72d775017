//! Sv32 page table entries.
//!
//! A PTE is a 32-bit word: flags in bits 9:0, PPN in bits 31:10. The core
//! never mutates entries except to set the Accessed/Dirty bits on a
//! successful translation.

use bitflags::bitflags;

use types::AccessType;

bitflags! {
    /// Flag bits of an Sv32 PTE.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct PteFlags: u32 {
        const VALID    = 1 << 0;
        const READ     = 1 << 1;
        const WRITE    = 1 << 2;
        const EXECUTE  = 1 << 3;
        const USER     = 1 << 4;
        const GLOBAL   = 1 << 5;
        const ACCESSED = 1 << 6;
        const DIRTY    = 1 << 7;
        /// Reserved for software, ignored by the walker.
        const RSW      = 0b11 << 8;
    }
}

/// Number of bits the PPN is shifted into the entry.
pub const PTE_PPN_SHIFT: u32 = 10;

/// Typed wrapper around a raw 32-bit entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pte(pub u32);

impl Pte {
    pub const fn new(raw: u32) -> Self {
        Pte(raw)
    }

    /// Construct an entry from a PPN and flags (guest-side table building).
    pub fn leaf(ppn: u32, flags: PteFlags) -> Self {
        Pte((ppn << PTE_PPN_SHIFT) | flags.bits())
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn flags(self) -> PteFlags {
        PteFlags::from_bits_truncate(self.0)
    }

    pub fn is_valid(self) -> bool {
        self.flags().contains(PteFlags::VALID)
    }

    /// A valid entry with R=W=X=0 points at the next-level table.
    pub fn is_pointer(self) -> bool {
        !self
            .flags()
            .intersects(PteFlags::READ | PteFlags::WRITE | PteFlags::EXECUTE)
    }

    pub fn is_user(self) -> bool {
        self.flags().contains(PteFlags::USER)
    }

    pub fn is_accessed(self) -> bool {
        self.flags().contains(PteFlags::ACCESSED)
    }

    pub fn is_dirty(self) -> bool {
        self.flags().contains(PteFlags::DIRTY)
    }

    pub fn permits(self, access: AccessType) -> bool {
        let required = match access {
            AccessType::Read => PteFlags::READ,
            AccessType::Write => PteFlags::WRITE,
            AccessType::Execute => PteFlags::EXECUTE,
        };
        self.flags().contains(required)
    }

    pub fn ppn(self) -> u32 {
        self.0 >> PTE_PPN_SHIFT
    }

    pub fn with_accessed(self) -> Self {
        Pte(self.0 | PteFlags::ACCESSED.bits())
    }

    pub fn with_dirty(self) -> Self {
        Pte(self.0 | PteFlags::DIRTY.bits())
    }
}
