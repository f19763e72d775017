//! Sv32 software MMU: satp decoding and the two-level page table walk.
//!
//! The walk is bounded to exactly two levels by construction. There is no
//! loop, so cyclic or self-referential guest tables cannot hang the
//! translator; a corrupted table is just an invalid-PTE fault.

pub mod pte;

use memory::PhysicalMemory;
use types::layout::{PAGE_SHIFT, PAGE_SIZE};
use types::{AccessType, PageFault, PageFaultKind, Privilege, VirtAddr};

pub use pte::{Pte, PteFlags, PTE_PPN_SHIFT};

/// Decoded satp register. Bit 31 selects Sv32, bits 30:22 carry the ASID
/// (preserved, unused for isolation in a single-hart core), bits 21:0 the
/// root page-table PPN.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Satp(pub u32);

pub const SATP_MODE_SV32: u32 = 1 << 31;
pub const SATP_PPN_MASK: u32 = 0x003f_ffff;
pub const SATP_ASID_MASK: u32 = 0x1ff << 22;

impl Satp {
    pub const fn new(raw: u32) -> Self {
        Satp(raw)
    }

    pub fn sv32_enabled(self) -> bool {
        self.0 & SATP_MODE_SV32 != 0
    }

    pub fn root_ppn(self) -> u32 {
        self.0 & SATP_PPN_MASK
    }

    pub fn asid(self) -> u32 {
        (self.0 & SATP_ASID_MASK) >> 22
    }
}

/// Translate a virtual address for the given access type and privilege mode.
///
/// Pure in its inputs apart from the hardware-managed A/D write-back: the
/// same address, mode and unchanged tables always yield the same physical
/// address or the same fault kind.
pub fn translate(
    mem: &mut PhysicalMemory,
    satp: Satp,
    mode: Privilege,
    vaddr: VirtAddr,
    access: AccessType,
) -> Result<u32, PageFault> {
    // Machine mode and bare satp bypass translation entirely.
    if mode == Privilege::Machine || !satp.sv32_enabled() {
        return Ok(vaddr.as_u32());
    }

    let va = vaddr.as_u32();
    let root_pa = page_base(satp.root_ppn(), va, 1)?;
    let pte1_addr = root_pa + vaddr.vpn1() * 4;
    let pte1 = read_pte(mem, pte1_addr, va, 1)?;

    if !pte1.is_valid() {
        return Err(PageFault::new(PageFaultKind::Invalid, va, 1));
    }

    if !pte1.is_pointer() {
        // Megapage leaf: VPN[0] folds into the offset. The low ten PPN bits
        // must be clear or no coherent physical address exists.
        if pte1.ppn() & 0x3ff != 0 {
            return Err(PageFault::new(PageFaultKind::Invalid, va, 1));
        }
        check_leaf(pte1, mode, access, va, 1)?;
        let pa = page_base(pte1.ppn(), va, 1)? | vaddr.megapage_offset();
        check_target(mem, pa, va, 1)?;
        update_accessed_dirty(mem, pte1_addr, pte1, access, va, 1)?;
        log::trace!("sv32: 0x{:08x} -> 0x{:08x} (megapage)", va, pa);
        return Ok(pa);
    }

    let table2_pa = page_base(pte1.ppn(), va, 1)?;
    let pte0_addr = table2_pa + vaddr.vpn0() * 4;
    let pte0 = read_pte(mem, pte0_addr, va, 0)?;

    if !pte0.is_valid() {
        return Err(PageFault::new(PageFaultKind::Invalid, va, 0));
    }
    if pte0.is_pointer() {
        // Two-level Sv32 has no third level; a pointer here is malformed.
        return Err(PageFault::new(PageFaultKind::Invalid, va, 0));
    }
    check_leaf(pte0, mode, access, va, 0)?;

    let pa = page_base(pte0.ppn(), va, 0)? | vaddr.offset();
    check_target(mem, pa, va, 0)?;
    update_accessed_dirty(mem, pte0_addr, pte0, access, va, 0)?;
    log::trace!("sv32: 0x{:08x} -> 0x{:08x}", va, pa);
    Ok(pa)
}

/// Byte address of a page given its PPN. Sv32 PPNs are 22 bits wide but
/// this core's physical space is 32-bit, so any PPN at or above 2^20 has no
/// representable byte address: shifting it would wrap modulo 2^32 and could
/// alias a mapped region. Such PPNs fault instead.
fn page_base(ppn: u32, va: u32, level: u8) -> Result<u32, PageFault> {
    if ppn >> 20 != 0 {
        return Err(PageFault::new(PageFaultKind::OutOfRange, va, level));
    }
    Ok(ppn << PAGE_SHIFT)
}

fn read_pte(
    mem: &mut PhysicalMemory,
    pte_addr: u32,
    va: u32,
    level: u8,
) -> Result<Pte, PageFault> {
    mem.load_u32(pte_addr)
        .map(Pte::new)
        .map_err(|_| PageFault::new(PageFaultKind::OutOfRange, va, level))
}

fn check_leaf(
    pte: Pte,
    mode: Privilege,
    access: AccessType,
    va: u32,
    level: u8,
) -> Result<(), PageFault> {
    if !pte.permits(access) {
        return Err(PageFault::new(PageFaultKind::Permission, va, level));
    }
    if mode == Privilege::User && !pte.is_user() {
        return Err(PageFault::new(PageFaultKind::Privilege, va, level));
    }
    Ok(())
}

/// The mapped page must exist inside the physical window. PPNs that escape
/// it fault instead of wrapping or clamping.
fn check_target(mem: &PhysicalMemory, pa: u32, va: u32, level: u8) -> Result<(), PageFault> {
    let page_base = pa & !(PAGE_SIZE - 1);
    if !mem.contains(page_base, PAGE_SIZE) {
        return Err(PageFault::new(PageFaultKind::OutOfRange, va, level));
    }
    Ok(())
}

/// Hardware-managed A/D bits: set Accessed on every successful translation
/// and Dirty on writes, but only write the entry back when a bit is actually
/// missing, so repeated translations are idempotent.
fn update_accessed_dirty(
    mem: &mut PhysicalMemory,
    pte_addr: u32,
    pte: Pte,
    access: AccessType,
    va: u32,
    level: u8,
) -> Result<(), PageFault> {
    let mut updated = pte;
    if !updated.is_accessed() {
        updated = updated.with_accessed();
    }
    if access == AccessType::Write && !updated.is_dirty() {
        updated = updated.with_dirty();
    }
    if updated != pte {
        mem.store_u32(pte_addr, updated.raw())
            .map_err(|_| PageFault::new(PageFaultKind::OutOfRange, va, level))?;
    }
    Ok(())
}
