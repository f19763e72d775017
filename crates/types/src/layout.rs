//! Guest-physical memory layout.
//!
//! Offsets are configuration supplied by the host at machine creation, not
//! baked-in constants. The defaults mirror the GPU shader harness layout:
//! kernel RAM high, boot/page-table RAM low, MMIO windows for UART, CLINT
//! and PLIC in between.

pub const PAGE_SIZE: u32 = 4096;
pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_OFFSET_MASK: u32 = 0xfff;
pub const VPN_MASK: u32 = 0x3ff;

/// Default base of kernel RAM (and kernel entry point).
pub const RAM_BASE: u32 = 0x8000_0000;
/// Default kernel RAM size (64 MiB).
pub const RAM_SIZE: u32 = 64 * 1024 * 1024;
/// Default base of low boot RAM holding early page tables and the framebuffer.
pub const LOW_RAM_BASE: u32 = 0x0000_0000;
/// Default low RAM size (32 MiB), ending flush against the CLINT window.
pub const LOW_RAM_SIZE: u32 = 32 * 1024 * 1024;
/// Default framebuffer base inside low RAM.
pub const FRAMEBUFFER_BASE: u32 = 0x0100_0000;

pub const UART_BASE: u32 = 0x1000_0000;
pub const UART_SIZE: u32 = 0x100;
pub const CLINT_BASE: u32 = 0x0200_0000;
pub const CLINT_SIZE: u32 = 0x1_0000;
pub const PLIC_BASE: u32 = 0x0c00_0000;
pub const PLIC_SIZE: u32 = 0x40_0000;

/// What a physical region is backed by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegionKind {
    /// Plain RAM: loads and stores hit the flat buffer directly.
    Ram,
    /// Device window: accesses are offered to the host's MMIO handler first.
    Mmio,
}

/// One contiguous guest-physical range.
#[derive(Clone, Copy, Debug)]
pub struct Region {
    pub base: u32,
    pub size: u32,
    pub kind: RegionKind,
}

impl Region {
    pub const fn new(base: u32, size: u32, kind: RegionKind) -> Self {
        Self { base, size, kind }
    }

    pub fn contains(&self, addr: u32, len: u32) -> bool {
        addr >= self.base
            && addr
                .checked_add(len)
                .is_some_and(|end| end <= self.base + self.size)
    }
}

/// Host-supplied physical memory map for one machine instance.
#[derive(Clone, Debug)]
pub struct MemoryLayout {
    pub regions: Vec<Region>,
    /// Where the kernel image is loaded and where the hart resets to.
    pub kernel_base: u32,
    pub framebuffer_base: u32,
}

impl MemoryLayout {
    /// Total bytes of backing storage required by all regions.
    pub fn backing_size(&self) -> usize {
        self.regions.iter().map(|r| r.size as usize).sum()
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            regions: vec![
                Region::new(LOW_RAM_BASE, LOW_RAM_SIZE, RegionKind::Ram),
                Region::new(CLINT_BASE, CLINT_SIZE, RegionKind::Mmio),
                Region::new(PLIC_BASE, PLIC_SIZE, RegionKind::Mmio),
                Region::new(UART_BASE, UART_SIZE, RegionKind::Mmio),
                Region::new(RAM_BASE, RAM_SIZE, RegionKind::Ram),
            ],
            kernel_base: RAM_BASE,
            framebuffer_base: FRAMEBUFFER_BASE,
        }
    }
}
