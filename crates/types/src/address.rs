use core::fmt;

use crate::layout::{PAGE_OFFSET_MASK, PAGE_SHIFT, VPN_MASK};

/// Sv32 virtual address helper newtype.
///
/// Decomposition: `VPN[1] = bits[31:22]`, `VPN[0] = bits[21:12]`,
/// `offset = bits[11:0]`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct VirtAddr(pub u32);

impl VirtAddr {
    pub const fn new(addr: u32) -> Self {
        VirtAddr(addr)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn offset(self) -> u32 {
        self.0 & PAGE_OFFSET_MASK
    }

    pub const fn vpn0(self) -> u32 {
        (self.0 >> PAGE_SHIFT) & VPN_MASK
    }

    pub const fn vpn1(self) -> u32 {
        (self.0 >> (PAGE_SHIFT + 10)) & VPN_MASK
    }

    /// Offset within a 4 MiB megapage: VPN[0] folded in with the page offset.
    pub const fn megapage_offset(self) -> u32 {
        self.0 & 0x003f_ffff
    }

    pub fn wrapping_add(self, value: u32) -> Self {
        VirtAddr(self.0.wrapping_add(value))
    }
}

impl From<u32> for VirtAddr {
    fn from(value: u32) -> Self {
        VirtAddr(value)
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr(0x{:08x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
