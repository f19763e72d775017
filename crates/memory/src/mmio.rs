//! Host hook for device windows.
//!
//! The core guarantees that the physical address handed to a handler is
//! correct; device semantics (UART, CLINT, PLIC) live entirely on the host
//! side of this trait.

/// Intercepts loads and stores that land in an MMIO region.
///
/// Returning `None`/`false` means "not handled": the access falls through to
/// the backing bytes, which keeps device windows readable before any
/// emulation is attached.
pub trait MmioHandler {
    fn load(&mut self, _addr: u32, _size: u32) -> Option<u32> {
        None
    }

    fn store(&mut self, _addr: u32, _size: u32, _val: u32) -> bool {
        false
    }
}

/// Default handler: every device window behaves like plain RAM.
pub struct RamMmio;

impl MmioHandler for RamMmio {}
