//! Flat physical memory buffer for one machine instance.
//!
//! Guest-physical ranges (kernel RAM, low boot RAM, MMIO windows) map onto a
//! single backing `Vec<u8>` at fixed offsets. Each machine owns its buffer
//! outright; cross-instance isolation is by construction, not locking.

pub mod mmio;

use core::fmt;

use types::layout::{MemoryLayout, RegionKind};

pub use mmio::{MmioHandler, RamMmio};

/// A physical access that cannot be satisfied by any configured region.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutOfRange {
    pub addr: u32,
    pub len: u32,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "physical access out of range: 0x{:08x} (+{})",
            self.addr, self.len
        )
    }
}

struct MappedRegion {
    base: u32,
    size: u32,
    kind: RegionKind,
    /// Offset of this region inside the backing buffer.
    offset: usize,
}

/// The flat byte-addressable physical memory of one machine.
pub struct PhysicalMemory {
    buf: Vec<u8>,
    map: Vec<MappedRegion>,
    mmio: Box<dyn MmioHandler>,
}

impl PhysicalMemory {
    pub fn new(layout: &MemoryLayout) -> Self {
        Self::with_mmio(layout, Box::new(RamMmio))
    }

    /// Build the region map, packing regions into the backing buffer in
    /// layout order. The device-emulation layer intercepts MMIO accesses;
    /// this crate only resolves addresses.
    pub fn with_mmio(layout: &MemoryLayout, mmio: Box<dyn MmioHandler>) -> Self {
        let mut map = Vec::with_capacity(layout.regions.len());
        let mut offset = 0usize;
        for region in &layout.regions {
            map.push(MappedRegion {
                base: region.base,
                size: region.size,
                kind: region.kind,
                offset,
            });
            offset += region.size as usize;
        }
        log::debug!(
            "physical memory: {} regions, {} bytes backing",
            map.len(),
            offset
        );
        Self {
            buf: vec![0u8; offset],
            map,
            mmio,
        }
    }

    /// Resolve a physical address to a backing-buffer offset. The whole
    /// `len`-byte access must fall inside one region.
    fn resolve(&self, addr: u32, len: u32) -> Result<(usize, RegionKind), OutOfRange> {
        for region in &self.map {
            if addr >= region.base
                && addr
                    .checked_add(len)
                    .is_some_and(|end| end <= region.base + region.size)
            {
                return Ok((region.offset + (addr - region.base) as usize, region.kind));
            }
        }
        Err(OutOfRange { addr, len })
    }

    /// True if `addr..addr+len` is backed by some region.
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        self.resolve(addr, len).is_ok()
    }

    pub fn load_u8(&mut self, addr: u32) -> Result<u8, OutOfRange> {
        let (off, kind) = self.resolve(addr, 1)?;
        if kind == RegionKind::Mmio {
            if let Some(v) = self.mmio.load(addr, 1) {
                return Ok(v as u8);
            }
        }
        Ok(self.buf[off])
    }

    pub fn load_u16(&mut self, addr: u32) -> Result<u16, OutOfRange> {
        let (off, kind) = self.resolve(addr, 2)?;
        if kind == RegionKind::Mmio {
            if let Some(v) = self.mmio.load(addr, 2) {
                return Ok(v as u16);
            }
        }
        Ok(u16::from_le_bytes([self.buf[off], self.buf[off + 1]]))
    }

    pub fn load_u32(&mut self, addr: u32) -> Result<u32, OutOfRange> {
        let (off, kind) = self.resolve(addr, 4)?;
        if kind == RegionKind::Mmio {
            if let Some(v) = self.mmio.load(addr, 4) {
                return Ok(v);
            }
        }
        Ok(u32::from_le_bytes([
            self.buf[off],
            self.buf[off + 1],
            self.buf[off + 2],
            self.buf[off + 3],
        ]))
    }

    pub fn store_u8(&mut self, addr: u32, val: u8) -> Result<(), OutOfRange> {
        let (off, kind) = self.resolve(addr, 1)?;
        if kind == RegionKind::Mmio && self.mmio.store(addr, 1, val as u32) {
            return Ok(());
        }
        self.buf[off] = val;
        Ok(())
    }

    pub fn store_u16(&mut self, addr: u32, val: u16) -> Result<(), OutOfRange> {
        let (off, kind) = self.resolve(addr, 2)?;
        if kind == RegionKind::Mmio && self.mmio.store(addr, 2, val as u32) {
            return Ok(());
        }
        self.buf[off..off + 2].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    pub fn store_u32(&mut self, addr: u32, val: u32) -> Result<(), OutOfRange> {
        let (off, kind) = self.resolve(addr, 4)?;
        if kind == RegionKind::Mmio && self.mmio.store(addr, 4, val) {
            return Ok(());
        }
        self.buf[off..off + 4].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    /// Host-side bulk write (image loading). Bypasses the MMIO handler.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), OutOfRange> {
        let (off, _) = self.resolve(addr, data.len() as u32)?;
        self.buf[off..off + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Host-side bulk read (debug dumps, assertions in tests).
    pub fn read(&self, addr: u32, len: u32) -> Result<&[u8], OutOfRange> {
        let (off, _) = self.resolve(addr, len)?;
        Ok(&self.buf[off..off + len as usize])
    }
}

impl fmt::Debug for PhysicalMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalMemory")
            .field("regions", &self.map.len())
            .field("backing_bytes", &self.buf.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::layout::{RAM_BASE, UART_BASE};

    #[test]
    fn ram_round_trip() {
        let mut mem = PhysicalMemory::new(&MemoryLayout::default());
        mem.store_u32(RAM_BASE, 0xdead_beef).unwrap();
        assert_eq!(mem.load_u32(RAM_BASE).unwrap(), 0xdead_beef);
        mem.store_u8(RAM_BASE + 4, 0x7f).unwrap();
        assert_eq!(mem.load_u8(RAM_BASE + 4).unwrap(), 0x7f);
    }

    #[test]
    fn low_ram_is_distinct_from_high_ram() {
        let mut mem = PhysicalMemory::new(&MemoryLayout::default());
        mem.store_u32(0x2000, 0x1111_1111).unwrap();
        mem.store_u32(RAM_BASE + 0x2000, 0x2222_2222).unwrap();
        assert_eq!(mem.load_u32(0x2000).unwrap(), 0x1111_1111);
        assert_eq!(mem.load_u32(RAM_BASE + 0x2000).unwrap(), 0x2222_2222);
    }

    #[test]
    fn unmapped_access_is_out_of_range() {
        let mut mem = PhysicalMemory::new(&MemoryLayout::default());
        let err = mem.load_u32(0x4000_0000).unwrap_err();
        assert_eq!(err, OutOfRange { addr: 0x4000_0000, len: 4 });
    }

    #[test]
    fn access_straddling_region_end_faults() {
        let mut mem = PhysicalMemory::new(&MemoryLayout::default());
        // Last byte of the UART window exists, but a 4-byte access does not fit.
        assert!(mem.load_u8(UART_BASE + 0xff).is_ok());
        assert!(mem.load_u32(UART_BASE + 0xfd).is_err());
    }

    #[test]
    fn default_mmio_is_ram_backed() {
        let mut mem = PhysicalMemory::new(&MemoryLayout::default());
        mem.store_u32(UART_BASE, 0x41).unwrap();
        assert_eq!(mem.load_u32(UART_BASE).unwrap(), 0x41);
    }

    #[test]
    fn bulk_write_then_read() {
        let mut mem = PhysicalMemory::new(&MemoryLayout::default());
        let image = [0x13u8, 0x05, 0xa0, 0x02];
        mem.write(RAM_BASE, &image).unwrap();
        assert_eq!(mem.read(RAM_BASE, 4).unwrap(), &image);
    }
}
