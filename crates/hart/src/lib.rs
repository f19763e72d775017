//! Hart state: general-purpose registers, CSR bank, privilege mode and the
//! trap controller that moves between them.

pub mod csr;
pub mod registers;
pub mod trap;

use types::{HaltReason, Privilege};

pub use csr::{CsrBank, CsrError};
pub use registers::abi_name;

/// A single RV32 hardware thread.
#[derive(Clone, Debug)]
pub struct Hart {
    pub pc: u32,
    pub gpr: [u32; 32],
    pub csr: CsrBank,
    pub mode: Privilege,
    pub halted: bool,
    pub halt_reason: Option<HaltReason>,
    /// Active LR reservation, if any (physical address of the reserved word).
    pub reservation: Option<u32>,
}

impl Hart {
    pub fn new(entry: u32) -> Self {
        let mut hart = Self {
            pc: 0,
            gpr: [0; 32],
            csr: CsrBank::new(),
            mode: Privilege::Supervisor,
            halted: false,
            halt_reason: None,
            reservation: None,
        };
        hart.reset(entry);
        hart
    }

    /// Restore the power-on state and park the pc at `entry`. The hart comes
    /// up in supervisor mode with translation off (satp = 0).
    pub fn reset(&mut self, entry: u32) {
        self.pc = entry;
        self.gpr = [0; 32];
        self.csr = CsrBank::new();
        self.mode = Privilege::Supervisor;
        self.halted = false;
        self.halt_reason = None;
        self.reservation = None;
    }

    pub fn read_gpr(&self, index: usize) -> u32 {
        self.gpr[index & 0x1f]
    }

    /// x0 is hardwired to zero; writes to it are discarded.
    pub fn write_gpr(&mut self, index: usize, value: u32) {
        let index = index & 0x1f;
        if index != 0 {
            self.gpr[index] = value;
        }
    }

    /// Stop the hart permanently. The first reason wins; later calls on an
    /// already-halted hart are ignored.
    pub fn halt(&mut self, reason: HaltReason) {
        if !self.halted {
            log::warn!("hart halted: {}", reason);
            self.halted = true;
            self.halt_reason = Some(reason);
        }
    }
}
