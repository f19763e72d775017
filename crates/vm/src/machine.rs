//! One virtual machine instance: a hart, its physical memory and the
//! interrupt controller, stepped from the host.

use hart::{abi_name, Hart};
use memory::{OutOfRange, PhysicalMemory};
use types::layout::MemoryLayout;
use types::HaltReason;

use crate::exec::{step, StepResult};
use crate::plic::Plic;

pub struct Machine {
    pub hart: Hart,
    pub memory: PhysicalMemory,
    plic: Plic,
}

impl Machine {
    /// Build a machine with the given physical layout, hart parked at
    /// `entry` in supervisor mode with translation off.
    pub fn new(layout: &MemoryLayout, entry: u32) -> Self {
        Self {
            hart: Hart::new(entry),
            memory: PhysicalMemory::new(layout),
            plic: Plic::new(),
        }
    }

    /// Copy a flat binary image into physical memory at `base`.
    pub fn load_image(&mut self, base: u32, image: &[u8]) -> Result<(), OutOfRange> {
        log::info!("loading {} byte image at 0x{:08x}", image.len(), base);
        self.memory.write(base, image)
    }

    /// Reset the hart and restart from `entry`. Memory contents survive.
    pub fn reset(&mut self, entry: u32) {
        self.hart.reset(entry);
    }

    /// Execute one instruction. A no-op once the machine has halted.
    pub fn step(&mut self) -> StepResult {
        // Interrupts would be claimed here before the fetch; no source is
        // wired up yet, so this never fires.
        if let Some(irq) = self.plic.pending_interrupt() {
            log::warn!("ignoring pending interrupt {}", irq);
        }
        step(&mut self.hart, &mut self.memory)
    }

    /// Step until the machine halts or `max_steps` runs out. Returns the
    /// halt reason, or `None` if the budget ran out first.
    pub fn run(&mut self, max_steps: u64) -> Option<HaltReason> {
        for _ in 0..max_steps {
            let result = self.step();
            if result.halted {
                return result.halt_reason;
            }
        }
        None
    }

    pub fn halted(&self) -> bool {
        self.hart.halted
    }

    /// Human-readable register and CSR state for crash reports.
    pub fn dump_state(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "pc = 0x{:08x}  mode = {}\n",
            self.hart.pc, self.hart.mode
        ));
        for (i, chunk) in self.hart.gpr.chunks(4).enumerate() {
            for (j, value) in chunk.iter().enumerate() {
                let idx = i * 4 + j;
                out.push_str(&format!("{:>4} = 0x{:08x}  ", abi_name(idx), value));
            }
            out.push('\n');
        }
        for (name, value) in self.hart.csr.dump() {
            out.push_str(&format!("{:>8} = 0x{:08x}\n", name, value));
        }
        out.push_str(&format!(
            "   cycle = {}  instret = {}\n",
            self.hart.csr.cycle, self.hart.csr.instret
        ));
        out
    }
}
