//! The instruction execution loop.
//!
//! One call to [`step`] retires at most one instruction, driven through an
//! explicit phase machine: fetch, decode, execute, then retired or faulted.
//! A fault in any phase routes through the trap controller and ends the
//! step; the handler runs on subsequent steps like any other guest code.

use hart::trap::{mret, raise_trap, sret};
use hart::Hart;
use memory::PhysicalMemory;
use mmu::Satp;
use types::{AccessType, HaltReason, Privilege, TrapCause, TrapInfo, VirtAddr};

use crate::decoder::decode;
use crate::instruction::Instruction;

/// Where a step currently is. `Decoding` and `Executing` carry the fetched
/// word so no phase depends on state outside the machine.
#[derive(Debug)]
pub enum Phase {
    Fetching,
    Decoding(u32),
    Executing(Instruction, u32),
    Retired,
    Faulted,
}

/// What the host sees after each step.
#[derive(Clone, Copy, Debug)]
pub struct StepResult {
    /// pc after the step (the next instruction, or the trap handler).
    pub pc: u32,
    pub halted: bool,
    pub halt_reason: Option<HaltReason>,
    /// Set when this step took a recoverable trap. Telemetry only; the
    /// guest handler owns the architectural response.
    pub trap: Option<TrapInfo>,
}

/// A non-retiring outcome of some phase: either a trap the guest handles or
/// a condition the core refuses to continue past.
enum Event {
    Trap(TrapCause, u32),
    Halt(HaltReason),
}

/// How a retired instruction left the pc: advancing to the next word, or
/// redirected by a taken control transfer (which may target itself).
#[derive(Clone, Copy, Eq, PartialEq)]
enum Flow {
    Sequential,
    Redirected,
}

/// Execute one instruction on `hart`.
///
/// Calling this on a halted hart is a no-op that reports the existing halt
/// state, so host loops need no special casing.
pub fn step(hart: &mut Hart, mem: &mut PhysicalMemory) -> StepResult {
    if hart.halted {
        return StepResult {
            pc: hart.pc,
            halted: true,
            halt_reason: hart.halt_reason,
            trap: None,
        };
    }

    hart.csr.cycle += 1;

    let mut trap = None;
    let mut phase = Phase::Fetching;
    loop {
        phase = match phase {
            Phase::Fetching => match fetch(hart, mem) {
                Ok(word) => Phase::Decoding(word),
                Err(event) => {
                    trap = deliver(hart, event);
                    Phase::Faulted
                }
            },
            Phase::Decoding(word) => match decode(word) {
                Some(inst) => Phase::Executing(inst, word),
                None => {
                    trap = deliver(hart, Event::Trap(TrapCause::IllegalInstruction, word));
                    Phase::Faulted
                }
            },
            Phase::Executing(inst, word) => {
                log::trace!("0x{:08x}: {}", hart.pc, inst.pretty_print());
                match execute(hart, mem, inst, word) {
                    Ok(flow) => {
                        // Taken jumps, branches and trap returns own the pc,
                        // including self-targets like `j .` park loops;
                        // everything else falls through to the next word.
                        if flow == Flow::Sequential {
                            hart.pc = hart.pc.wrapping_add(4);
                        }
                        hart.csr.instret += 1;
                        Phase::Retired
                    }
                    Err(event) => {
                        trap = deliver(hart, event);
                        Phase::Faulted
                    }
                }
            }
            Phase::Retired | Phase::Faulted => break,
        };
    }

    StepResult {
        pc: hart.pc,
        halted: hart.halted,
        halt_reason: hart.halt_reason,
        trap,
    }
}

/// Route an event: traps go through the trap controller, fatal conditions
/// stop the hart with its state intact.
fn deliver(hart: &mut Hart, event: Event) -> Option<TrapInfo> {
    match event {
        Event::Trap(cause, tval) => {
            raise_trap(hart, cause, tval);
            Some(TrapInfo { cause, tval })
        }
        Event::Halt(reason) => {
            hart.halt(reason);
            None
        }
    }
}

fn translation_active(hart: &Hart) -> bool {
    hart.mode != Privilege::Machine && Satp::new(hart.csr.satp).sv32_enabled()
}

fn translate_for(
    hart: &Hart,
    mem: &mut PhysicalMemory,
    va: u32,
    access: AccessType,
) -> Result<u32, Event> {
    let satp = Satp::new(hart.csr.satp);
    mmu::translate(mem, satp, hart.mode, VirtAddr::new(va), access)
        .map_err(|fault| Event::Trap(fault.cause(access), va))
}

/// A physical access that missed every region. Under translation this is a
/// page fault the guest can handle; in bare mode there is no handler
/// contract to lean on and the core halts.
fn phys_fault(hart: &Hart, va: u32, access: AccessType) -> Event {
    if translation_active(hart) {
        let cause = match access {
            AccessType::Execute => TrapCause::InstructionPageFault,
            AccessType::Read => TrapCause::LoadPageFault,
            AccessType::Write => TrapCause::StorePageFault,
        };
        Event::Trap(cause, va)
    } else {
        Event::Halt(HaltReason::OutOfRangePhysicalAccess)
    }
}

fn fetch(hart: &Hart, mem: &mut PhysicalMemory) -> Result<u32, Event> {
    let pc = hart.pc;
    let pa = translate_for(hart, mem, pc, AccessType::Execute)?;
    mem.load_u32(pa)
        .map_err(|_| phys_fault(hart, pc, AccessType::Execute))
}

fn load8(hart: &Hart, mem: &mut PhysicalMemory, va: u32) -> Result<u8, Event> {
    let pa = translate_for(hart, mem, va, AccessType::Read)?;
    mem.load_u8(pa).map_err(|_| phys_fault(hart, va, AccessType::Read))
}

fn load16(hart: &Hart, mem: &mut PhysicalMemory, va: u32) -> Result<u16, Event> {
    let pa = translate_for(hart, mem, va, AccessType::Read)?;
    mem.load_u16(pa).map_err(|_| phys_fault(hart, va, AccessType::Read))
}

fn load32(hart: &Hart, mem: &mut PhysicalMemory, va: u32) -> Result<u32, Event> {
    let pa = translate_for(hart, mem, va, AccessType::Read)?;
    mem.load_u32(pa).map_err(|_| phys_fault(hart, va, AccessType::Read))
}

fn store8(hart: &Hart, mem: &mut PhysicalMemory, va: u32, value: u8) -> Result<(), Event> {
    let pa = translate_for(hart, mem, va, AccessType::Write)?;
    mem.store_u8(pa, value)
        .map_err(|_| phys_fault(hart, va, AccessType::Write))
}

fn store16(hart: &Hart, mem: &mut PhysicalMemory, va: u32, value: u16) -> Result<(), Event> {
    let pa = translate_for(hart, mem, va, AccessType::Write)?;
    mem.store_u16(pa, value)
        .map_err(|_| phys_fault(hart, va, AccessType::Write))
}

fn store32(hart: &Hart, mem: &mut PhysicalMemory, va: u32, value: u32) -> Result<(), Event> {
    let pa = translate_for(hart, mem, va, AccessType::Write)?;
    mem.store_u32(pa, value)
        .map_err(|_| phys_fault(hart, va, AccessType::Write))
}

fn csr_event(word: u32) -> Event {
    Event::Trap(TrapCause::IllegalInstruction, word)
}

fn execute(
    hart: &mut Hart,
    mem: &mut PhysicalMemory,
    inst: Instruction,
    word: u32,
) -> Result<Flow, Event> {
    use Instruction::*;

    let mut flow = Flow::Sequential;
    match inst {
        Add { rd, rs1, rs2 } => {
            let v = hart.read_gpr(rs1).wrapping_add(hart.read_gpr(rs2));
            hart.write_gpr(rd, v);
        }
        Sub { rd, rs1, rs2 } => {
            let v = hart.read_gpr(rs1).wrapping_sub(hart.read_gpr(rs2));
            hart.write_gpr(rd, v);
        }
        Addi { rd, rs1, imm } => {
            let v = hart.read_gpr(rs1).wrapping_add(imm as u32);
            hart.write_gpr(rd, v);
        }

        And { rd, rs1, rs2 } => hart.write_gpr(rd, hart.read_gpr(rs1) & hart.read_gpr(rs2)),
        Or { rd, rs1, rs2 } => hart.write_gpr(rd, hart.read_gpr(rs1) | hart.read_gpr(rs2)),
        Xor { rd, rs1, rs2 } => hart.write_gpr(rd, hart.read_gpr(rs1) ^ hart.read_gpr(rs2)),

        Andi { rd, rs1, imm } => hart.write_gpr(rd, hart.read_gpr(rs1) & imm as u32),
        Ori { rd, rs1, imm } => hart.write_gpr(rd, hart.read_gpr(rs1) | imm as u32),
        Xori { rd, rs1, imm } => hart.write_gpr(rd, hart.read_gpr(rs1) ^ imm as u32),

        Slt { rd, rs1, rs2 } => {
            let v = ((hart.read_gpr(rs1) as i32) < hart.read_gpr(rs2) as i32) as u32;
            hart.write_gpr(rd, v);
        }
        Sltu { rd, rs1, rs2 } => {
            let v = (hart.read_gpr(rs1) < hart.read_gpr(rs2)) as u32;
            hart.write_gpr(rd, v);
        }
        Slti { rd, rs1, imm } => {
            let v = ((hart.read_gpr(rs1) as i32) < imm) as u32;
            hart.write_gpr(rd, v);
        }
        Sltiu { rd, rs1, imm } => {
            let v = (hart.read_gpr(rs1) < imm as u32) as u32;
            hart.write_gpr(rd, v);
        }

        Sll { rd, rs1, rs2 } => {
            hart.write_gpr(rd, hart.read_gpr(rs1) << (hart.read_gpr(rs2) & 0x1f))
        }
        Srl { rd, rs1, rs2 } => {
            hart.write_gpr(rd, hart.read_gpr(rs1) >> (hart.read_gpr(rs2) & 0x1f))
        }
        Sra { rd, rs1, rs2 } => {
            let v = (hart.read_gpr(rs1) as i32) >> (hart.read_gpr(rs2) & 0x1f);
            hart.write_gpr(rd, v as u32);
        }
        Slli { rd, rs1, shamt } => hart.write_gpr(rd, hart.read_gpr(rs1) << shamt),
        Srli { rd, rs1, shamt } => hart.write_gpr(rd, hart.read_gpr(rs1) >> shamt),
        Srai { rd, rs1, shamt } => {
            let v = (hart.read_gpr(rs1) as i32) >> shamt;
            hart.write_gpr(rd, v as u32);
        }

        Lb { rd, rs1, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            let v = load8(hart, mem, va)? as i8 as i32 as u32;
            hart.write_gpr(rd, v);
        }
        Lh { rd, rs1, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            let v = load16(hart, mem, va)? as i16 as i32 as u32;
            hart.write_gpr(rd, v);
        }
        Lw { rd, rs1, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            let v = load32(hart, mem, va)?;
            hart.write_gpr(rd, v);
        }
        Lbu { rd, rs1, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            let v = load8(hart, mem, va)? as u32;
            hart.write_gpr(rd, v);
        }
        Lhu { rd, rs1, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            let v = load16(hart, mem, va)? as u32;
            hart.write_gpr(rd, v);
        }
        Sb { rs1, rs2, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            store8(hart, mem, va, hart.read_gpr(rs2) as u8)?;
        }
        Sh { rs1, rs2, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            store16(hart, mem, va, hart.read_gpr(rs2) as u16)?;
        }
        Sw { rs1, rs2, offset } => {
            let va = hart.read_gpr(rs1).wrapping_add(offset as u32);
            store32(hart, mem, va, hart.read_gpr(rs2))?;
        }

        Beq { rs1, rs2, offset } => {
            if hart.read_gpr(rs1) == hart.read_gpr(rs2) {
                hart.pc = hart.pc.wrapping_add(offset as u32);
                flow = Flow::Redirected;
            }
        }
        Bne { rs1, rs2, offset } => {
            if hart.read_gpr(rs1) != hart.read_gpr(rs2) {
                hart.pc = hart.pc.wrapping_add(offset as u32);
                flow = Flow::Redirected;
            }
        }
        Blt { rs1, rs2, offset } => {
            if (hart.read_gpr(rs1) as i32) < hart.read_gpr(rs2) as i32 {
                hart.pc = hart.pc.wrapping_add(offset as u32);
                flow = Flow::Redirected;
            }
        }
        Bge { rs1, rs2, offset } => {
            if (hart.read_gpr(rs1) as i32) >= hart.read_gpr(rs2) as i32 {
                hart.pc = hart.pc.wrapping_add(offset as u32);
                flow = Flow::Redirected;
            }
        }
        Bltu { rs1, rs2, offset } => {
            if hart.read_gpr(rs1) < hart.read_gpr(rs2) {
                hart.pc = hart.pc.wrapping_add(offset as u32);
                flow = Flow::Redirected;
            }
        }
        Bgeu { rs1, rs2, offset } => {
            if hart.read_gpr(rs1) >= hart.read_gpr(rs2) {
                hart.pc = hart.pc.wrapping_add(offset as u32);
                flow = Flow::Redirected;
            }
        }

        Jal { rd, offset } => {
            hart.write_gpr(rd, hart.pc.wrapping_add(4));
            hart.pc = hart.pc.wrapping_add(offset as u32);
            flow = Flow::Redirected;
        }
        Jalr { rd, rs1, offset } => {
            let target = hart.read_gpr(rs1).wrapping_add(offset as u32) & !1;
            hart.write_gpr(rd, hart.pc.wrapping_add(4));
            hart.pc = target;
            flow = Flow::Redirected;
        }

        Lui { rd, imm } => hart.write_gpr(rd, (imm << 12) as u32),
        Auipc { rd, imm } => hart.write_gpr(rd, hart.pc.wrapping_add((imm << 12) as u32)),

        Fence => {}

        Mul { rd, rs1, rs2 } => {
            let v = hart.read_gpr(rs1).wrapping_mul(hart.read_gpr(rs2));
            hart.write_gpr(rd, v);
        }
        Mulh { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1) as i32 as i64;
            let b = hart.read_gpr(rs2) as i32 as i64;
            hart.write_gpr(rd, ((a * b) >> 32) as u32);
        }
        Mulhsu { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1) as i32 as i64;
            let b = hart.read_gpr(rs2) as u64 as i64;
            hart.write_gpr(rd, ((a * b) >> 32) as u32);
        }
        Mulhu { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1) as u64;
            let b = hart.read_gpr(rs2) as u64;
            hart.write_gpr(rd, ((a * b) >> 32) as u32);
        }
        Div { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1) as i32;
            let b = hart.read_gpr(rs2) as i32;
            let v = if b == 0 {
                -1
            } else if a == i32::MIN && b == -1 {
                a
            } else {
                a / b
            };
            hart.write_gpr(rd, v as u32);
        }
        Divu { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1);
            let b = hart.read_gpr(rs2);
            hart.write_gpr(rd, if b == 0 { u32::MAX } else { a / b });
        }
        Rem { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1) as i32;
            let b = hart.read_gpr(rs2) as i32;
            let v = if b == 0 {
                a
            } else if a == i32::MIN && b == -1 {
                0
            } else {
                a % b
            };
            hart.write_gpr(rd, v as u32);
        }
        Remu { rd, rs1, rs2 } => {
            let a = hart.read_gpr(rs1);
            let b = hart.read_gpr(rs2);
            hart.write_gpr(rd, if b == 0 { a } else { a % b });
        }

        LrW { rd, rs1 } => {
            let va = hart.read_gpr(rs1);
            let pa = translate_for(hart, mem, va, AccessType::Read)?;
            let v = mem
                .load_u32(pa)
                .map_err(|_| phys_fault(hart, va, AccessType::Read))?;
            hart.reservation = Some(pa);
            hart.write_gpr(rd, v);
        }
        ScW { rd, rs1, rs2 } => {
            let va = hart.read_gpr(rs1);
            let pa = translate_for(hart, mem, va, AccessType::Write)?;
            if hart.reservation == Some(pa) {
                mem.store_u32(pa, hart.read_gpr(rs2))
                    .map_err(|_| phys_fault(hart, va, AccessType::Write))?;
                hart.write_gpr(rd, 0);
            } else {
                hart.write_gpr(rd, 1);
            }
            hart.reservation = None;
        }
        AmoswapW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, |_, b| b)?,
        AmoaddW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, u32::wrapping_add)?,
        AmoxorW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, |a, b| a ^ b)?,
        AmoorW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, |a, b| a | b)?,
        AmoandW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, |a, b| a & b)?,
        AmominW { rd, rs1, rs2 } => {
            amo(hart, mem, rd, rs1, rs2, |a, b| (a as i32).min(b as i32) as u32)?
        }
        AmomaxW { rd, rs1, rs2 } => {
            amo(hart, mem, rd, rs1, rs2, |a, b| (a as i32).max(b as i32) as u32)?
        }
        AmominuW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, u32::min)?,
        AmomaxuW { rd, rs1, rs2 } => amo(hart, mem, rd, rs1, rs2, u32::max)?,

        Csrrw { rd, rs1, csr } => {
            // The read is skipped entirely when rd is x0.
            let old = if rd != 0 {
                Some(hart.csr.read(csr, hart.mode).map_err(|_| csr_event(word))?)
            } else {
                None
            };
            hart.csr
                .write(csr, hart.read_gpr(rs1), hart.mode)
                .map_err(|_| csr_event(word))?;
            if let Some(v) = old {
                hart.write_gpr(rd, v);
            }
        }
        Csrrs { rd, rs1, csr } => {
            let old = hart.csr.read(csr, hart.mode).map_err(|_| csr_event(word))?;
            // The write is skipped when rs1 is x0, so csrr on a read-only
            // CSR stays legal.
            if rs1 != 0 {
                hart.csr
                    .write(csr, old | hart.read_gpr(rs1), hart.mode)
                    .map_err(|_| csr_event(word))?;
            }
            hart.write_gpr(rd, old);
        }
        Csrrc { rd, rs1, csr } => {
            let old = hart.csr.read(csr, hart.mode).map_err(|_| csr_event(word))?;
            if rs1 != 0 {
                hart.csr
                    .write(csr, old & !hart.read_gpr(rs1), hart.mode)
                    .map_err(|_| csr_event(word))?;
            }
            hart.write_gpr(rd, old);
        }
        Csrrwi { rd, uimm, csr } => {
            let old = if rd != 0 {
                Some(hart.csr.read(csr, hart.mode).map_err(|_| csr_event(word))?)
            } else {
                None
            };
            hart.csr
                .write(csr, uimm, hart.mode)
                .map_err(|_| csr_event(word))?;
            if let Some(v) = old {
                hart.write_gpr(rd, v);
            }
        }
        Csrrsi { rd, uimm, csr } => {
            let old = hart.csr.read(csr, hart.mode).map_err(|_| csr_event(word))?;
            if uimm != 0 {
                hart.csr
                    .write(csr, old | uimm, hart.mode)
                    .map_err(|_| csr_event(word))?;
            }
            hart.write_gpr(rd, old);
        }
        Csrrci { rd, uimm, csr } => {
            let old = hart.csr.read(csr, hart.mode).map_err(|_| csr_event(word))?;
            if uimm != 0 {
                hart.csr
                    .write(csr, old & !uimm, hart.mode)
                    .map_err(|_| csr_event(word))?;
            }
            hart.write_gpr(rd, old);
        }

        Ecall => {
            let cause = match hart.mode {
                Privilege::User => TrapCause::EcallFromUser,
                Privilege::Supervisor => TrapCause::EcallFromSupervisor,
                Privilege::Machine => TrapCause::EcallFromMachine,
            };
            return Err(Event::Trap(cause, 0));
        }
        Ebreak => return Err(Event::Halt(HaltReason::GuestHalt)),
        Sret => {
            sret(hart).map_err(|cause| Event::Trap(cause, word))?;
            flow = Flow::Redirected;
        }
        Mret => {
            mret(hart).map_err(|cause| Event::Trap(cause, word))?;
            flow = Flow::Redirected;
        }
        Wfi => {
            // No interrupt sources are wired up; treat as a pause.
        }
        SfenceVma { .. } => {
            if hart.mode == Privilege::User {
                return Err(Event::Trap(TrapCause::IllegalInstruction, word));
            }
            // Translations are never cached, so there is nothing to flush.
        }
        Unimp => return Err(Event::Trap(TrapCause::IllegalInstruction, word)),
    }

    Ok(flow)
}

/// Atomic read-modify-write on the word at rs1. Sequenced against nothing:
/// a single hart makes every AMO trivially atomic.
fn amo(
    hart: &mut Hart,
    mem: &mut PhysicalMemory,
    rd: usize,
    rs1: usize,
    rs2: usize,
    op: fn(u32, u32) -> u32,
) -> Result<(), Event> {
    let va = hart.read_gpr(rs1);
    let pa = translate_for(hart, mem, va, AccessType::Write)?;
    let old = mem
        .load_u32(pa)
        .map_err(|_| phys_fault(hart, va, AccessType::Write))?;
    let new = op(old, hart.read_gpr(rs2));
    mem.store_u32(pa, new)
        .map_err(|_| phys_fault(hart, va, AccessType::Write))?;
    hart.write_gpr(rd, old);
    Ok(())
}
