//! End-to-end machine scenarios: boot in bare mode, run under Sv32
//! translation, recover from a page fault, and round-trip a user-mode
//! environment call.

mod common;

use common::*;
use hart::csr::SEPC;
use mmu::{Pte, PteFlags, SATP_MODE_SV32};
use types::layout::MemoryLayout;
use types::{HaltReason, Privilege, TrapCause};
use vm::Machine;

const ENTRY: u32 = 0x8000_0000;
const ROOT_PPN: u32 = 4; // root table at PA 0x4000
const TABLE0_PPN: u32 = 5; // leaf table at PA 0x5000
const DATA_PA: u32 = 0x2000;
const DATA_VA: u32 = 0x8000_1000;

fn boot(program: &[u32]) -> Machine {
    let mut machine = Machine::new(&MemoryLayout::default(), ENTRY);
    machine.load_image(ENTRY, &assemble(program)).unwrap();
    machine
}

/// Map the code page (VA = PA = 0x8000_0000) and the data page
/// (0x8000_1000 -> 0x2000) through a two-level table, then enable Sv32.
fn enable_paging(machine: &mut Machine, data_flags: PteFlags) {
    let root_pa = ROOT_PPN << 12;
    let table0_pa = TABLE0_PPN << 12;
    let pointer = Pte::leaf(TABLE0_PPN, PteFlags::VALID);
    machine.memory.store_u32(root_pa + 0x200 * 4, pointer.raw()).unwrap();

    let code = Pte::leaf(
        ENTRY >> 12,
        PteFlags::VALID | PteFlags::READ | PteFlags::EXECUTE,
    );
    machine.memory.store_u32(table0_pa, code.raw()).unwrap();

    let data = Pte::leaf(DATA_PA >> 12, data_flags | PteFlags::VALID);
    machine.memory.store_u32(table0_pa + 4, data.raw()).unwrap();

    machine.hart.csr.satp = SATP_MODE_SV32 | ROOT_PPN;
}

#[test]
fn boots_in_bare_supervisor_mode() {
    let mut machine = boot(&[addi(5, 0, 42), EBREAK]);
    assert_eq!(machine.hart.mode, Privilege::Supervisor);
    assert_eq!(machine.hart.csr.satp, 0);

    let result = machine.step();
    assert_eq!(machine.hart.read_gpr(5), 42);
    assert_eq!(result.pc, ENTRY + 4);
    assert!(!result.halted);

    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
}

#[test]
fn translated_store_lands_in_mapped_frame_and_dirties_pte() {
    let mut machine = boot(&[
        lui(6, DATA_VA >> 12),  // x6 = 0x8000_1000
        addi(7, 0, 42),
        sw(6, 7, 0),
        EBREAK,
    ]);
    enable_paging(&mut machine, PteFlags::READ | PteFlags::WRITE | PteFlags::EXECUTE);

    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));

    // The store went through translation into the low frame.
    assert_eq!(machine.memory.load_u32(DATA_PA).unwrap(), 42);
    // Hardware-managed bits on the data page leaf.
    let table0_pa = TABLE0_PPN << 12;
    let leaf = Pte::new(machine.memory.load_u32(table0_pa + 4).unwrap());
    assert!(leaf.is_accessed());
    assert!(leaf.is_dirty());
}

#[test]
fn store_to_read_only_page_traps_without_halting() {
    const HANDLER: u32 = 0x8000_2000;
    let mut machine = boot(&[
        lui(6, DATA_VA >> 12),
        addi(7, 0, 42),
        sw(6, 7, 0), // faults: page is mapped read-only
    ]);
    enable_paging(&mut machine, PteFlags::READ);
    machine.hart.csr.stvec = HANDLER;

    machine.step();
    machine.step();
    let result = machine.step();

    assert!(!result.halted);
    let trap = result.trap.unwrap();
    assert_eq!(trap.cause, TrapCause::StorePageFault);
    assert_eq!(trap.tval, DATA_VA);
    assert_eq!(result.pc, HANDLER);
    assert_eq!(machine.hart.csr.sepc, ENTRY + 8);
    assert_eq!(machine.hart.csr.scause, 15);
    assert_eq!(machine.hart.csr.stval, DATA_VA);
    // The faulting store must not have written anything.
    assert_eq!(machine.memory.load_u32(DATA_PA).unwrap(), 0);
}

#[test]
fn user_ecall_round_trips_through_supervisor_handler() {
    const HANDLER: u32 = 0x8001_0000;
    let mut machine = boot(&[
        ECALL,
        addi(10, 0, 7), // resumes here after sret
        EBREAK,
    ]);
    // Handler: advance sepc past the ecall, then return.
    let handler = [
        csrrs(5, SEPC, 0),
        addi(5, 5, 4),
        csrrw(0, SEPC, 5),
        SRET,
    ];
    machine.load_image(HANDLER, &assemble(&handler)).unwrap();
    machine.hart.csr.stvec = HANDLER;
    machine.hart.mode = Privilege::User;

    let result = machine.step();
    let trap = result.trap.unwrap();
    assert_eq!(trap.cause, TrapCause::EcallFromUser);
    assert_eq!(machine.hart.mode, Privilege::Supervisor);
    assert_eq!(machine.hart.csr.scause, 8);
    assert_eq!(result.pc, HANDLER);

    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    // sret dropped back to user mode and the program continued.
    assert_eq!(machine.hart.mode, Privilege::User);
    assert_eq!(machine.hart.read_gpr(10), 7);
}

#[test]
fn vectored_stvec_is_a_fatal_halt() {
    const HANDLER: u32 = 0x8001_0000;
    let mut machine = boot(&[ECALL]);
    machine.hart.csr.stvec = HANDLER | 1; // vectored mode
    machine.hart.mode = Privilege::User;

    let result = machine.step();
    assert!(result.halted);
    assert_eq!(result.halt_reason, Some(HaltReason::UnsupportedVectoredTrap));
    // Context was saved before the halt.
    assert_eq!(machine.hart.csr.sepc, ENTRY);
    assert_eq!(machine.hart.csr.scause, 8);
}

#[test]
fn bare_fetch_outside_every_region_is_fatal() {
    let mut machine = Machine::new(&MemoryLayout::default(), 0x4000_0000);
    let result = machine.step();
    assert!(result.halted);
    assert_eq!(
        result.halt_reason,
        Some(HaltReason::OutOfRangePhysicalAccess)
    );
}

#[test]
fn translated_fetch_from_unmapped_page_traps() {
    const HANDLER: u32 = 0x8000_2000;
    let mut machine = boot(&[jal(0, 0x2000)]); // jump to an unmapped VA
    enable_paging(&mut machine, PteFlags::READ);
    machine.hart.csr.stvec = HANDLER;

    machine.step(); // jal
    let result = machine.step(); // fetch from VA 0x8000_2000 faults

    assert!(!result.halted);
    let trap = result.trap.unwrap();
    assert_eq!(trap.cause, TrapCause::InstructionPageFault);
    assert_eq!(trap.tval, ENTRY + 0x2000);
}
