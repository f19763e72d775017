use hart::csr::{SSTATUS_SIE, SSTATUS_SPIE, SSTATUS_SPP};
use hart::trap::{mret, raise_trap, sret};
use hart::Hart;
use types::{HaltReason, Privilege, TrapCause};

const HANDLER: u32 = 0x8001_0000;

fn hart_with_handler() -> Hart {
    let mut hart = Hart::new(0x8000_0000);
    hart.csr.stvec = HANDLER;
    hart
}

#[test]
fn trap_saves_context_and_enters_handler() {
    let mut hart = hart_with_handler();
    hart.pc = 0x8000_0040;
    hart.mode = Privilege::User;
    hart.csr.sstatus = SSTATUS_SIE;

    raise_trap(&mut hart, TrapCause::EcallFromUser, 0);

    assert_eq!(hart.pc, HANDLER);
    assert_eq!(hart.mode, Privilege::Supervisor);
    assert_eq!(hart.csr.sepc, 0x8000_0040);
    assert_eq!(hart.csr.scause, 8);
    assert_eq!(hart.csr.stval, 0);
    // SIE stacked into SPIE and cleared; SPP records user mode.
    assert_eq!(hart.csr.sstatus & SSTATUS_SIE, 0);
    assert_ne!(hart.csr.sstatus & SSTATUS_SPIE, 0);
    assert_eq!(hart.csr.sstatus & SSTATUS_SPP, 0);
    assert!(!hart.halted);
}

#[test]
fn trap_from_supervisor_sets_spp() {
    let mut hart = hart_with_handler();
    hart.pc = 0x8000_0100;

    raise_trap(&mut hart, TrapCause::LoadPageFault, 0x8000_1000);

    assert_ne!(hart.csr.sstatus & SSTATUS_SPP, 0);
    assert_eq!(hart.csr.scause, 13);
    assert_eq!(hart.csr.stval, 0x8000_1000);
}

#[test]
fn vectored_stvec_halts_with_context_saved() {
    let mut hart = hart_with_handler();
    hart.csr.stvec = HANDLER | 1;
    hart.pc = 0x8000_0040;
    hart.mode = Privilege::User;

    raise_trap(&mut hart, TrapCause::Breakpoint, 0x8000_0040);

    assert!(hart.halted);
    assert_eq!(hart.halt_reason, Some(HaltReason::UnsupportedVectoredTrap));
    // The trap context must still be readable from the halted state.
    assert_eq!(hart.csr.sepc, 0x8000_0040);
    assert_eq!(hart.csr.scause, 3);
    // pc stays at the faulting instruction; we never jump into a vector
    // table we cannot honor.
    assert_eq!(hart.pc, 0x8000_0040);
}

#[test]
fn trap_in_machine_mode_is_fatal() {
    let mut hart = hart_with_handler();
    hart.mode = Privilege::Machine;
    let sepc_before = hart.csr.sepc;

    raise_trap(&mut hart, TrapCause::IllegalInstruction, 0);

    assert!(hart.halted);
    assert_eq!(hart.halt_reason, Some(HaltReason::TrapInMachineMode));
    // The supervisor file is untouched.
    assert_eq!(hart.csr.sepc, sepc_before);
}

#[test]
fn sret_restores_user_mode_and_pc() {
    let mut hart = hart_with_handler();
    hart.pc = 0x8000_0040;
    hart.mode = Privilege::User;
    hart.csr.sstatus = SSTATUS_SIE;
    raise_trap(&mut hart, TrapCause::EcallFromUser, 0);

    // Handler advances sepc past the ecall before returning.
    hart.csr.sepc = hart.csr.sepc.wrapping_add(4);
    sret(&mut hart).unwrap();

    assert_eq!(hart.mode, Privilege::User);
    assert_eq!(hart.pc, 0x8000_0044);
    // SPIE unstacked back into SIE.
    assert_ne!(hart.csr.sstatus & SSTATUS_SIE, 0);
    assert_eq!(hart.csr.sstatus & SSTATUS_SPP, 0);
}

#[test]
fn sret_from_user_mode_is_illegal() {
    let mut hart = hart_with_handler();
    hart.mode = Privilege::User;
    assert_eq!(sret(&mut hart), Err(TrapCause::IllegalInstruction));
}

#[test]
fn mret_requires_machine_mode() {
    let mut hart = hart_with_handler();
    assert_eq!(mret(&mut hart), Err(TrapCause::IllegalInstruction));

    hart.mode = Privilege::Machine;
    hart.csr.mepc = 0x8000_2000;
    hart.csr.mstatus = 0b01 << 11; // MPP = supervisor
    mret(&mut hart).unwrap();
    assert_eq!(hart.mode, Privilege::Supervisor);
    assert_eq!(hart.pc, 0x8000_2000);
}

#[test]
fn halt_keeps_first_reason() {
    let mut hart = hart_with_handler();
    hart.halt(HaltReason::GuestHalt);
    hart.halt(HaltReason::TrapInMachineMode);
    assert_eq!(hart.halt_reason, Some(HaltReason::GuestHalt));
}

#[test]
fn write_to_x0_is_discarded() {
    let mut hart = hart_with_handler();
    hart.write_gpr(0, 0xdead_beef);
    assert_eq!(hart.read_gpr(0), 0);
    hart.write_gpr(5, 0xdead_beef);
    assert_eq!(hart.read_gpr(5), 0xdead_beef);
}

#[test]
fn reset_returns_to_power_on_state() {
    let mut hart = hart_with_handler();
    hart.mode = Privilege::User;
    hart.write_gpr(10, 7);
    hart.csr.satp = 0x8000_0001;
    hart.halt(HaltReason::GuestHalt);

    hart.reset(0x8000_0000);

    assert_eq!(hart.pc, 0x8000_0000);
    assert_eq!(hart.mode, Privilege::Supervisor);
    assert_eq!(hart.read_gpr(10), 0);
    assert_eq!(hart.csr.satp, 0);
    assert!(!hart.halted);
    assert_eq!(hart.halt_reason, None);
}
