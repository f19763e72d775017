mod common;

use common::*;
use hart::csr::{CYCLE, INSTRET, SSCRATCH};
use types::layout::MemoryLayout;
use types::{HaltReason, Privilege, TrapCause};
use vm::Machine;

const ENTRY: u32 = 0x8000_0000;

fn boot(program: &[u32]) -> Machine {
    let mut machine = Machine::new(&MemoryLayout::default(), ENTRY);
    machine.load_image(ENTRY, &assemble(program)).unwrap();
    machine
}

#[test]
fn arithmetic_and_memory_round_trip() {
    let mut machine = boot(&[
        addi(5, 0, 42),
        lui(6, 0x80000),     // x6 = 0x8000_0000
        sw(6, 5, 0x100),     // [0x8000_0100] = 42
        lw(7, 6, 0x100),     // x7 = 42
        EBREAK,
    ]);
    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    assert_eq!(machine.hart.read_gpr(7), 42);
    assert_eq!(machine.memory.load_u32(ENTRY + 0x100).unwrap(), 42);
}

#[test]
fn jal_links_and_jumps() {
    let mut machine = boot(&[
        jal(1, 8),      // skip the next word
        0xffff_ffff,    // would be illegal if executed
        EBREAK,
    ]);
    let result = machine.step();
    assert_eq!(result.pc, ENTRY + 8);
    assert_eq!(machine.hart.read_gpr(1), ENTRY + 4);
    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
}

#[test]
fn self_jump_parks_the_pc() {
    // `jal x0, 0` is the idle loop a kernel parks on; the pc must stay put.
    let mut machine = boot(&[jal(0, 0)]);
    for _ in 0..3 {
        let result = machine.step();
        assert_eq!(result.pc, ENTRY);
        assert!(!result.halted);
    }
    assert_eq!(machine.run(10), None);
    assert_eq!(machine.hart.pc, ENTRY);
}

#[test]
fn illegal_instruction_traps_with_the_word_in_stval() {
    const HANDLER: u32 = 0x8000_2000;
    let mut machine = boot(&[0xffff_ffff]);
    machine.hart.csr.stvec = HANDLER;

    let result = machine.step();
    assert!(!result.halted);
    let trap = result.trap.unwrap();
    assert_eq!(trap.cause, TrapCause::IllegalInstruction);
    assert_eq!(trap.tval, 0xffff_ffff);
    assert_eq!(machine.hart.csr.stval, 0xffff_ffff);
    assert_eq!(result.pc, HANDLER);
}

#[test]
fn zero_word_traps_as_illegal() {
    const HANDLER: u32 = 0x8000_2000;
    let mut machine = boot(&[0x0000_0000]);
    machine.hart.csr.stvec = HANDLER;

    let result = machine.step();
    let trap = result.trap.unwrap();
    assert_eq!(trap.cause, TrapCause::IllegalInstruction);
    assert_eq!(trap.tval, 0);
}

#[test]
fn halted_hart_steps_are_no_ops() {
    let mut machine = boot(&[EBREAK]);
    let result = machine.step();
    assert!(result.halted);
    assert_eq!(result.halt_reason, Some(HaltReason::GuestHalt));

    let pc = machine.hart.pc;
    let cycle = machine.hart.csr.cycle;
    for _ in 0..3 {
        let again = machine.step();
        assert!(again.halted);
        assert_eq!(again.halt_reason, Some(HaltReason::GuestHalt));
        assert_eq!(again.pc, pc);
    }
    // Counters stand still once halted.
    assert_eq!(machine.hart.csr.cycle, cycle);
}

#[test]
fn counters_track_retired_instructions() {
    let mut machine = boot(&[
        addi(5, 0, 1),
        addi(5, 5, 1),
        csrrs(6, INSTRET, 0),
        csrrs(7, CYCLE, 0),
        EBREAK,
    ]);
    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    // instret was read by the third instruction, after two retires.
    assert_eq!(machine.hart.read_gpr(6), 2);
    // cycle ticks at the start of each step, so the fourth step reads 4.
    assert_eq!(machine.hart.read_gpr(7), 4);
}

#[test]
fn csr_write_and_read_back() {
    let mut machine = boot(&[
        addi(5, 0, 0x55),
        csrrw(0, SSCRATCH, 5),
        csrrs(6, SSCRATCH, 0),
        EBREAK,
    ]);
    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    assert_eq!(machine.hart.read_gpr(6), 0x55);
    assert_eq!(machine.hart.csr.sscratch, 0x55);
}

#[test]
fn user_mode_csr_access_is_illegal() {
    const HANDLER: u32 = 0x8000_2000;
    let mut machine = boot(&[csrrs(5, SSCRATCH, 0)]);
    machine.hart.csr.stvec = HANDLER;
    machine.hart.mode = Privilege::User;

    let result = machine.step();
    let trap = result.trap.unwrap();
    assert_eq!(trap.cause, TrapCause::IllegalInstruction);
    assert_eq!(machine.hart.mode, Privilege::Supervisor);
    // The destination register is untouched.
    assert_eq!(machine.hart.read_gpr(5), 0);
}

#[test]
fn amoadd_returns_old_value() {
    const AMOADD_W: u32 = (6 << 20) | (5 << 15) | (0x2 << 12) | (7 << 7) | 0x2f;
    let mut machine = boot(&[
        lui(5, 0x80100),  // x5 = 0x8010_0000, away from the code
        addi(6, 0, 3),
        AMOADD_W,         // x7 = old; [x5] += 3
        EBREAK,
    ]);
    machine.memory.store_u32(0x8010_0000, 10).unwrap();

    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    assert_eq!(machine.hart.read_gpr(7), 10);
    assert_eq!(machine.memory.load_u32(0x8010_0000).unwrap(), 13);
}

#[test]
fn lr_sc_pair_succeeds_and_stale_sc_fails() {
    const LR_W: u32 = (0x02 << 27) | (5 << 15) | (0x2 << 12) | (7 << 7) | 0x2f;
    const SC_W: u32 = (0x03 << 27) | (6 << 20) | (5 << 15) | (0x2 << 12) | (8 << 7) | 0x2f;
    let mut machine = boot(&[
        lui(5, 0x80100),
        addi(6, 0, 99),
        LR_W,       // x7 = [x5], reserve
        SC_W,       // x8 = 0, [x5] = 99
        SC_W,       // x8 = 1, reservation gone
        EBREAK,
    ]);
    machine.memory.store_u32(0x8010_0000, 5).unwrap();

    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    assert_eq!(machine.hart.read_gpr(7), 5);
    assert_eq!(machine.hart.read_gpr(8), 1); // the second sc.w failed
    assert_eq!(machine.memory.load_u32(0x8010_0000).unwrap(), 99);
}

#[test]
fn reset_restarts_a_halted_machine() {
    let mut machine = boot(&[addi(5, 0, 1), EBREAK]);
    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));

    machine.reset(ENTRY);
    assert!(!machine.halted());
    assert_eq!(machine.hart.pc, ENTRY);
    // Memory survives reset: the same program runs again.
    assert_eq!(machine.run(10), Some(HaltReason::GuestHalt));
    assert_eq!(machine.hart.read_gpr(5), 1);
}
