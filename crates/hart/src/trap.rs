//! Trap entry and return.
//!
//! All synchronous exceptions are taken in supervisor mode through stvec.
//! Only direct stvec mode is implemented; a trap arriving while stvec has
//! the vectored bit set halts the hart with the trap context already saved,
//! so the host can still read sepc/scause/stval from the wreckage.

use types::{HaltReason, Privilege, TrapCause};

use crate::csr::{
    SSTATUS_SIE, SSTATUS_SPIE, SSTATUS_SPP, STVEC_BASE_MASK, STVEC_VECTORED,
};
use crate::Hart;

/// Take a synchronous trap into supervisor mode.
///
/// Saves the faulting pc, cause and tval, stacks the interrupt-enable and
/// previous-privilege state in sstatus, and redirects the pc to the stvec
/// base. Interrupt delivery stays disabled (SIE = 0) until the handler
/// returns through SRET.
pub fn raise_trap(hart: &mut Hart, cause: TrapCause, tval: u32) {
    if hart.mode == Privilege::Machine {
        // No level above machine exists to take the trap.
        hart.halt(HaltReason::TrapInMachineMode);
        return;
    }

    log::debug!(
        "trap: cause={:?} tval=0x{:08x} pc=0x{:08x} mode={}",
        cause,
        tval,
        hart.pc,
        hart.mode
    );

    hart.csr.sepc = hart.pc;
    hart.csr.scause = cause.code();
    hart.csr.stval = tval;

    // SPIE <- SIE, SIE <- 0, SPP <- previous mode.
    let mut sstatus = hart.csr.sstatus;
    if sstatus & SSTATUS_SIE != 0 {
        sstatus |= SSTATUS_SPIE;
    } else {
        sstatus &= !SSTATUS_SPIE;
    }
    sstatus &= !SSTATUS_SIE;
    if hart.mode == Privilege::Supervisor {
        sstatus |= SSTATUS_SPP;
    } else {
        sstatus &= !SSTATUS_SPP;
    }
    hart.csr.sstatus = sstatus;
    hart.mode = Privilege::Supervisor;

    let stvec = hart.csr.stvec;
    if stvec & STVEC_VECTORED != 0 {
        // Context is saved above; pc stays at the faulting instruction.
        hart.halt(HaltReason::UnsupportedVectoredTrap);
        return;
    }
    hart.pc = stvec & STVEC_BASE_MASK;
}

/// SRET: return from a supervisor trap handler.
///
/// Restores the privilege mode from sstatus.SPP, re-enables interrupts from
/// SPIE and jumps back to sepc. Illegal from user mode.
pub fn sret(hart: &mut Hart) -> Result<(), TrapCause> {
    if hart.mode == Privilege::User {
        return Err(TrapCause::IllegalInstruction);
    }

    let sstatus = hart.csr.sstatus;
    let previous = if sstatus & SSTATUS_SPP != 0 {
        Privilege::Supervisor
    } else {
        Privilege::User
    };

    // SIE <- SPIE, SPIE <- 1, SPP <- U.
    let mut updated = sstatus;
    if sstatus & SSTATUS_SPIE != 0 {
        updated |= SSTATUS_SIE;
    } else {
        updated &= !SSTATUS_SIE;
    }
    updated |= SSTATUS_SPIE;
    updated &= !SSTATUS_SPP;
    hart.csr.sstatus = updated;

    hart.mode = previous;
    hart.pc = hart.csr.sepc;
    log::trace!("sret -> pc=0x{:08x} mode={}", hart.pc, hart.mode);
    Ok(())
}

/// MRET: return from a machine trap handler. Only legal in machine mode.
pub fn mret(hart: &mut Hart) -> Result<(), TrapCause> {
    use crate::csr::{MSTATUS_MIE, MSTATUS_MPIE, MSTATUS_MPP_MASK, MSTATUS_MPP_SHIFT};

    if hart.mode != Privilege::Machine {
        return Err(TrapCause::IllegalInstruction);
    }

    let mstatus = hart.csr.mstatus;
    let previous = Privilege::from_bits((mstatus & MSTATUS_MPP_MASK) >> MSTATUS_MPP_SHIFT)
        .unwrap_or(Privilege::User);

    let mut updated = mstatus;
    if mstatus & MSTATUS_MPIE != 0 {
        updated |= MSTATUS_MIE;
    } else {
        updated &= !MSTATUS_MIE;
    }
    updated |= MSTATUS_MPIE;
    updated &= !MSTATUS_MPP_MASK;
    hart.csr.mstatus = updated;

    hart.mode = previous;
    hart.pc = hart.csr.mepc;
    log::trace!("mret -> pc=0x{:08x} mode={}", hart.pc, hart.mode);
    Ok(())
}
