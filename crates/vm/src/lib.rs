//! RV32 supervisor-mode execution core with an Sv32 software MMU.
//!
//! The host drives a [`Machine`] one instruction at a time through
//! [`Machine::step`] and reads back a [`StepResult`] after each one. Guest
//! page faults and environment calls are handled by guest code through the
//! trap path; fatal conditions freeze the hart with a [`types::HaltReason`].

pub mod decoder;
pub mod exec;
pub mod instruction;
pub mod isa;
pub mod machine;
pub mod plic;

pub use exec::{step, Phase, StepResult};
pub use instruction::Instruction;
pub use machine::Machine;
