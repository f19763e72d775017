//! Platform-level interrupt controller, claim surface only.
//!
//! External interrupt sources are out of scope for this core; the PLIC
//! exists so the machine loop has a single place to poll once sources are
//! wired up. Until then it never reports a pending interrupt.

#[derive(Debug, Default)]
pub struct Plic;

impl Plic {
    pub fn new() -> Self {
        Plic
    }

    /// Highest-priority pending interrupt id, if any.
    pub fn pending_interrupt(&self) -> Option<u32> {
        None
    }
}
