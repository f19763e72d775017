pub mod address;
pub mod fault;
pub mod layout;
pub mod privilege;

pub use address::VirtAddr;
pub use fault::{HaltReason, PageFault, PageFaultKind, TrapCause, TrapInfo};
pub use layout::{MemoryLayout, Region, RegionKind};
pub use privilege::{AccessType, Privilege};
