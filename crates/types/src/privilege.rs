use core::fmt;

/// RISC-V privilege levels supported by this core.
///
/// Translation is bypassed whenever the hart runs in `Machine` mode; satp is
/// only honored for Supervisor/User accesses.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Privilege {
    User = 0,
    Supervisor = 1,
    Machine = 3,
}

impl Privilege {
    /// Encoding used by mstatus.MPP and the original execution-state word.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Privilege::User),
            1 => Some(Privilege::Supervisor),
            3 => Some(Privilege::Machine),
            _ => None,
        }
    }

    pub fn to_bits(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Privilege::User => "U",
            Privilege::Supervisor => "S",
            Privilege::Machine => "M",
        };
        write!(f, "{}", name)
    }
}

/// The three access types a translation can be requested for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessType {
    Read,
    Write,
    Execute,
}
