//! Control and status register bank.
//!
//! One fixed-size register file per hart, mirroring the CSR bank layout of
//! the GPU execution state: full machine and supervisor files plus the
//! cycle/instret counters. Indexed access goes through [`CsrBank::read`] /
//! [`CsrBank::write`], which enforce the standard privilege and read-only
//! encodings baked into the CSR address.

use types::Privilege;

// Supervisor CSR addresses.
pub const SSTATUS: u32 = 0x100;
pub const SIE: u32 = 0x104;
pub const STVEC: u32 = 0x105;
pub const SCOUNTEREN: u32 = 0x106;
pub const SSCRATCH: u32 = 0x140;
pub const SEPC: u32 = 0x141;
pub const SCAUSE: u32 = 0x142;
pub const STVAL: u32 = 0x143;
pub const SIP: u32 = 0x144;
pub const SATP: u32 = 0x180;

// Machine CSR addresses.
pub const MSTATUS: u32 = 0x300;
pub const MISA: u32 = 0x301;
pub const MEDELEG: u32 = 0x302;
pub const MIDELEG: u32 = 0x303;
pub const MIE: u32 = 0x304;
pub const MTVEC: u32 = 0x305;
pub const MCOUNTEREN: u32 = 0x306;
pub const MSCRATCH: u32 = 0x340;
pub const MEPC: u32 = 0x341;
pub const MCAUSE: u32 = 0x342;
pub const MTVAL: u32 = 0x343;
pub const MIP: u32 = 0x344;
pub const MCYCLE: u32 = 0xb00;
pub const MINSTRET: u32 = 0xb02;
pub const MCYCLEH: u32 = 0xb80;
pub const MINSTRETH: u32 = 0xb82;

// Read-only machine identification and user-level counters.
pub const CYCLE: u32 = 0xc00;
pub const INSTRET: u32 = 0xc02;
pub const CYCLEH: u32 = 0xc80;
pub const INSTRETH: u32 = 0xc82;
pub const MVENDORID: u32 = 0xf11;
pub const MARCHID: u32 = 0xf12;
pub const MIMPID: u32 = 0xf13;
pub const MHARTID: u32 = 0xf14;

// sstatus bit positions.
pub const SSTATUS_SIE: u32 = 1 << 1;
pub const SSTATUS_SPIE: u32 = 1 << 5;
pub const SSTATUS_SPP: u32 = 1 << 8;

// mstatus bit positions.
pub const MSTATUS_MIE: u32 = 1 << 3;
pub const MSTATUS_MPIE: u32 = 1 << 7;
pub const MSTATUS_MPP_SHIFT: u32 = 11;
pub const MSTATUS_MPP_MASK: u32 = 0b11 << MSTATUS_MPP_SHIFT;

// stvec bit 0 selects vectored mode, which this core refuses to take traps
// through. Bits 31:2 are the base address.
pub const STVEC_VECTORED: u32 = 1 << 0;
pub const STVEC_BASE_MASK: u32 = !0b11;

/// misa: RV32 (MXL=1) with the I, M and A extension bits.
pub const MISA_RV32IMA: u32 = (1 << 30) | (1 << 0) | (1 << 8) | (1 << 12);

/// A CSR access that must raise an illegal-instruction trap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CsrError {
    Unknown(u32),
    Privilege(u32),
    ReadOnly(u32),
}

/// Per-hart control/status register file.
#[derive(Clone, Debug, Default)]
pub struct CsrBank {
    // Machine file.
    pub mstatus: u32,
    pub medeleg: u32,
    pub mideleg: u32,
    pub mie: u32,
    pub mtvec: u32,
    pub mcounteren: u32,
    pub mscratch: u32,
    pub mepc: u32,
    pub mcause: u32,
    pub mtval: u32,
    pub mip: u32,
    // Supervisor file.
    pub sstatus: u32,
    pub sie: u32,
    pub stvec: u32,
    pub scounteren: u32,
    pub sscratch: u32,
    pub sepc: u32,
    pub scause: u32,
    pub stval: u32,
    pub sip: u32,
    pub satp: u32,
    // Counters, incremented once per retired instruction.
    pub cycle: u64,
    pub instret: u64,
}

impl CsrBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Privilege level encoded in bits 9:8 of the CSR address.
    fn required_privilege(addr: u32) -> Privilege {
        match (addr >> 8) & 0b11 {
            0 => Privilege::User,
            1 | 2 => Privilege::Supervisor,
            _ => Privilege::Machine,
        }
    }

    /// Addresses with bits 11:10 set are read-only by encoding.
    fn is_read_only(addr: u32) -> bool {
        (addr >> 10) & 0b11 == 0b11
    }

    pub fn read(&self, addr: u32, mode: Privilege) -> Result<u32, CsrError> {
        if mode < Self::required_privilege(addr) {
            return Err(CsrError::Privilege(addr));
        }
        let value = match addr {
            SSTATUS => self.sstatus,
            SIE => self.sie,
            STVEC => self.stvec,
            SCOUNTEREN => self.scounteren,
            SSCRATCH => self.sscratch,
            SEPC => self.sepc,
            SCAUSE => self.scause,
            STVAL => self.stval,
            SIP => self.sip,
            SATP => self.satp,
            MSTATUS => self.mstatus,
            MISA => MISA_RV32IMA,
            MEDELEG => self.medeleg,
            MIDELEG => self.mideleg,
            MIE => self.mie,
            MTVEC => self.mtvec,
            MCOUNTEREN => self.mcounteren,
            MSCRATCH => self.mscratch,
            MEPC => self.mepc,
            MCAUSE => self.mcause,
            MTVAL => self.mtval,
            MIP => self.mip,
            MCYCLE | CYCLE => self.cycle as u32,
            MCYCLEH | CYCLEH => (self.cycle >> 32) as u32,
            MINSTRET | INSTRET => self.instret as u32,
            MINSTRETH | INSTRETH => (self.instret >> 32) as u32,
            MVENDORID | MARCHID | MIMPID | MHARTID => 0,
            _ => return Err(CsrError::Unknown(addr)),
        };
        Ok(value)
    }

    pub fn write(&mut self, addr: u32, value: u32, mode: Privilege) -> Result<(), CsrError> {
        if mode < Self::required_privilege(addr) {
            return Err(CsrError::Privilege(addr));
        }
        if Self::is_read_only(addr) {
            return Err(CsrError::ReadOnly(addr));
        }
        match addr {
            SSTATUS => self.sstatus = value,
            SIE => self.sie = value,
            STVEC => self.stvec = value,
            SCOUNTEREN => self.scounteren = value,
            SSCRATCH => self.sscratch = value,
            SEPC => self.sepc = value & !1,
            SCAUSE => self.scause = value,
            STVAL => self.stval = value,
            SIP => self.sip = value,
            // ASID bits are stored verbatim for bit-exact compatibility even
            // though a single hart never uses them for isolation.
            SATP => self.satp = value,
            MSTATUS => self.mstatus = value,
            // misa is WARL and hardwired here; writes are dropped.
            MISA => {}
            MEDELEG => self.medeleg = value,
            MIDELEG => self.mideleg = value,
            MIE => self.mie = value,
            MTVEC => self.mtvec = value,
            MCOUNTEREN => self.mcounteren = value,
            MSCRATCH => self.mscratch = value,
            MEPC => self.mepc = value & !1,
            MCAUSE => self.mcause = value,
            MTVAL => self.mtval = value,
            MIP => self.mip = value,
            MCYCLE => self.cycle = (self.cycle & !0xffff_ffff) | value as u64,
            MCYCLEH => self.cycle = (self.cycle & 0xffff_ffff) | ((value as u64) << 32),
            MINSTRET => self.instret = (self.instret & !0xffff_ffff) | value as u64,
            MINSTRETH => self.instret = (self.instret & 0xffff_ffff) | ((value as u64) << 32),
            _ => return Err(CsrError::Unknown(addr)),
        }
        Ok(())
    }

    /// Snapshot of the supervisor file for crash reports.
    pub fn dump(&self) -> Vec<(&'static str, u32)> {
        vec![
            ("sstatus", self.sstatus),
            ("stvec", self.stvec),
            ("sscratch", self.sscratch),
            ("sepc", self.sepc),
            ("scause", self.scause),
            ("stval", self.stval),
            ("satp", self.satp),
            ("mstatus", self.mstatus),
            ("mepc", self.mepc),
            ("mcause", self.mcause),
        ]
    }
}
