/// Primary RISC-V opcodes, taken from the bottom 7 bits of an instruction
/// word. Each opcode selects the instruction format used to interpret the
/// remaining fields.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq)]
pub enum Opcode {
    /// LOAD (0x03): LB, LH, LW, LBU, LHU. I-type.
    Load = 0x03,
    /// MISC-MEM (0x0F): FENCE, FENCE.I. Memory ordering, no-ops here.
    MiscMem = 0x0f,
    /// STORE (0x23): SB, SH, SW. S-type.
    Store = 0x23,
    /// BRANCH (0x63): BEQ, BNE, BLT, BGE, BLTU, BGEU. B-type.
    Branch = 0x63,
    /// JAL (0x6F): jump and link. J-type.
    Jal = 0x6f,
    /// JALR (0x67): indirect jump and link. I-type.
    Jalr = 0x67,
    /// OP-IMM (0x13): ADDI, ANDI, shifts and friends. I-type.
    OpImm = 0x13,
    /// OP (0x33): register-register arithmetic, including the M extension.
    Op = 0x33,
    /// LUI (0x37): load upper immediate. U-type.
    Lui = 0x37,
    /// AUIPC (0x17): pc-relative upper immediate. U-type.
    Auipc = 0x17,
    /// SYSTEM (0x73): ECALL, EBREAK, CSR ops, SRET/MRET/WFI, SFENCE.VMA.
    System = 0x73,
    /// AMO (0x2F): atomic memory operations and LR/SC.
    Amo = 0x2f,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        use Opcode::*;
        Some(match value {
            0x03 => Load,
            0x0f => MiscMem,
            0x23 => Store,
            0x63 => Branch,
            0x6f => Jal,
            0x67 => Jalr,
            0x13 => OpImm,
            0x33 => Op,
            0x37 => Lui,
            0x17 => Auipc,
            0x73 => System,
            0x2f => Amo,
            _ => return None,
        })
    }
}
