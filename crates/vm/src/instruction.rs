/// Decoded RV32IMA + Zicsr instruction, including the privileged
/// instructions the supervisor kernel needs. Each variant corresponds to one
/// 32-bit instruction word; the compressed extension is not supported.
#[derive(Debug, PartialEq, Eq)]
pub enum Instruction {
    // ===== RV32I =====

    /// Add: rd = rs1 + rs2
    Add { rd: usize, rs1: usize, rs2: usize },
    /// Subtract: rd = rs1 - rs2
    Sub { rd: usize, rs1: usize, rs2: usize },
    /// Add immediate: rd = rs1 + imm
    Addi { rd: usize, rs1: usize, imm: i32 },

    /// AND: rd = rs1 & rs2
    And { rd: usize, rs1: usize, rs2: usize },
    /// OR: rd = rs1 | rs2
    Or { rd: usize, rs1: usize, rs2: usize },
    /// XOR: rd = rs1 ^ rs2
    Xor { rd: usize, rs1: usize, rs2: usize },

    /// ANDI: rd = rs1 & imm
    Andi { rd: usize, rs1: usize, imm: i32 },
    /// ORI: rd = rs1 | imm
    Ori { rd: usize, rs1: usize, imm: i32 },
    /// XORI: rd = rs1 ^ imm
    Xori { rd: usize, rs1: usize, imm: i32 },

    /// Set less than (signed): rd = (rs1 < rs2)
    Slt { rd: usize, rs1: usize, rs2: usize },
    /// Set less than unsigned
    Sltu { rd: usize, rs1: usize, rs2: usize },
    /// Set less than immediate (signed)
    Slti { rd: usize, rs1: usize, imm: i32 },
    /// Set less than immediate unsigned
    Sltiu { rd: usize, rs1: usize, imm: i32 },

    /// Shift left logical: rd = rs1 << (rs2 & 0x1f)
    Sll { rd: usize, rs1: usize, rs2: usize },
    /// Shift right logical
    Srl { rd: usize, rs1: usize, rs2: usize },
    /// Shift right arithmetic
    Sra { rd: usize, rs1: usize, rs2: usize },

    /// Shift left logical immediate
    Slli { rd: usize, rs1: usize, shamt: u8 },
    /// Shift right logical immediate
    Srli { rd: usize, rs1: usize, shamt: u8 },
    /// Shift right arithmetic immediate
    Srai { rd: usize, rs1: usize, shamt: u8 },

    /// Load byte, sign-extended
    Lb { rd: usize, rs1: usize, offset: i32 },
    /// Load halfword, sign-extended
    Lh { rd: usize, rs1: usize, offset: i32 },
    /// Load word
    Lw { rd: usize, rs1: usize, offset: i32 },
    /// Load byte, zero-extended
    Lbu { rd: usize, rs1: usize, offset: i32 },
    /// Load halfword, zero-extended
    Lhu { rd: usize, rs1: usize, offset: i32 },
    /// Store byte
    Sb { rs1: usize, rs2: usize, offset: i32 },
    /// Store halfword
    Sh { rs1: usize, rs2: usize, offset: i32 },
    /// Store word
    Sw { rs1: usize, rs2: usize, offset: i32 },

    /// Branch if equal: if (rs1 == rs2) pc += offset
    Beq { rs1: usize, rs2: usize, offset: i32 },
    /// Branch if not equal
    Bne { rs1: usize, rs2: usize, offset: i32 },
    /// Branch if less than (signed)
    Blt { rs1: usize, rs2: usize, offset: i32 },
    /// Branch if greater or equal (signed)
    Bge { rs1: usize, rs2: usize, offset: i32 },
    /// Branch if less than (unsigned)
    Bltu { rs1: usize, rs2: usize, offset: i32 },
    /// Branch if greater or equal (unsigned)
    Bgeu { rs1: usize, rs2: usize, offset: i32 },

    /// Jump and link: rd = pc + 4; pc += offset
    Jal { rd: usize, offset: i32 },
    /// Jump and link register: rd = pc + 4; pc = (rs1 + offset) & !1
    Jalr { rd: usize, rs1: usize, offset: i32 },

    /// Load upper immediate: rd = imm << 12
    Lui { rd: usize, imm: i32 },
    /// Add upper immediate to pc: rd = pc + (imm << 12)
    Auipc { rd: usize, imm: i32 },

    /// FENCE / FENCE.I: single hart, in-order core; nothing to order.
    Fence,

    // ===== RV32M =====

    /// Multiply: rd = (rs1 * rs2)[31:0]
    Mul { rd: usize, rs1: usize, rs2: usize },
    /// Multiply high signed x signed
    Mulh { rd: usize, rs1: usize, rs2: usize },
    /// Multiply high signed x unsigned
    Mulhsu { rd: usize, rs1: usize, rs2: usize },
    /// Multiply high unsigned x unsigned
    Mulhu { rd: usize, rs1: usize, rs2: usize },
    /// Divide signed; div-by-zero yields -1, overflow yields the dividend
    Div { rd: usize, rs1: usize, rs2: usize },
    /// Divide unsigned; div-by-zero yields all-ones
    Divu { rd: usize, rs1: usize, rs2: usize },
    /// Remainder signed
    Rem { rd: usize, rs1: usize, rs2: usize },
    /// Remainder unsigned
    Remu { rd: usize, rs1: usize, rs2: usize },

    // ===== RV32A =====

    /// Load-reserved word
    LrW { rd: usize, rs1: usize },
    /// Store-conditional word: rd = 0 on success, 1 on failure
    ScW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic swap
    AmoswapW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic add
    AmoaddW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic XOR
    AmoxorW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic OR
    AmoorW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic AND
    AmoandW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic min signed
    AmominW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic max signed
    AmomaxW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic min unsigned
    AmominuW { rd: usize, rs1: usize, rs2: usize },
    /// Atomic max unsigned
    AmomaxuW { rd: usize, rs1: usize, rs2: usize },

    // ===== Zicsr =====

    /// CSR read/write: rd = csr; csr = rs1 (read skipped when rd is x0)
    Csrrw { rd: usize, rs1: usize, csr: u32 },
    /// CSR read/set: rd = csr; csr |= rs1 (write skipped when rs1 is x0)
    Csrrs { rd: usize, rs1: usize, csr: u32 },
    /// CSR read/clear: rd = csr; csr &= !rs1 (write skipped when rs1 is x0)
    Csrrc { rd: usize, rs1: usize, csr: u32 },
    /// CSR read/write immediate
    Csrrwi { rd: usize, uimm: u32, csr: u32 },
    /// CSR read/set immediate
    Csrrsi { rd: usize, uimm: u32, csr: u32 },
    /// CSR read/clear immediate
    Csrrci { rd: usize, uimm: u32, csr: u32 },

    // ===== Privileged =====

    /// Environment call into the next privilege level
    Ecall,
    /// Breakpoint; this core treats it as a guest-requested halt
    Ebreak,
    /// Return from a supervisor trap handler
    Sret,
    /// Return from a machine trap handler
    Mret,
    /// Wait for interrupt; a no-op without an interrupt source
    Wfi,
    /// Flush address-translation caches; a no-op without a TLB
    SfenceVma { rs1: usize, rs2: usize },

    /// Canonical illegal/padding word (0x0000_0000 or 0x0000_000f)
    Unimp,
}

impl Instruction {
    /// Disassembly for trace output.
    pub fn pretty_print(&self) -> String {
        fn reg(r: usize) -> String {
            format!("x{}", r)
        }

        use Instruction::*;
        match self {
            Add { rd, rs1, rs2 } => format!("add  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Sub { rd, rs1, rs2 } => format!("sub  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Addi { rd, rs1, imm } => format!("addi {}, {}, {}", reg(*rd), reg(*rs1), imm),

            And { rd, rs1, rs2 } => format!("and  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Or { rd, rs1, rs2 } => format!("or   {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Xor { rd, rs1, rs2 } => format!("xor  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),

            Andi { rd, rs1, imm } => format!("andi {}, {}, {}", reg(*rd), reg(*rs1), imm),
            Ori { rd, rs1, imm } => format!("ori  {}, {}, {}", reg(*rd), reg(*rs1), imm),
            Xori { rd, rs1, imm } => format!("xori {}, {}, {}", reg(*rd), reg(*rs1), imm),

            Slt { rd, rs1, rs2 } => format!("slt  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Sltu { rd, rs1, rs2 } => format!("sltu {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Slti { rd, rs1, imm } => format!("slti {}, {}, {}", reg(*rd), reg(*rs1), imm),
            Sltiu { rd, rs1, imm } => format!("sltiu {}, {}, {}", reg(*rd), reg(*rs1), imm),

            Sll { rd, rs1, rs2 } => format!("sll  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Srl { rd, rs1, rs2 } => format!("srl  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Sra { rd, rs1, rs2 } => format!("sra  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Slli { rd, rs1, shamt } => format!("slli {}, {}, {}", reg(*rd), reg(*rs1), shamt),
            Srli { rd, rs1, shamt } => format!("srli {}, {}, {}", reg(*rd), reg(*rs1), shamt),
            Srai { rd, rs1, shamt } => format!("srai {}, {}, {}", reg(*rd), reg(*rs1), shamt),

            Lb { rd, rs1, offset } => format!("lb   {}, {}({})", reg(*rd), offset, reg(*rs1)),
            Lh { rd, rs1, offset } => format!("lh   {}, {}({})", reg(*rd), offset, reg(*rs1)),
            Lw { rd, rs1, offset } => format!("lw   {}, {}({})", reg(*rd), offset, reg(*rs1)),
            Lbu { rd, rs1, offset } => format!("lbu  {}, {}({})", reg(*rd), offset, reg(*rs1)),
            Lhu { rd, rs1, offset } => format!("lhu  {}, {}({})", reg(*rd), offset, reg(*rs1)),
            Sb { rs1, rs2, offset } => format!("sb   {}, {}({})", reg(*rs2), offset, reg(*rs1)),
            Sh { rs1, rs2, offset } => format!("sh   {}, {}({})", reg(*rs2), offset, reg(*rs1)),
            Sw { rs1, rs2, offset } => format!("sw   {}, {}({})", reg(*rs2), offset, reg(*rs1)),

            Beq { rs1, rs2, offset } => format!("beq  {}, {}, pc+{}", reg(*rs1), reg(*rs2), offset),
            Bne { rs1, rs2, offset } => format!("bne  {}, {}, pc+{}", reg(*rs1), reg(*rs2), offset),
            Blt { rs1, rs2, offset } => format!("blt  {}, {}, pc+{}", reg(*rs1), reg(*rs2), offset),
            Bge { rs1, rs2, offset } => format!("bge  {}, {}, pc+{}", reg(*rs1), reg(*rs2), offset),
            Bltu { rs1, rs2, offset } => {
                format!("bltu {}, {}, pc+{}", reg(*rs1), reg(*rs2), offset)
            }
            Bgeu { rs1, rs2, offset } => {
                format!("bgeu {}, {}, pc+{}", reg(*rs1), reg(*rs2), offset)
            }

            Jal { rd, offset } => format!("jal  {}, pc+{}", reg(*rd), offset),
            Jalr { rd, rs1, offset } => format!("jalr {}, {}({})", reg(*rd), offset, reg(*rs1)),

            Lui { rd, imm } => format!("lui  {}, {}", reg(*rd), imm),
            Auipc { rd, imm } => format!("auipc {}, {}", reg(*rd), imm),

            Fence => "fence".to_string(),

            Mul { rd, rs1, rs2 } => format!("mul  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Mulh { rd, rs1, rs2 } => format!("mulh {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Mulhsu { rd, rs1, rs2 } => {
                format!("mulhsu {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2))
            }
            Mulhu { rd, rs1, rs2 } => format!("mulhu {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Div { rd, rs1, rs2 } => format!("div  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Divu { rd, rs1, rs2 } => format!("divu {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Rem { rd, rs1, rs2 } => format!("rem  {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),
            Remu { rd, rs1, rs2 } => format!("remu {}, {}, {}", reg(*rd), reg(*rs1), reg(*rs2)),

            LrW { rd, rs1 } => format!("lr.w {}, ({})", reg(*rd), reg(*rs1)),
            ScW { rd, rs1, rs2 } => format!("sc.w {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1)),
            AmoswapW { rd, rs1, rs2 } => {
                format!("amoswap.w {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmoaddW { rd, rs1, rs2 } => {
                format!("amoadd.w  {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmoxorW { rd, rs1, rs2 } => {
                format!("amoxor.w  {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmoorW { rd, rs1, rs2 } => {
                format!("amoor.w   {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmoandW { rd, rs1, rs2 } => {
                format!("amoand.w  {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmominW { rd, rs1, rs2 } => {
                format!("amomin.w  {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmomaxW { rd, rs1, rs2 } => {
                format!("amomax.w  {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmominuW { rd, rs1, rs2 } => {
                format!("amominu.w {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }
            AmomaxuW { rd, rs1, rs2 } => {
                format!("amomaxu.w {}, {}, ({})", reg(*rd), reg(*rs2), reg(*rs1))
            }

            Csrrw { rd, rs1, csr } => format!("csrrw {}, 0x{:03x}, {}", reg(*rd), csr, reg(*rs1)),
            Csrrs { rd, rs1, csr } => format!("csrrs {}, 0x{:03x}, {}", reg(*rd), csr, reg(*rs1)),
            Csrrc { rd, rs1, csr } => format!("csrrc {}, 0x{:03x}, {}", reg(*rd), csr, reg(*rs1)),
            Csrrwi { rd, uimm, csr } => format!("csrrwi {}, 0x{:03x}, {}", reg(*rd), csr, uimm),
            Csrrsi { rd, uimm, csr } => format!("csrrsi {}, 0x{:03x}, {}", reg(*rd), csr, uimm),
            Csrrci { rd, uimm, csr } => format!("csrrci {}, 0x{:03x}, {}", reg(*rd), csr, uimm),

            Ecall => "ecall".to_string(),
            Ebreak => "ebreak".to_string(),
            Sret => "sret".to_string(),
            Mret => "mret".to_string(),
            Wfi => "wfi".to_string(),
            SfenceVma { rs1, rs2 } => format!("sfence.vma {}, {}", reg(*rs1), reg(*rs2)),
            Unimp => "unimp".to_string(),
        }
    }
}
