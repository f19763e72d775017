use crate::instruction::Instruction;
use crate::isa::Opcode;

/// Decode a 32-bit instruction word.
///
/// Field layout:
/// ```text
/// 31:25  funct7   24:20  rs2   19:15  rs1
/// 14:12  funct3   11:7   rd     6:0   opcode
/// ```
///
/// Returns `None` for anything unrecognized, including compressed (16-bit)
/// encodings: words whose bottom two bits are not `0b11` are rejected, so a
/// jump into compressed code raises an illegal-instruction trap instead of
/// executing garbage.
pub fn decode(word: u32) -> Option<Instruction> {
    // Padding and the canonical unimp word.
    if word == 0x0000_0000 || word == 0x0000_000f {
        return Some(Instruction::Unimp);
    }
    if word & 0b11 != 0b11 {
        return None;
    }

    let opcode = Opcode::from_u8((word & 0x7f) as u8)?;

    let rd = ((word >> 7) & 0x1f) as usize;
    let funct3 = ((word >> 12) & 0x07) as u8;
    let rs1 = ((word >> 15) & 0x1f) as usize;
    let rs2 = ((word >> 20) & 0x1f) as usize;
    let funct7 = ((word >> 25) & 0x7f) as u8;

    match opcode {
        Opcode::Op => match (funct3, funct7) {
            (0x0, 0x00) => Some(Instruction::Add { rd, rs1, rs2 }),
            (0x0, 0x20) => Some(Instruction::Sub { rd, rs1, rs2 }),
            (0x1, 0x00) => Some(Instruction::Sll { rd, rs1, rs2 }),
            (0x2, 0x00) => Some(Instruction::Slt { rd, rs1, rs2 }),
            (0x3, 0x00) => Some(Instruction::Sltu { rd, rs1, rs2 }),
            (0x4, 0x00) => Some(Instruction::Xor { rd, rs1, rs2 }),
            (0x5, 0x00) => Some(Instruction::Srl { rd, rs1, rs2 }),
            (0x5, 0x20) => Some(Instruction::Sra { rd, rs1, rs2 }),
            (0x6, 0x00) => Some(Instruction::Or { rd, rs1, rs2 }),
            (0x7, 0x00) => Some(Instruction::And { rd, rs1, rs2 }),

            // M extension.
            (0x0, 0x01) => Some(Instruction::Mul { rd, rs1, rs2 }),
            (0x1, 0x01) => Some(Instruction::Mulh { rd, rs1, rs2 }),
            (0x2, 0x01) => Some(Instruction::Mulhsu { rd, rs1, rs2 }),
            (0x3, 0x01) => Some(Instruction::Mulhu { rd, rs1, rs2 }),
            (0x4, 0x01) => Some(Instruction::Div { rd, rs1, rs2 }),
            (0x5, 0x01) => Some(Instruction::Divu { rd, rs1, rs2 }),
            (0x6, 0x01) => Some(Instruction::Rem { rd, rs1, rs2 }),
            (0x7, 0x01) => Some(Instruction::Remu { rd, rs1, rs2 }),
            _ => None,
        },

        Opcode::OpImm => {
            // Sign-extend the 12-bit immediate in bits 31:20.
            let imm = (word as i32) >> 20;
            match funct3 {
                0x0 => Some(Instruction::Addi { rd, rs1, imm }),
                0x2 => Some(Instruction::Slti { rd, rs1, imm }),
                0x3 => Some(Instruction::Sltiu { rd, rs1, imm }),
                0x4 => Some(Instruction::Xori { rd, rs1, imm }),
                0x6 => Some(Instruction::Ori { rd, rs1, imm }),
                0x7 => Some(Instruction::Andi { rd, rs1, imm }),
                0x1 => Some(Instruction::Slli {
                    rd,
                    rs1,
                    shamt: (imm & 0x1f) as u8,
                }),
                0x5 => match funct7 {
                    0x00 => Some(Instruction::Srli {
                        rd,
                        rs1,
                        shamt: (imm & 0x1f) as u8,
                    }),
                    0x20 => Some(Instruction::Srai {
                        rd,
                        rs1,
                        shamt: (imm & 0x1f) as u8,
                    }),
                    _ => None,
                },
                _ => None,
            }
        }

        Opcode::Load => {
            let imm = (word as i32) >> 20;
            match funct3 {
                0x0 => Some(Instruction::Lb { rd, rs1, offset: imm }),
                0x1 => Some(Instruction::Lh { rd, rs1, offset: imm }),
                0x2 => Some(Instruction::Lw { rd, rs1, offset: imm }),
                0x4 => Some(Instruction::Lbu { rd, rs1, offset: imm }),
                0x5 => Some(Instruction::Lhu { rd, rs1, offset: imm }),
                _ => None,
            }
        }

        Opcode::Store => {
            // S-type: imm[11:5] in bits 31:25, imm[4:0] in bits 11:7.
            let imm11_5 = ((word >> 25) & 0x7f) << 5;
            let imm4_0 = (word >> 7) & 0x1f;
            let imm = ((imm11_5 | imm4_0) as i32) << 20 >> 20;
            match funct3 {
                0x0 => Some(Instruction::Sb { rs1, rs2, offset: imm }),
                0x1 => Some(Instruction::Sh { rs1, rs2, offset: imm }),
                0x2 => Some(Instruction::Sw { rs1, rs2, offset: imm }),
                _ => None,
            }
        }

        Opcode::Branch => {
            let imm = extract_branch_offset(word);
            match funct3 {
                0x0 => Some(Instruction::Beq { rs1, rs2, offset: imm }),
                0x1 => Some(Instruction::Bne { rs1, rs2, offset: imm }),
                0x4 => Some(Instruction::Blt { rs1, rs2, offset: imm }),
                0x5 => Some(Instruction::Bge { rs1, rs2, offset: imm }),
                0x6 => Some(Instruction::Bltu { rs1, rs2, offset: imm }),
                0x7 => Some(Instruction::Bgeu { rs1, rs2, offset: imm }),
                _ => None,
            }
        }

        Opcode::Jal => Some(Instruction::Jal {
            rd,
            offset: extract_jal_offset(word),
        }),

        Opcode::Jalr => {
            let imm = (word as i32) >> 20;
            match funct3 {
                0x0 => Some(Instruction::Jalr { rd, rs1, offset: imm }),
                _ => None,
            }
        }

        Opcode::Lui => Some(Instruction::Lui {
            rd,
            imm: (word >> 12) as i32,
        }),
        Opcode::Auipc => Some(Instruction::Auipc {
            rd,
            imm: (word >> 12) as i32,
        }),

        Opcode::MiscMem => match funct3 {
            // FENCE and FENCE.I.
            0x0 | 0x1 => Some(Instruction::Fence),
            _ => None,
        },

        Opcode::System => {
            let csr = word >> 20;
            match funct3 {
                0x0 => {
                    // Privileged instructions live in the immediate field.
                    if funct7 == 0x09 {
                        return Some(Instruction::SfenceVma { rs1, rs2 });
                    }
                    match csr {
                        0x000 => Some(Instruction::Ecall),
                        0x001 => Some(Instruction::Ebreak),
                        0x102 => Some(Instruction::Sret),
                        0x302 => Some(Instruction::Mret),
                        0x105 => Some(Instruction::Wfi),
                        _ => None,
                    }
                }
                0x1 => Some(Instruction::Csrrw { rd, rs1, csr }),
                0x2 => Some(Instruction::Csrrs { rd, rs1, csr }),
                0x3 => Some(Instruction::Csrrc { rd, rs1, csr }),
                0x5 => Some(Instruction::Csrrwi { rd, uimm: rs1 as u32, csr }),
                0x6 => Some(Instruction::Csrrsi { rd, uimm: rs1 as u32, csr }),
                0x7 => Some(Instruction::Csrrci { rd, uimm: rs1 as u32, csr }),
                _ => None,
            }
        }

        Opcode::Amo => {
            if funct3 != 0x2 {
                return None;
            }
            // funct5 in bits 31:27; bits 26:25 are aq/rl ordering hints,
            // meaningless on a single in-order hart.
            let funct5 = funct7 >> 2;
            match funct5 {
                0x02 if rs2 == 0 => Some(Instruction::LrW { rd, rs1 }),
                0x03 => Some(Instruction::ScW { rd, rs1, rs2 }),
                0x01 => Some(Instruction::AmoswapW { rd, rs1, rs2 }),
                0x00 => Some(Instruction::AmoaddW { rd, rs1, rs2 }),
                0x04 => Some(Instruction::AmoxorW { rd, rs1, rs2 }),
                0x08 => Some(Instruction::AmoorW { rd, rs1, rs2 }),
                0x0c => Some(Instruction::AmoandW { rd, rs1, rs2 }),
                0x10 => Some(Instruction::AmominW { rd, rs1, rs2 }),
                0x14 => Some(Instruction::AmomaxW { rd, rs1, rs2 }),
                0x18 => Some(Instruction::AmominuW { rd, rs1, rs2 }),
                0x1c => Some(Instruction::AmomaxuW { rd, rs1, rs2 }),
                _ => None,
            }
        }
    }
}

/// B-type immediate: imm[12|10:5] in bits 31:25, imm[4:1|11] in bits 11:7,
/// always even, sign-extended from 13 bits.
fn extract_branch_offset(word: u32) -> i32 {
    let imm12 = (word >> 31) & 0x1;
    let imm10_5 = (word >> 25) & 0x3f;
    let imm4_1 = (word >> 8) & 0xf;
    let imm11 = (word >> 7) & 0x1;
    let imm = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    ((imm as i32) << 19) >> 19
}

/// J-type immediate: imm[20|10:1|11|19:12] packed in bits 31:12, always
/// even, sign-extended from 21 bits.
fn extract_jal_offset(word: u32) -> i32 {
    let imm20 = (word >> 31) & 0x1;
    let imm10_1 = (word >> 21) & 0x3ff;
    let imm11 = (word >> 20) & 0x1;
    let imm19_12 = (word >> 12) & 0xff;
    let imm = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    ((imm as i32) << 11) >> 11
}
