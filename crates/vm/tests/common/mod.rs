//! Hand-rolled encoders for the instruction words the tests need.

#![allow(dead_code)]

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32) << 20) | (rs1 << 15) | (rd << 7) | 0x13
}

pub fn lui(rd: u32, imm20: u32) -> u32 {
    (imm20 << 12) | (rd << 7) | 0x37
}

pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32) << 20) | (rs1 << 15) | (0x2 << 12) | (rd << 7) | 0x03
}

pub fn sw(rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 5) << 25) | (rs2 << 20) | (rs1 << 15) | (0x2 << 12) | ((imm & 0x1f) << 7) | 0x23
}

pub fn csrrw(rd: u32, csr: u32, rs1: u32) -> u32 {
    (csr << 20) | (rs1 << 15) | (0x1 << 12) | (rd << 7) | 0x73
}

pub fn csrrs(rd: u32, csr: u32, rs1: u32) -> u32 {
    (csr << 20) | (rs1 << 15) | (0x2 << 12) | (rd << 7) | 0x73
}

pub fn csrrwi(rd: u32, csr: u32, uimm: u32) -> u32 {
    (csr << 20) | (uimm << 15) | (0x5 << 12) | (rd << 7) | 0x73
}

pub fn jal(rd: u32, offset: i32) -> u32 {
    let offset = offset as u32;
    let imm20 = (offset >> 20) & 1;
    let imm10_1 = (offset >> 1) & 0x3ff;
    let imm11 = (offset >> 11) & 1;
    let imm19_12 = (offset >> 12) & 0xff;
    (imm20 << 31) | (imm10_1 << 21) | (imm11 << 20) | (imm19_12 << 12) | (rd << 7) | 0x6f
}

pub const ECALL: u32 = 0x0000_0073;
pub const EBREAK: u32 = 0x0010_0073;
pub const SRET: u32 = 0x1020_0073;

/// Assemble a program into a flat little-endian image.
pub fn assemble(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
