//! Disassembler for LS-8 programs.
//!
//! Walks a raw byte stream, decoding each instruction with its
//! operands. Bytes that are not valid opcodes are listed as data.

use crate::cpu::decode::{decode, Opcode};
use crate::cpu::memory::Word;

/// Disassemble a program image into a listing.
pub fn disassemble(bytes: &[Word]) -> String {
    let mut output = String::new();
    output.push_str("# LS-8 disassembly\n\n");

    let mut addr = 0;
    while addr < bytes.len() {
        let raw = bytes[addr];

        match Opcode::from_byte(raw) {
            Ok(opcode) => {
                let count = opcode.operand_count();
                if count > 0 && addr + count >= bytes.len() {
                    // Truncated instruction at the end of the image.
                    output.push_str(&format!("{:03}: {:08b}  # ??? (truncated)\n", addr, raw));
                    addr += 1;
                    continue;
                }

                let a = if count >= 1 { bytes[addr + 1] } else { 0 };
                let b = if count >= 2 { bytes[addr + 2] } else { 0 };

                match decode(raw, a, b) {
                    Ok(instr) => {
                        output.push_str(&format!("{:03}: {}\n", addr, instr));
                        addr += instr.size();
                    }
                    Err(_) => {
                        output.push_str(&format!("{:03}: {:08b}  # data ({})\n", addr, raw, raw));
                        addr += 1;
                    }
                }
            }
            Err(_) => {
                output.push_str(&format!("{:03}: {:08b}  # data ({})\n", addr, raw, raw));
                addr += 1;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_mul_program() {
        let program = [
            0b1000_0010, 0, 8, // LDI R0,8
            0b1000_0010, 1, 9, // LDI R1,9
            0b1010_0010, 0, 1, // MUL R0,R1
            0b0100_0111, 0, //    PRN R0
            0b0000_0001, //       HLT
        ];

        let listing = disassemble(&program);

        assert!(listing.contains("000: LDI R0,8"));
        assert!(listing.contains("003: LDI R1,9"));
        assert!(listing.contains("006: MUL R0,R1"));
        assert!(listing.contains("009: PRN R0"));
        assert!(listing.contains("011: HLT"));
    }

    #[test]
    fn test_disassemble_unknown_byte_listed_as_data() {
        let listing = disassemble(&[0xFF, 0b0000_0001]);

        assert!(listing.contains("000: 11111111  # data (255)"));
        assert!(listing.contains("001: HLT"));
    }

    #[test]
    fn test_disassemble_truncated_instruction() {
        // LDI needs two operands; only one byte follows.
        let listing = disassemble(&[0b1000_0010, 0]);

        assert!(listing.contains("truncated"));
    }
}
