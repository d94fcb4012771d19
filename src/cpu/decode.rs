//! Instruction decoder for the LS-8.
//!
//! Opcode bytes follow the layout `AABCDDDD`:
//! - `AA`: number of operand bytes following the opcode (0-2)
//! - `B`: 1 if the instruction is handled by the ALU
//! - `C`: 1 if the instruction sets the PC itself
//! - `DDDD`: instruction identifier
//!
//! Decoding is a fixed table from opcode byte to handler shape,
//! established once and never mutated.

use crate::cpu::memory::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LS-8 opcodes with their fixed byte encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Load immediate into register.
    Ldi = 0b1000_0010,
    /// Print register as decimal.
    Prn = 0b0100_0111,
    /// Multiply two registers (ALU).
    Mul = 0b1010_0010,
    /// Add two registers (ALU).
    Add = 0b1010_0000,
    /// Push register onto the stack.
    Push = 0b0100_0101,
    /// Pop the stack into a register.
    Pop = 0b0100_0110,
    /// Call the subroutine whose address is in a register.
    Call = 0b0101_0000,
    /// Return from subroutine.
    Ret = 0b0001_0001,
    /// Compare two registers, setting FL (ALU).
    Cmp = 0b1010_0111,
    /// Jump to register address if the Equal flag is set.
    Jeq = 0b0101_0101,
    /// Jump to register address if Less or Greater is set.
    Jne = 0b0101_0110,
    /// Unconditional jump to register address.
    Jmp = 0b0101_0100,
    /// Halt execution.
    Hlt = 0b0000_0001,
}

impl Opcode {
    /// Decode an opcode byte.
    pub fn from_byte(byte: Word) -> Result<Self, DecodeError> {
        let op = match byte {
            0b1000_0010 => Opcode::Ldi,
            0b0100_0111 => Opcode::Prn,
            0b1010_0010 => Opcode::Mul,
            0b1010_0000 => Opcode::Add,
            0b0100_0101 => Opcode::Push,
            0b0100_0110 => Opcode::Pop,
            0b0101_0000 => Opcode::Call,
            0b0001_0001 => Opcode::Ret,
            0b1010_0111 => Opcode::Cmp,
            0b0101_0101 => Opcode::Jeq,
            0b0101_0110 => Opcode::Jne,
            0b0101_0100 => Opcode::Jmp,
            0b0000_0001 => Opcode::Hlt,
            _ => return Err(DecodeError::UnknownOpcode(byte)),
        };
        Ok(op)
    }

    /// The opcode's byte encoding.
    pub fn as_byte(self) -> Word {
        self as Word
    }

    /// Number of operand bytes following the opcode.
    ///
    /// Encoded in the top two bits of the opcode byte.
    pub fn operand_count(self) -> usize {
        (self.as_byte() >> 6) as usize
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Mul => "MUL",
            Opcode::Add => "ADD",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Cmp => "CMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Jmp => "JMP",
            Opcode::Hlt => "HLT",
        }
    }
}

/// Decoded LS-8 instruction with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// reg[reg] := value
    Ldi { reg: Word, value: Word },

    /// Print reg[reg] as a decimal integer with trailing newline.
    Prn { reg: Word },

    /// reg[dst] := reg[dst] * reg[src] (wrapping at 8 bits)
    Mul { dst: Word, src: Word },

    /// reg[dst] := reg[dst] + reg[src] (wrapping at 8 bits)
    Add { dst: Word, src: Word },

    /// SP -= 1; memory[SP] := reg[reg]
    Push { reg: Word },

    /// reg[reg] := memory[SP]; SP += 1
    Pop { reg: Word },

    /// Push PC+2, then PC := reg[reg]
    Call { reg: Word },

    /// PC := memory[SP]; SP += 1
    Ret,

    /// Set FL from comparing reg[a] to reg[b].
    Cmp { a: Word, b: Word },

    /// If Equal: PC := reg[reg], else fall through.
    Jeq { reg: Word },

    /// If not Equal: PC := reg[reg], else fall through.
    Jne { reg: Word },

    /// PC := reg[reg]
    Jmp { reg: Word },

    /// Stop execution, PC unchanged.
    Hlt,
}

impl Instruction {
    /// The opcode this instruction encodes to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Ldi { .. } => Opcode::Ldi,
            Instruction::Prn { .. } => Opcode::Prn,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Push { .. } => Opcode::Push,
            Instruction::Pop { .. } => Opcode::Pop,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Ret => Opcode::Ret,
            Instruction::Cmp { .. } => Opcode::Cmp,
            Instruction::Jeq { .. } => Opcode::Jeq,
            Instruction::Jne { .. } => Opcode::Jne,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Hlt => Opcode::Hlt,
        }
    }

    /// Total size in bytes: opcode plus operands.
    pub fn size(&self) -> usize {
        1 + self.opcode().operand_count()
    }
}

/// Decode an opcode byte and its (pre-fetched) operand bytes.
///
/// Operands beyond the opcode's operand count are ignored.
pub fn decode(opcode: Word, a: Word, b: Word) -> Result<Instruction, DecodeError> {
    let instruction = match Opcode::from_byte(opcode)? {
        Opcode::Ldi => Instruction::Ldi { reg: a, value: b },
        Opcode::Prn => Instruction::Prn { reg: a },
        Opcode::Mul => Instruction::Mul { dst: a, src: b },
        Opcode::Add => Instruction::Add { dst: a, src: b },
        Opcode::Push => Instruction::Push { reg: a },
        Opcode::Pop => Instruction::Pop { reg: a },
        Opcode::Call => Instruction::Call { reg: a },
        Opcode::Ret => Instruction::Ret,
        Opcode::Cmp => Instruction::Cmp { a, b },
        Opcode::Jeq => Instruction::Jeq { reg: a },
        Opcode::Jne => Instruction::Jne { reg: a },
        Opcode::Jmp => Instruction::Jmp { reg: a },
        Opcode::Hlt => Instruction::Hlt,
    };

    Ok(instruction)
}

/// Encode an instruction back to its byte form.
pub fn encode(instr: &Instruction) -> Vec<Word> {
    let mut bytes = vec![instr.opcode().as_byte()];

    match *instr {
        Instruction::Ldi { reg, value } => bytes.extend([reg, value]),
        Instruction::Mul { dst, src } | Instruction::Add { dst, src } => {
            bytes.extend([dst, src])
        }
        Instruction::Cmp { a, b } => bytes.extend([a, b]),
        Instruction::Prn { reg }
        | Instruction::Push { reg }
        | Instruction::Pop { reg }
        | Instruction::Call { reg }
        | Instruction::Jeq { reg }
        | Instruction::Jne { reg }
        | Instruction::Jmp { reg } => bytes.push(reg),
        Instruction::Ret | Instruction::Hlt => {}
    }

    bytes
}

/// Encode a sequence of instructions into a flat program image.
pub fn assemble(instructions: &[Instruction]) -> Vec<Word> {
    instructions.iter().flat_map(encode).collect()
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = self.opcode().mnemonic();
        match *self {
            Instruction::Ldi { reg, value } => write!(f, "{} R{},{}", m, reg, value),
            Instruction::Mul { dst, src } | Instruction::Add { dst, src } => {
                write!(f, "{} R{},R{}", m, dst, src)
            }
            Instruction::Cmp { a, b } => write!(f, "{} R{},R{}", m, a, b),
            Instruction::Prn { reg }
            | Instruction::Push { reg }
            | Instruction::Pop { reg }
            | Instruction::Call { reg }
            | Instruction::Jeq { reg }
            | Instruction::Jne { reg }
            | Instruction::Jmp { reg } => write!(f, "{} R{}", m, reg),
            Instruction::Ret | Instruction::Hlt => write!(f, "{}", m),
        }
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#010b}")]
    UnknownOpcode(Word),
}
