//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: 8 general-purpose byte registers
//! - PC: program counter, index of the next instruction to fetch
//! - SP: stack pointer, top of the descending stack (starts at 0xF4)
//! - FL: comparison flags consumed by conditional jumps

use crate::cpu::memory::{Word, STACK_START};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Comparison flags set by CMP and read by JEQ/JNE.
///
/// A true bitfield: `00000LGE`. CMP overwrites the whole field with
/// exactly one bit set, so the three conditions are mutually exclusive.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    /// `reg[A] == reg[B]` on the last CMP.
    pub const EQUAL: u8 = 0b001;
    /// `reg[A] > reg[B]` on the last CMP.
    pub const GREATER: u8 = 0b010;
    /// `reg[A] < reg[B]` on the last CMP.
    pub const LESS: u8 = 0b100;

    /// Create a cleared flags register.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Set the flags from a comparison, replacing any previous state.
    pub fn compare(&mut self, a: Word, b: Word) {
        self.0 = match a.cmp(&b) {
            std::cmp::Ordering::Less => Self::LESS,
            std::cmp::Ordering::Greater => Self::GREATER,
            std::cmp::Ordering::Equal => Self::EQUAL,
        };
    }

    /// Clear all condition bits.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn equal(&self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    pub fn greater(&self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub fn less(&self) -> bool {
        self.0 & Self::LESS != 0
    }

    /// Raw flag bits.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FL={:03b}", self.0)
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7: general-purpose byte registers.
    pub r: [Word; NUM_REGISTERS],

    /// PC: program counter.
    pub pc: usize,

    /// SP: stack pointer, top of the descending stack.
    pub sp: usize,

    /// FL: comparison flags.
    pub fl: Flags,
}

impl Registers {
    /// Create a new register file in the reset state.
    pub fn new() -> Self {
        Self {
            r: [0; NUM_REGISTERS],
            pc: 0,
            sp: STACK_START,
            fl: Flags::new(),
        }
    }

    /// Reset all registers to their initial state.
    pub fn reset(&mut self) {
        self.r = [0; NUM_REGISTERS];
        self.pc = 0;
        self.sp = STACK_START;
        self.fl.clear();
    }

    /// Read a general-purpose register by operand index.
    ///
    /// Operand bytes are untrusted program data, so the index is
    /// validated rather than used directly.
    #[inline]
    pub fn read(&self, reg: Word) -> Result<Word, RegisterError> {
        self.r
            .get(reg as usize)
            .copied()
            .ok_or(RegisterError::InvalidRegister(reg))
    }

    /// Write a general-purpose register by operand index.
    #[inline]
    pub fn write(&mut self, reg: Word, value: Word) -> Result<(), RegisterError> {
        let slot = self
            .r
            .get_mut(reg as usize)
            .ok_or(RegisterError::InvalidRegister(reg))?;
        *slot = value;
        Ok(())
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid register index R{0} (valid: R0-R7)")]
    InvalidRegister(Word),
}
