//! CPU emulation for the LS-8 computer.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 byte-sized memory cells shared between program and stack
//! - 8 general-purpose registers plus PC, SP, and a flags register
//! - 13-instruction set with register/immediate operands

pub mod decode;
pub mod execute;
pub mod memory;
pub mod registers;

pub use decode::{decode, encode, DecodeError, Instruction, Opcode};
pub use execute::{Cpu, CpuError, CpuState};
pub use memory::{Memory, Word, MEMORY_SIZE, STACK_START};
pub use registers::{Flags, RegisterError, Registers, NUM_REGISTERS};
