//! # LS-8 Emulator
//!
//! An emulator of the LS-8, an 8-bit register-based bytecode computer:
//! 256 bytes of memory shared between program and a descending stack,
//! eight general-purpose registers, and comparison-driven branching.
//!
//! Programs are text files of 8-character binary literals (one byte per
//! line); the CPU fetches, decodes, and executes them until HLT.

pub mod cpu;
pub mod disasm;
pub mod loader;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, Flags, Instruction, Memory, Opcode, Registers, Word};
pub use disasm::disassemble;
pub use loader::{load_program, parse_program, LoaderError, ProgramFile};
