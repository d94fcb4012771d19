//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction
//! behaviors. Handlers alone advance the PC; the loop never
//! auto-increments it.

use crate::cpu::decode::{self, DecodeError, Instruction, Opcode};
use crate::cpu::memory::{Memory, MemoryError, Word};
use crate::cpu::registers::{RegisterError, Registers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
    /// CPU encountered an error.
    Error,
}

/// ALU operations.
///
/// The LS-8 routes its arithmetic through a single dispatcher; ADD and
/// MUL are the only operations the machine defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AluOp {
    Add,
    Mul,
}

/// The LS-8 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Values printed by PRN, in order. PRN also writes to stdout;
    /// this mirror lets callers observe output without capturing it.
    pub output: Vec<Word>,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            output: Vec::new(),
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.output.clear();
        self.last_instr = None;
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error. Any
    /// error leaves the CPU in the `Error` state.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        match self.cycle() {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(e) => {
                self.state = CpuState::Error;
                Err(e)
            }
        }
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// One fetch-decode-execute cycle.
    fn cycle(&mut self) -> Result<Instruction, CpuError> {
        let pc = self.regs.pc;

        // Fetch: opcode, then exactly the operands it declares. Reads
        // have no side effects, so fetching lazily also keeps HLT legal
        // in the last memory cells.
        let raw = self.mem.read(pc)?;
        let opcode = Opcode::from_byte(raw)?;
        let operand_a = if opcode.operand_count() >= 1 {
            self.mem.read(pc + 1)?
        } else {
            0
        };
        let operand_b = if opcode.operand_count() >= 2 {
            self.mem.read(pc + 2)?
        } else {
            0
        };

        // Decode
        let instr = decode::decode(raw, operand_a, operand_b)?;

        // Execute
        self.execute(instr)?;

        Ok(instr)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        match instr {
            // ==================== Data ====================

            Instruction::Ldi { reg, value } => {
                self.regs.write(reg, value)?;
                self.regs.pc += 3;
            }

            Instruction::Prn { reg } => {
                let value = self.regs.read(reg)?;
                println!("{}", value);
                self.output.push(value);
                self.regs.pc += 2;
            }

            // ==================== Arithmetic ====================

            Instruction::Add { dst, src } => {
                self.alu(AluOp::Add, dst, src)?;
                self.regs.pc += 3;
            }

            Instruction::Mul { dst, src } => {
                self.alu(AluOp::Mul, dst, src)?;
                self.regs.pc += 3;
            }

            // ==================== Stack ====================

            Instruction::Push { reg } => {
                let value = self.regs.read(reg)?;
                self.push(value)?;
                self.regs.pc += 2;
            }

            Instruction::Pop { reg } => {
                let value = self.pop()?;
                self.regs.write(reg, value)?;
                self.regs.pc += 2;
            }

            Instruction::Call { reg } => {
                let target = self.regs.read(reg)?;
                let ret_addr = self.regs.pc + 2;
                let ret_byte = Word::try_from(ret_addr)
                    .map_err(|_| CpuError::Memory(MemoryError::AddressOutOfRange(ret_addr)))?;
                self.push(ret_byte)?;
                self.regs.jump(target as usize);
            }

            Instruction::Ret => {
                let ret_addr = self.pop()?;
                self.regs.jump(ret_addr as usize);
            }

            // ==================== Branching ====================

            Instruction::Cmp { a, b } => {
                let value_a = self.regs.read(a)?;
                let value_b = self.regs.read(b)?;
                self.regs.fl.compare(value_a, value_b);
                self.regs.pc += 3;
            }

            Instruction::Jeq { reg } => {
                if self.regs.fl.equal() {
                    let target = self.regs.read(reg)?;
                    self.regs.jump(target as usize);
                } else {
                    self.regs.pc += 2;
                }
            }

            Instruction::Jne { reg } => {
                if self.regs.fl.less() || self.regs.fl.greater() {
                    let target = self.regs.read(reg)?;
                    self.regs.jump(target as usize);
                } else {
                    self.regs.pc += 2;
                }
            }

            Instruction::Jmp { reg } => {
                let target = self.regs.read(reg)?;
                self.regs.jump(target as usize);
            }

            // ==================== Control ====================

            Instruction::Hlt => {
                // PC stays on the HLT instruction.
                self.state = CpuState::Halted;
            }
        }

        Ok(())
    }

    /// ALU dispatcher. All arithmetic wraps at 8 bits.
    fn alu(&mut self, op: AluOp, dst: Word, src: Word) -> Result<(), CpuError> {
        let a = self.regs.read(dst)?;
        let b = self.regs.read(src)?;

        let result = match op {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Mul => a.wrapping_mul(b),
        };

        self.regs.write(dst, result)?;
        Ok(())
    }

    /// Push a byte onto the descending stack.
    fn push(&mut self, value: Word) -> Result<(), CpuError> {
        // Wrap-to-huge on SP=0 so the write reports out-of-range.
        let sp = self.regs.sp.wrapping_sub(1);
        self.mem.write(sp, value)?;
        self.regs.sp = sp;
        Ok(())
    }

    /// Pop a byte off the stack.
    fn pop(&mut self) -> Result<Word, CpuError> {
        let value = self.mem.read(self.regs.sp)?;
        self.regs.sp += 1;
        Ok(value)
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}


#[cfg(test)]
mod props {
    use super::*;
    use crate::cpu::decode::assemble;
    use crate::cpu::memory::STACK_START;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ldi_prn_roundtrips_any_value(value: u8, reg in 0u8..8) {
            let mut cpu = Cpu::new();
            cpu.load_program(&assemble(&[
                Instruction::Ldi { reg, value },
                Instruction::Prn { reg },
                Instruction::Hlt,
            ])).unwrap();
            cpu.run().unwrap();

            prop_assert_eq!(&cpu.output, &vec![value]);
        }

        #[test]
        fn push_pop_roundtrips_and_restores_sp(value: u8) {
            let mut cpu = Cpu::new();
            cpu.load_program(&assemble(&[
                Instruction::Ldi { reg: 0, value },
                Instruction::Push { reg: 0 },
                Instruction::Pop { reg: 1 },
                Instruction::Hlt,
            ])).unwrap();
            cpu.run().unwrap();

            prop_assert_eq!(cpu.regs.read(1).unwrap(), value);
            prop_assert_eq!(cpu.regs.sp, STACK_START);
        }

        #[test]
        fn alu_matches_wrapping_semantics(a: u8, b: u8) {
            let mut cpu = Cpu::new();
            cpu.load_program(&assemble(&[
                Instruction::Ldi { reg: 0, value: a },
                Instruction::Ldi { reg: 1, value: b },
                Instruction::Add { dst: 0, src: 1 },
                Instruction::Ldi { reg: 2, value: a },
                Instruction::Ldi { reg: 3, value: b },
                Instruction::Mul { dst: 2, src: 3 },
                Instruction::Hlt,
            ])).unwrap();
            cpu.run().unwrap();

            prop_assert_eq!(cpu.regs.read(0).unwrap(), a.wrapping_add(b));
            prop_assert_eq!(cpu.regs.read(2).unwrap(), a.wrapping_mul(b));
        }

        #[test]
        fn cmp_sets_exactly_one_flag(a: u8, b: u8) {
            let mut cpu = Cpu::new();
            cpu.load_program(&assemble(&[
                Instruction::Ldi { reg: 0, value: a },
                Instruction::Ldi { reg: 1, value: b },
                Instruction::Cmp { a: 0, b: 1 },
                Instruction::Hlt,
            ])).unwrap();
            cpu.run().unwrap();

            let fl = cpu.regs.fl;
            let set = [fl.equal(), fl.greater(), fl.less()]
                .iter()
                .filter(|&&x| x)
                .count();
            prop_assert_eq!(set, 1);
            prop_assert_eq!(fl.equal(), a == b);
            prop_assert_eq!(fl.greater(), a > b);
            prop_assert_eq!(fl.less(), a < b);
        }
    }
}
