//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu run <program>` - Run an `.ls8` program until it halts
//! - `ls8-emu disasm <program>` - Disassemble an `.ls8` program
//! - `ls8-emu test` - Run the built-in self-test

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the LS-8, an 8-bit register-based bytecode computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ls8 file to execute
        program: String,
        /// Maximum number of cycles to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state as JSON to this path
        #[arg(long)]
        dump_state: Option<String>,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the .ls8 file
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            program,
            max_cycles,
            trace,
            dump_state,
        }) => {
            run_program(&program, max_cycles, trace, dump_state.as_deref());
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("LS-8 Emulator v0.1.0");
            println!("An 8-bit register-based bytecode computer");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Load a program file, exiting with the documented codes on failure:
/// 2 when the file does not exist, 1 for any other load error.
fn load_or_exit(path: &str) -> ls8::ProgramFile {
    use ls8::LoaderError;

    match ls8::load_program(path) {
        Ok(program) => program,
        Err(e @ LoaderError::FileNotFound { .. }) => {
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, max_cycles: u64, trace: bool, dump_state: Option<&str>) {
    use ls8::{Cpu, CpuState};

    println!("🔧 Running: {}", path);

    let program = load_or_exit(path);

    if program.is_empty() {
        eprintln!("❌ No program bytes to execute");
        std::process::exit(1);
    }

    println!("📂 Loaded {} bytes", program.len());

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&program.bytes) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("━━━ Execution ━━━");

    let mut cycles = 0u64;
    while cpu.is_running() && cycles < max_cycles {
        let pc = cpu.regs.pc;

        match cpu.step() {
            Ok(instr) => {
                if trace {
                    println!(
                        "{:03}: {:<12} R={:?} SP={:#04x} {:?}",
                        pc, instr.to_string(), cpu.regs.r, cpu.regs.sp, cpu.regs.fl
                    );
                }
                cycles += 1;
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={}: {}", pc, e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cycles);
    println!("State: {:?}", cpu.state);
    for (i, value) in cpu.regs.r.iter().enumerate() {
        println!("R{}: {}", i, value);
    }
    println!("PC: {}", cpu.regs.pc);
    println!("SP: {:#04x}", cpu.regs.sp);
    println!("{:?}", cpu.regs.fl);

    if cycles >= max_cycles && cpu.state == CpuState::Running {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if let Some(out_path) = dump_state {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => {
                if let Err(e) = std::fs::write(out_path, json) {
                    eprintln!("❌ Failed to write state dump: {}", e);
                    std::process::exit(1);
                }
                println!("💾 State dumped to {}", out_path);
            }
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn disassemble_file(path: &str) {
    use ls8::disassemble;

    println!("📖 Disassembling: {}", path);
    println!();

    let program = load_or_exit(path);

    print!("{}", disassemble(&program.bytes));
}

fn run_self_test() {
    use ls8::cpu::decode::{assemble, Instruction};
    use ls8::{parse_program, Cpu};

    println!("━━━ LS-8 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // Test 1: HLT stops the machine
    print!("CPU halt instruction... ");
    let mut cpu = Cpu::new();
    cpu.load_program(&assemble(&[Instruction::Hlt])).unwrap();
    let result = cpu.run();
    if result.is_ok() && cpu.is_halted() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 2: the canonical 8 × 9 program prints 72
    print!("Multiply program prints 72... ");
    let source = "\
10000010 # LDI R0,8
00000000
00001000
10000010 # LDI R1,9
00000001
00001001
10100010 # MUL R0,R1
00000000
00000001
01000111 # PRN R0
00000000
00000001 # HLT
";
    let bytes = parse_program(source).unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&bytes).unwrap();
    cpu.run().unwrap();
    if cpu.output == vec![72] {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (got {:?}, expected [72])", cpu.output);
        failed += 1;
    }

    // Test 3: push/pop round-trip restores SP
    print!("Stack push/pop round-trip... ");
    let mut cpu = Cpu::new();
    cpu.load_program(&assemble(&[
        Instruction::Ldi { reg: 0, value: 42 },
        Instruction::Push { reg: 0 },
        Instruction::Pop { reg: 1 },
        Instruction::Hlt,
    ]))
    .unwrap();
    cpu.run().unwrap();
    if cpu.regs.read(1).unwrap() == 42 && cpu.regs.sp == 0xF4 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 4: CALL/RET resumes after the call site
    print!("CALL/RET round-trip... ");
    let mut cpu = Cpu::new();
    cpu.load_program(&assemble(&[
        Instruction::Ldi { reg: 1, value: 14 },
        Instruction::Ldi { reg: 0, value: 10 },
        Instruction::Ldi { reg: 2, value: 20 },
        Instruction::Call { reg: 1 },
        Instruction::Prn { reg: 0 },
        Instruction::Hlt,
        Instruction::Add { dst: 0, src: 2 },
        Instruction::Ret,
    ]))
    .unwrap();
    cpu.run().unwrap();
    if cpu.output == vec![30] {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (got {:?}, expected [30])", cpu.output);
        failed += 1;
    }

    // Test 5: unknown opcode reported, not a crash
    print!("Unknown opcode handling... ");
    let mut cpu = Cpu::new();
    cpu.load_program(&[0xFF]).unwrap();
    if cpu.run().is_err() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
