// Instruction codec
pub mod asm;
pub mod instr;
pub mod program;
pub mod symbol;
pub use asm::{decode_assembly, to_assembly, ParseError};
pub use instr::{AInstruction, CInstruction, Comp, DecodeError, Dest, Instruction, Jump};
pub use program::{LineError, LineErrors, Program};
pub use symbol::SymbolTable;

// Hardware
pub mod alu;
pub mod computer;
pub mod cpu;
pub mod memory;
pub mod register;
pub use alu::{alu, AluControl, AluOutput};
pub use computer::{Computer, RunOutcome};
pub use cpu::{Cpu, CpuOutput};
pub use memory::Memory;
pub use register::{ProgramCounter, Register};

// Diagnostics and terminal output
pub mod error;
pub mod output;
pub mod span;

pub mod env;
