use crate::alu::{alu, AluControl};
use crate::instr::{Comp, Jump};
use crate::register::{ProgramCounter, Register};

/// Outputs of one CPU clock cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CpuOutput {
    /// Value to write to M.
    pub out_m: u16,
    /// Whether memory should store `out_m` at `address_m`.
    pub write_m: bool,
    /// Address of M, taken from A as it stood at the start of the cycle.
    pub address_m: u16,
    /// Address of the instruction executed this cycle.
    pub pc: u16,
}

/// The Hack central processing unit: A and D registers, the PC and the decode logic.
///
/// All next values are computed from the registers as they stood at the start of the tick,
/// then latched together.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Cpu {
    a: Register,
    d: Register,
    pc: ProgramCounter,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            a: Register::new(),
            d: Register::new(),
            pc: ProgramCounter::new(),
        }
    }

    /// Execute `instruction` with `in_m` as the current value of M.
    pub fn tick(&mut self, in_m: u16, instruction: u16, reset: bool) -> CpuOutput {
        let is_c = instruction & 0x8000 != 0;
        let (d1, d2, d3) = (
            instruction & 0b100_000 != 0,
            instruction & 0b010_000 != 0,
            instruction & 0b001_000 != 0,
        );
        let load_a = !is_c || d1;
        let load_d = is_c && d2;
        let write_m = is_c && d3;

        let a = self.a.peek();
        let d = self.d.peek();

        // An A-instruction stores nothing from the ALU, so it just passes D through.
        let comp = if is_c {
            Comp::from_bits((instruction >> 6) as u8)
        } else {
            Comp::D
        };
        let y = if comp.uses_m() { in_m } else { a };
        let res = alu(d, y, AluControl::from_bits(comp.bits()));

        let next_a = if is_c { res.out } else { instruction };
        let jump = is_c && Jump::from_bits(instruction as u8).taken(res.zr, res.ng);

        let address_m = self.a.tick(next_a, load_a);
        self.d.tick(res.out, load_d);
        let pc = self.pc.tick(a, jump, true, reset);

        CpuOutput {
            out_m: res.out,
            write_m,
            address_m: address_m & 0x7FFF,
            pc: pc & 0x7FFF,
        }
    }

    pub fn a(&self) -> u16 {
        self.a.peek()
    }

    pub fn d(&self) -> u16 {
        self.d.peek()
    }

    /// Address of the next instruction to fetch.
    pub fn pc(&self) -> u16 {
        self.pc.peek() & 0x7FFF
    }

    /// Clear both registers and the PC.
    pub fn reset(&mut self) {
        *self = Cpu::new();
    }
}
