use std::fmt;

use crate::cpu::{Cpu, CpuOutput};
use crate::memory::{Memory, Screen, ADDRESS_MASK};
use crate::program::Program;

/// Instruction memory holds 32K words.
pub const ROM_SIZE: usize = 0x8000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadError {
    /// Program is longer than the ROM.
    TooLarge { len: usize },
}

impl std::error::Error for LoadError {}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { len } => write!(
                f,
                "program has {len} instructions, but ROM only holds {ROM_SIZE}"
            ),
        }
    }
}

/// Read-only instruction memory. Unused words read as `@0`.
#[derive(Clone)]
pub struct Rom {
    words: Box<[u16; ROM_SIZE]>,
    len: usize,
}

impl Rom {
    pub fn new() -> Self {
        Rom {
            words: Box::new([0; ROM_SIZE]),
            len: 0,
        }
    }

    /// Replace the whole contents. Words past the program are cleared.
    fn load(&mut self, words: &[u16]) -> Result<(), LoadError> {
        if words.len() > ROM_SIZE {
            return Err(LoadError::TooLarge { len: words.len() });
        }
        self.words[..words.len()].copy_from_slice(words);
        self.words[words.len()..].fill(0);
        self.len = words.len();
        Ok(())
    }

    pub fn fetch(&self, address: u16) -> u16 {
        self.words[(address & ADDRESS_MASK) as usize]
    }

    /// Length of the loaded program.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Rom {
    fn default() -> Self {
        Self::new()
    }
}

/// How a bounded run ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunOutcome {
    /// Reached a loop that can never make progress, after `ticks` ticks.
    Halted { ticks: usize },
    /// Tick budget used up.
    OutOfTicks,
}

/// CPU, ROM and data memory wired together.
#[derive(Clone, Default)]
pub struct Computer {
    cpu: Cpu,
    rom: Rom,
    memory: Memory,
}

impl Computer {
    pub fn new() -> Self {
        Computer {
            cpu: Cpu::new(),
            rom: Rom::new(),
            memory: Memory::new(),
        }
    }

    pub fn from_program(program: &Program) -> Result<Self, LoadError> {
        let mut computer = Computer::new();
        computer.load_program(&program.to_binary_array())?;
        Ok(computer)
    }

    /// Fill the ROM. Meant to be called once, before the first tick.
    pub fn load_program(&mut self, words: &[u16]) -> Result<(), LoadError> {
        self.rom.load(words)
    }

    /// One clock cycle: fetch at PC, read M at A, execute, then commit the memory write.
    pub fn tick(&mut self, reset: bool) -> CpuOutput {
        let instruction = self.rom.fetch(self.cpu.pc());
        let in_m = self.memory.peek(self.cpu.a() & ADDRESS_MASK);
        let out = self.cpu.tick(in_m, instruction, reset);
        self.memory.tick(out.out_m, out.address_m, out.write_m);
        out
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick(false);
        }
    }

    /// Tick until the program parks itself in a halt loop, for at most `max_ticks` ticks.
    pub fn run_until_halt(&mut self, max_ticks: usize) -> RunOutcome {
        for ticks in 1..=max_ticks {
            let out = self.tick(false);
            if self.is_halted(&out) {
                return RunOutcome::Halted { ticks };
            }
        }
        RunOutcome::OutOfTicks
    }

    /// Whether the tick that produced `out` jumped into a loop with no side effects:
    /// a jump to itself, or the `(END) @END 0;JMP` idiom.
    pub fn is_halted(&self, out: &CpuOutput) -> bool {
        let executed = out.pc;
        let instr = self.rom.fetch(executed);
        // Only a C-instruction with no destination leaves the state untouched
        if instr & 0x8000 == 0 || instr & 0b111_000 != 0 {
            return false;
        }
        let next = self.cpu.pc();
        next == executed || (next.wrapping_add(1) == executed && self.rom.fetch(next) == next)
    }

    /// Clear CPU and data memory. The ROM keeps its program.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory = Memory::new();
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn screen(&self) -> &Screen {
        self.memory.screen()
    }

    /// Press a key (0 releases it).
    pub fn set_key(&mut self, key: u16) {
        self.memory.keyboard_mut().set_key(key);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assemble(src: &str) -> Computer {
        let lines: Vec<&str> = src.lines().collect();
        let (program, _) = Program::from_assembly_array(&lines).unwrap();
        Computer::from_program(&program).unwrap()
    }

    #[test]
    fn add_program() {
        let mut computer = assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D");
        computer.run(6);
        assert_eq!(computer.memory().peek(0), 5);
    }

    #[test]
    fn write_lands_on_the_final_tick() {
        let mut computer = assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D");
        computer.run(5);
        assert_eq!(computer.memory().peek(0), 0);
        computer.tick(false);
        assert_eq!(computer.memory().peek(0), 5);
    }

    #[test]
    fn in_m_reads_pre_tick_address() {
        // AM=M+1 reads RAM[5], writes RAM[5] (the old A), then A becomes 8
        let mut computer = assemble("@5\nAM=M+1");
        computer.memory_mut().poke(5, 7);
        computer.run(2);
        assert_eq!(computer.memory().peek(5), 8);
        assert_eq!(computer.memory().peek(8), 0);
        assert_eq!(computer.cpu().a(), 8);
    }

    #[test]
    fn reset_tick_restarts_program() {
        let mut computer = assemble("@1\nD=A\n@10\nM=D");
        computer.run(2);
        let out = computer.tick(true);
        assert_eq!(out.pc, 2);
        assert_eq!(computer.cpu().pc(), 0);
    }

    #[test]
    fn reset_keeps_rom() {
        let mut computer = assemble("@7\nD=A\n@0\nM=D");
        computer.run(4);
        assert_eq!(computer.memory().peek(0), 7);
        computer.reset();
        assert_eq!(computer.memory().peek(0), 0);
        assert_eq!(computer.cpu().pc(), 0);
        assert_eq!(computer.rom().len(), 4);
        computer.run(4);
        assert_eq!(computer.memory().peek(0), 7);
    }

    #[test]
    fn keyboard_is_visible_to_programs() {
        let mut computer = assemble("@KBD\nD=M\n@0\nM=D");
        computer.set_key(65);
        computer.run(4);
        assert_eq!(computer.memory().peek(0), 65);
    }

    #[test]
    fn screen_writes() {
        let mut computer = assemble("@SCREEN\nM=-1");
        computer.run(2);
        assert_eq!(computer.screen().peek(0), 0xFFFF);
        assert!(computer.screen().pixel(0, 15));
        assert!(!computer.screen().pixel(0, 16));
    }

    #[test]
    fn halts_on_end_loop() {
        let mut computer = assemble("@1\nD=A\n(END)\n@END\n0;JMP");
        assert_eq!(computer.run_until_halt(100), RunOutcome::Halted { ticks: 4 });
    }

    #[test]
    fn self_jump_halts() {
        let mut computer = assemble("@1\n0;JMP");
        assert_eq!(computer.run_until_halt(100), RunOutcome::Halted { ticks: 2 });
    }

    #[test]
    fn busy_loop_runs_out() {
        let mut computer = assemble("(LOOP)\n@i\nM=M+1\n@LOOP\n0;JMP");
        assert_eq!(computer.run_until_halt(50), RunOutcome::OutOfTicks);
        assert!(computer.memory().peek(16) > 0);
    }

    #[test]
    fn oversized_program() {
        let mut computer = Computer::new();
        let words = vec![0; ROM_SIZE + 1];
        assert_eq!(
            computer.load_program(&words),
            Err(LoadError::TooLarge { len: ROM_SIZE + 1 })
        );
    }

    #[test]
    fn independent_computers() {
        let mut first = assemble("@3\nD=A\n@0\nM=D");
        let second = assemble("@3\nD=A\n@0\nM=D");
        first.run(4);
        assert_eq!(first.memory().peek(0), 3);
        assert_eq!(second.memory().peek(0), 0);
    }
}
