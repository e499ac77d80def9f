use std::fmt;
use std::ops::Index;

use crate::asm::{self, Line, ParseError, ParseErrorKind};
use crate::instr::{DecodeError, Instruction};
use crate::symbol::SymbolTable;

/// An ordered list of instructions, as loaded into ROM.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Program {
    instrs: Vec<Instruction>,
}

/// Why a single line of a batch was rejected.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LineErrorKind {
    Parse(ParseError),
    Decode(DecodeError),
    /// `.hack` line that is not exactly sixteen `0`/`1` characters.
    NotBinary(String),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LineError {
    /// Zero-based index into the input.
    pub line: usize,
    pub kind: LineErrorKind,
}

/// Every rejected line of a batch, in input order. Never empty.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LineErrors(Vec<LineError>);

impl LineErrors {
    pub fn errors(&self) -> &[LineError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for LineErrors {
    type Item = LineError;
    type IntoIter = std::vec::IntoIter<LineError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::error::Error for LineErrors {}

impl fmt::Display for LineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
            Self::NotBinary(text) => write!(f, "'{text}' is not a 16-digit binary word"),
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line + 1, self.kind)
    }
}

impl fmt::Display for LineErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no errors"),
            [only] => only.fmt(f),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

/// Collects per-line failures while a batch keeps going.
#[derive(Default)]
struct Batch {
    errors: Vec<LineError>,
}

impl Batch {
    fn fail(&mut self, line: usize, kind: LineErrorKind) {
        self.errors.push(LineError { line, kind });
    }

    fn finish<T>(self, value: T) -> Result<T, LineErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(LineErrors(self.errors))
        }
    }
}

impl Program {
    pub fn new() -> Self {
        Program { instrs: Vec::new() }
    }

    pub fn from_instructions(instrs: Vec<Instruction>) -> Self {
        Program { instrs }
    }

    /// Assemble source lines against a fresh table of predefined symbols.
    pub fn from_assembly_array<S: AsRef<str>>(
        lines: &[S],
    ) -> Result<(Program, SymbolTable), LineErrors> {
        let mut symbols = SymbolTable::new();
        let program = Self::assemble(lines, &mut symbols)?;
        Ok((program, symbols))
    }

    /// Assemble source lines, binding labels and variables into `symbols`.
    ///
    /// First every `(LABEL)` is bound to the ROM address of the next instruction, then lines
    /// are decoded in order, so variables are numbered by first use and a variable can never
    /// shadow a label defined further down. Blank, comment and label lines are skipped.
    pub fn assemble<S: AsRef<str>>(
        lines: &[S],
        symbols: &mut SymbolTable,
    ) -> Result<Program, LineErrors> {
        let mut batch = Batch::default();

        let mut rom_addr = 0usize;
        for (idx, line) in lines.iter().enumerate() {
            match asm::classify(line.as_ref()) {
                Ok(Line::Blank) => {}
                Ok(Line::Label { name, span }) => {
                    if let Err(e) = symbols.bind_label(name, rom_addr) {
                        let err = ParseError {
                            kind: ParseErrorKind::Symbol(e),
                            span,
                        };
                        batch.fail(idx, LineErrorKind::Parse(err));
                    }
                }
                Ok(Line::Instruction { .. }) => rom_addr += 1,
                // Reported again by the second pass
                Err(_) => {}
            }
        }

        let mut instrs = Vec::with_capacity(rom_addr);
        for (idx, line) in lines.iter().enumerate() {
            match asm::decode_assembly(line.as_ref(), symbols) {
                Ok(instr) => instrs.push(instr),
                Err(e) if e.is_skip() => {}
                Err(e) => batch.fail(idx, LineErrorKind::Parse(e)),
            }
        }

        batch.errors.sort_by_key(|e| e.line);
        batch.finish(Program { instrs })
    }

    /// One line per instruction, A-instruction operands named through `symbols`.
    ///
    /// Re-assembling the output reproduces the same words if it is decoded against the same
    /// table, or against a fresh one when `symbols` holds only predefined symbols.
    pub fn to_assembly_array(&self, symbols: &SymbolTable) -> Vec<String> {
        self.instrs
            .iter()
            .map(|instr| asm::to_assembly(instr, symbols))
            .collect()
    }

    pub fn from_binary_array(words: &[u16]) -> Result<Program, LineErrors> {
        let mut batch = Batch::default();
        let mut instrs = Vec::with_capacity(words.len());
        for (idx, word) in words.iter().enumerate() {
            match Instruction::decode(*word) {
                Ok(instr) => instrs.push(instr),
                Err(e) => batch.fail(idx, LineErrorKind::Decode(e)),
            }
        }
        batch.finish(Program { instrs })
    }

    pub fn to_binary_array(&self) -> Vec<u16> {
        self.instrs.iter().map(|instr| instr.encode()).collect()
    }

    /// Read the `.hack` text format: one word per line, most significant bit first.
    /// Blank lines are ignored.
    pub fn from_hack_text(text: &str) -> Result<Program, LineErrors> {
        let mut batch = Batch::default();
        let mut instrs = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.len() != 16 || !line.bytes().all(|b| b == b'0' || b == b'1') {
                batch.fail(idx, LineErrorKind::NotBinary(line.into()));
                continue;
            }
            let word = match u16::from_str_radix(line, 2) {
                Ok(word) => word,
                Err(_) => {
                    batch.fail(idx, LineErrorKind::NotBinary(line.into()));
                    continue;
                }
            };
            match Instruction::decode(word) {
                Ok(instr) => instrs.push(instr),
                Err(e) => batch.fail(idx, LineErrorKind::Decode(e)),
            }
        }
        batch.finish(Program { instrs })
    }

    pub fn to_hack_text(&self) -> String {
        let mut out = String::with_capacity(self.instrs.len() * 17);
        for instr in &self.instrs {
            out.push_str(&format!("{:016b}\n", instr.encode()));
        }
        out
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instrs
    }

    pub fn get(&self, idx: usize) -> Option<&Instruction> {
        self.instrs.get(idx)
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instrs.iter()
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, idx: usize) -> &Instruction {
        &self.instrs[idx]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.iter()
    }
}

/// Numeric assembly, one instruction per line.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}
