//! Conversion between single lines of Hack assembly and [`Instruction`]s.
//!
//! Lines are handed over one at a time. `//` starts a comment; blank lines and label
//! definitions are reported as [`ParseErrorKind::NotAnInstruction`] so that batch
//! conversions can skip them.

use std::fmt;

use crate::instr::{AInstruction, CInstruction, Comp, Dest, Instruction, Jump, MAX_CONSTANT};
use crate::span::Span;
use crate::symbol::{is_valid_name, SymbolError, SymbolTable};

/// A line that carries no instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NonInstruction {
    /// Empty, whitespace or comment only.
    Blank,
    /// `(NAME)`
    Label(String),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParseErrorKind {
    /// Not a failure: the line should simply be skipped.
    NotAnInstruction(NonInstruction),
    /// `@` with nothing after it.
    MissingOperand,
    /// Numeric A-instruction operand above 32767.
    LiteralOutOfRange(String),
    /// Starts like a number but is not one.
    MalformedLiteral(String),
    /// `(NAME` without the closing parenthesis.
    UnclosedLabel,
    Symbol(SymbolError),
    UnknownComp(String),
    UnknownDest(String),
    UnknownJump(String),
}

/// Failure to read one line of assembly.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Offending part of the line, relative to the line as passed in.
    pub span: Span,
}

impl ParseError {
    fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }

    /// Whether this is the distinguished "skip this line" outcome rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self.kind, ParseErrorKind::NotAnInstruction(_))
    }
}

impl std::error::Error for ParseError {}

impl fmt::Display for NonInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => write!(f, "blank line"),
            Self::Label(name) => write!(f, "label definition '{name}'"),
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnInstruction(line) => write!(f, "not an instruction: {line}"),
            Self::MissingOperand => write!(f, "expected a number or symbol after '@'"),
            Self::LiteralOutOfRange(lit) => {
                write!(f, "literal {lit} does not fit in 15 bits (0 to {MAX_CONSTANT})")
            }
            Self::MalformedLiteral(lit) => write!(f, "'{lit}' is neither a number nor a symbol"),
            Self::UnclosedLabel => write!(f, "label definition is missing ')'"),
            Self::Symbol(e) => e.fmt(f),
            Self::UnknownComp(comp) => write!(f, "unknown computation '{comp}'"),
            Self::UnknownDest(dest) => write!(f, "unknown destination '{dest}'"),
            Self::UnknownJump(jump) => write!(f, "unknown jump '{jump}'"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// What a single source line holds, once comments and surrounding whitespace are gone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Line<'a> {
    Blank,
    Label { name: &'a str, span: Span },
    /// Trimmed instruction text, starting `offset` bytes into the line.
    Instruction { text: &'a str, offset: usize },
}

/// Strip the comment and whitespace from `line` and say what is left.
///
/// Label names are validated here so that a pre-scan can bind them.
pub fn classify(line: &str) -> Result<Line<'_>, ParseError> {
    let code = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let text = code.trim();
    if text.is_empty() {
        return Ok(Line::Blank);
    }
    let offset = code.len() - code.trim_start().len();
    let whole = Span::from_range(offset..offset + text.len());

    let Some(inner) = text.strip_prefix('(') else {
        return Ok(Line::Instruction { text, offset });
    };
    let Some(inner) = inner.strip_suffix(')') else {
        return Err(ParseError::new(ParseErrorKind::UnclosedLabel, whole));
    };
    let name = inner.trim();
    if !is_valid_name(name) {
        return Err(ParseError::new(
            ParseErrorKind::Symbol(SymbolError::InvalidName { name: name.into() }),
            whole,
        ));
    }
    Ok(Line::Label { name, span: whole })
}

/// Decode one line of assembly, binding new variables in `symbols`.
///
/// Symbols not yet in the table become variables; labels must already be bound.
pub fn decode_assembly(line: &str, symbols: &mut SymbolTable) -> Result<Instruction, ParseError> {
    match classify(line)? {
        Line::Blank => Err(ParseError::new(
            ParseErrorKind::NotAnInstruction(NonInstruction::Blank),
            Span::default(),
        )),
        Line::Label { name, span } => Err(ParseError::new(
            ParseErrorKind::NotAnInstruction(NonInstruction::Label(name.into())),
            span,
        )),
        Line::Instruction { text, offset } => match text.strip_prefix('@') {
            Some(operand) => parse_a(operand, offset + 1, symbols),
            None => parse_c(text, offset),
        },
    }
}

fn parse_a(operand: &str, offset: usize, symbols: &mut SymbolTable) -> Result<Instruction, ParseError> {
    let lead = operand.len() - operand.trim_start().len();
    let operand = operand.trim();
    let offset = offset + lead;
    let span = Span::from_range(offset..offset + operand.len());

    if operand.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingOperand, span));
    }
    let value = if operand.starts_with(|c: char| c.is_ascii_digit()) {
        if !operand.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::new(
                ParseErrorKind::MalformedLiteral(operand.into()),
                span,
            ));
        }
        operand
            .parse::<u32>()
            .ok()
            .and_then(|val| u16::try_from(val).ok())
            .filter(|val| *val <= MAX_CONSTANT)
            .ok_or_else(|| {
                ParseError::new(ParseErrorKind::LiteralOutOfRange(operand.into()), span)
            })?
    } else {
        symbols
            .resolve(operand)
            .map_err(|e| ParseError::new(ParseErrorKind::Symbol(e), span))?
    };
    // Every path above keeps `value` within 15 bits
    let a = AInstruction::new(value)
        .ok_or_else(|| ParseError::new(ParseErrorKind::LiteralOutOfRange(operand.into()), span))?;
    Ok(Instruction::A(a))
}

/// Remove interior whitespace from one field of a C-instruction.
fn squash(part: &str) -> String {
    part.split_whitespace().collect()
}

fn parse_c(text: &str, offset: usize) -> Result<Instruction, ParseError> {
    let (dest, rest, rest_offs) = match text.find('=') {
        Some(idx) => (Some(&text[..idx]), &text[idx + 1..], offset + idx + 1),
        None => (None, text, offset),
    };
    let (comp, jump) = match rest.find(';') {
        Some(idx) => (&rest[..idx], Some((&rest[idx + 1..], rest_offs + idx + 1))),
        None => (rest, None),
    };

    let dest = match dest {
        Some(part) => {
            let name = squash(part);
            Dest::from_mnemonic(&name).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::UnknownDest(name),
                    Span::from_range(offset..offset + part.len()),
                )
            })?
        }
        None => Dest::NONE,
    };

    let name = squash(comp);
    let comp = Comp::from_mnemonic(&name).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::UnknownComp(name),
            Span::from_range(rest_offs..rest_offs + comp.len()),
        )
    })?;

    let jump = match jump {
        Some((part, offs)) => {
            let name = squash(part);
            Jump::from_mnemonic(&name).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::UnknownJump(name),
                    Span::from_range(offs..offs + part.len()),
                )
            })?
        }
        None => Jump::Never,
    };

    Ok(Instruction::C(CInstruction::new(comp, dest, jump)))
}

/// Render `instr` as assembly, naming A-instruction operands through `symbols` where an
/// address has a symbol bound to it.
pub fn to_assembly(instr: &Instruction, symbols: &SymbolTable) -> String {
    match instr {
        Instruction::A(a) => match symbols.name_of(a.value()) {
            Some(name) => format!("@{name}"),
            None => a.to_string(),
        },
        Instruction::C(c) => c.to_string(),
    }
}
