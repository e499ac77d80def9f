use miette::{miette, LabeledSpan, NamedSource, Report, Severity};

use crate::asm::{ParseError, ParseErrorKind};
use crate::computer::LoadError;
use crate::instr::DecodeError;
use crate::program::{LineError, LineErrorKind, LineErrors};
use crate::span::Span;
use crate::symbol::SymbolError;

/// Byte offset of the start of every line in `src`, matching `str::lines` numbering.
fn line_starts(src: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(src.match_indices('\n').map(|(idx, _)| idx + 1));
    starts
}

/// Span of a whole line, without its line ending.
fn whole_line(src: &str, start: usize) -> Span {
    let line = src[start..].lines().next().unwrap_or("");
    Span::from_range(start..start + line.len())
}

/// One diagnostic per failing line of `src`.
pub fn line_errors(errors: LineErrors, name: &str, src: &str) -> Vec<Report> {
    let starts = line_starts(src);
    errors
        .into_iter()
        .map(|err| {
            let start = starts.get(err.line).copied().unwrap_or(src.len());
            line_error(err, start, src).with_source_code(NamedSource::new(name, src.to_string()))
        })
        .collect()
}

fn line_error(err: LineError, start: usize, src: &str) -> Report {
    match err.kind {
        LineErrorKind::Parse(e) => parse_error(e, start),
        LineErrorKind::Decode(e) => decode_error(e, whole_line(src, start)),
        LineErrorKind::NotBinary(text) => miette!(
            severity = Severity::Error,
            code = "decode::not_binary",
            help = "every line of a .hack file must be exactly 16 characters of 0 or 1",
            labels = vec![LabeledSpan::at(whole_line(src, start), "not a binary word")],
            "Encountered a malformed binary word: '{text}'",
        ),
    }
}

fn parse_error(e: ParseError, line_start: usize) -> Report {
    let span = e.span.shifted(line_start);
    let (code, help, label) = match &e.kind {
        ParseErrorKind::NotAnInstruction(_) => (
            "parse::not_instruction",
            "blank lines and labels carry no instruction",
            "not an instruction",
        ),
        ParseErrorKind::MissingOperand => (
            "parse::a_operand",
            "write a number like @42 or a symbol like @LOOP",
            "missing operand",
        ),
        ParseErrorKind::LiteralOutOfRange(_) => (
            "parse::bad_lit",
            "A-instruction constants range from 0 to 32,767",
            "literal out of range",
        ),
        ParseErrorKind::MalformedLiteral(_) => (
            "parse::bad_lit",
            "symbols may not start with a digit",
            "malformed literal",
        ),
        ParseErrorKind::UnclosedLabel => (
            "parse::label",
            "label definitions look like (NAME)",
            "unclosed label",
        ),
        ParseErrorKind::Symbol(sym) => match sym {
            SymbolError::AlreadyBound { .. } => (
                "symbol::duplicate",
                "labels and predefined symbols can only be bound once",
                "already bound",
            ),
            SymbolError::InvalidName { .. } => (
                "symbol::name",
                "symbols use letters, digits, '_', '.', '$' and ':', and do not start with a digit",
                "invalid symbol",
            ),
            SymbolError::AddressOutOfRange { .. } => (
                "symbol::rom_overflow",
                "the program is too long for labels to be addressed",
                "label past end of ROM",
            ),
            SymbolError::AddressSpaceExhausted { .. } => (
                "symbol::ram_overflow",
                "too many variables for the address space",
                "no address left",
            ),
        },
        ParseErrorKind::UnknownComp(_) => (
            "parse::comp",
            "check the list of computations, e.g. D+1, M-D, D|A",
            "unknown computation",
        ),
        ParseErrorKind::UnknownDest(_) => (
            "parse::dest",
            "destinations are combinations of A, D and M, e.g. AM",
            "unknown destination",
        ),
        ParseErrorKind::UnknownJump(_) => (
            "parse::jump",
            "jumps are JGT, JEQ, JGE, JLT, JNE, JLE or JMP",
            "unknown jump",
        ),
    };
    miette!(
        severity = Severity::Error,
        code = code,
        help = help,
        labels = vec![LabeledSpan::at(span, label)],
        "{}",
        e.kind,
    )
}

fn decode_error(e: DecodeError, span: Span) -> Report {
    miette!(
        severity = Severity::Error,
        code = "decode::malformed_c",
        help = "C-instructions must start with the bits 111",
        labels = vec![LabeledSpan::at(span, "malformed instruction")],
        "{e}",
    )
}

pub fn load_error(e: LoadError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::rom",
        help = "split the program or remove unused code",
        "{e}",
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::Program;

    #[test]
    fn line_starts_follow_lines() {
        let src = "@1\n  D=Q\r\n@2";
        let starts = line_starts(src);
        assert_eq!(starts, vec![0, 3, 10]);
        assert_eq!(whole_line(src, 3).as_range(), 3..8);
    }

    #[test]
    fn one_report_per_line() {
        let src = "@1\nD=Q\n@99999\n";
        let lines: Vec<&str> = src.lines().collect();
        let errors = Program::from_assembly_array(&lines).unwrap_err();
        let reports = line_errors(errors, "test.asm", src);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].to_string(), "unknown computation 'Q'");
        let code = reports[1].code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("parse::bad_lit"));
    }
}
