use std::cell::RefCell;
use std::fmt::Display;
use std::path::Path;

use colored::{ColoredString, Colorize};

use crate::asm::to_assembly;
use crate::computer::Computer;
use crate::cpu::CpuOutput;
use crate::instr::Instruction;
use crate::symbol::SymbolTable;

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Suppress status messages. Returns the previous setting.
pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

#[allow(unused)]
#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

impl MsgColor {
    fn paint(self, text: &str) -> ColoredString {
        match self {
            MsgColor::Green => text.green(),
            MsgColor::Cyan => text.cyan(),
            MsgColor::Red => text.red(),
        }
    }
}

/// Status line: right-aligned coloured verb, then detail.
pub fn message(color: MsgColor, left: &str, right: impl Display) {
    if is_minimal() {
        return;
    }
    println!("{:>12} {right}", color.paint(left).bold());
}

pub fn file_message(color: MsgColor, left: &str, path: &Path) {
    message(color, left, format!("target {}", path.display()));
}

/// One line of the per-tick trace, on stderr.
pub fn trace(tick: usize, out: &CpuOutput, computer: &Computer, symbols: &SymbolTable) {
    let word = computer.rom().fetch(out.pc);
    let text = match Instruction::decode(word) {
        Ok(instr) => to_assembly(&instr, symbols),
        Err(_) => format!("{word:#06x}?"),
    };
    let cpu = computer.cpu();
    let write = if out.write_m {
        let text = format!("M[{}] <- {}", out.address_m, out.out_m as i16);
        text.as_str().yellow().to_string()
    } else {
        String::new()
    };
    eprintln!(
        "{} {:>5} {:<16} A={:<6} D={:<6} {write}",
        format!("{tick:>8}").as_str().dimmed(),
        out.pc.to_string().as_str().cyan(),
        text,
        cpu.a() as i16,
        cpu.d() as i16,
    );
}
