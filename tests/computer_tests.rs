use std::fs;
use std::path::Path;

use hack::computer::RunOutcome;
use hack::memory::{KBD_ADDR, SCREEN_BASE};
use hack::{Computer, Program, SymbolTable};

fn load(path: impl AsRef<Path>) -> (Program, SymbolTable) {
    let src = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = src.lines().collect();
    Program::from_assembly_array(&lines).unwrap()
}

fn computer(path: &str) -> Computer {
    let (program, _) = load(path);
    Computer::from_program(&program).unwrap()
}

#[test]
fn mult() {
    for (x, y) in [(6u16, 7u16), (0, 9), (9, 0), (1, 1), (12, 11)] {
        let mut computer = computer("tests/files/mult.asm");
        computer.memory_mut().poke(0, x);
        computer.memory_mut().poke(1, y);
        computer.run(20 + 14 * x as usize);
        assert_eq!(computer.memory().peek(2), x * y, "{x} * {y}");
    }
}

#[test]
fn mult_symbols() {
    let (_, symbols) = load("tests/files/mult.asm");
    assert_eq!(symbols.get("LOOP"), Some(4));
    assert_eq!(symbols.get("END"), Some(18));
    assert_eq!(symbols.get("sum"), Some(16));
    assert_eq!(symbols.get("i"), Some(17));
}

#[test]
fn add_takes_six_ticks() {
    let mut computer = computer("tests/files/add.asm");
    computer.run(6);
    assert_eq!(computer.memory().peek(0), 5);
    assert_eq!(computer.cpu().pc(), 6);
}

#[test]
fn max_halts() {
    for (x, y, expected) in [(3i16, -9i16, 3i16), (-4, 10, 10), (7, 7, 7)] {
        let mut computer = computer("tests/files/max.asm");
        computer.memory_mut().poke(0, x as u16);
        computer.memory_mut().poke(1, y as u16);
        let outcome = computer.run_until_halt(1_000);
        assert!(matches!(outcome, RunOutcome::Halted { .. }), "{outcome:?}");
        assert_eq!(computer.memory().peek(2) as i16, expected);
    }
}

#[test]
fn fill_follows_keyboard() {
    let mut computer = computer("tests/files/fill.asm");
    assert_eq!(computer.run_until_halt(2_000), RunOutcome::OutOfTicks);
    for word in 0..32 {
        assert_eq!(computer.memory().peek(SCREEN_BASE + word), 0);
    }

    computer.set_key(b'k' as u16);
    assert_eq!(computer.memory().peek(KBD_ADDR), b'k' as u16);
    computer.run(2_000);
    for word in 0..32 {
        assert_eq!(computer.memory().peek(SCREEN_BASE + word), 0xFFFF);
    }
    assert_eq!(computer.memory().peek(SCREEN_BASE + 32), 0);
    assert!(computer.screen().pixel(0, 511));
    assert!(!computer.screen().pixel(1, 0));

    computer.set_key(0);
    computer.run(2_000);
    for word in 0..32 {
        assert_eq!(computer.memory().peek(SCREEN_BASE + word), 0);
    }
}

#[test]
fn fill_variables_skip_labels() {
    let (_, symbols) = load("tests/files/fill.asm");
    let labels = [symbols.get("WHITE"), symbols.get("DRAW")];
    for var in ["addr", "n", "colour"] {
        let address = symbols.get(var);
        assert!(address.is_some());
        assert!(!labels.contains(&address), "{var} collides with a label");
    }
}

#[test]
fn reassembles_every_file() {
    for path in glob::glob("tests/files/*.asm").unwrap() {
        let path = path.unwrap();
        let (program, _) = load(&path);

        let text = program.to_hack_text();
        let binary = Program::from_hack_text(&text).unwrap();
        assert_eq!(binary, program, "{}", path.display());

        let asm = binary.to_assembly_array(&SymbolTable::new());
        let (again, _) = Program::from_assembly_array(&asm).unwrap();
        assert_eq!(
            again.to_binary_array(),
            program.to_binary_array(),
            "{}",
            path.display()
        );
    }
}

#[test]
fn reset_reruns_program() {
    let mut computer = computer("tests/files/add.asm");
    computer.run(6);
    computer.reset();
    assert_eq!(computer.memory().peek(0), 0);
    computer.run(6);
    assert_eq!(computer.memory().peek(0), 5);
}
