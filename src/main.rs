use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use hack::memory::Region;
use hack::output::{file_message, message, MsgColor};
use hack::{Computer, Program, SymbolTable};

/// Hack is an assembler, disassembler and cycle-accurate simulator for the Hack computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` or `.hack` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a text `.asm` or binary `.hack` file and print the requested memory
    Run {
        /// `.asm` or `.hack` file to run
        name: PathBuf,
        /// Stop after this many clock ticks, even if the program has not halted
        #[arg(short, long)]
        ticks: Option<usize>,
        /// Preset a memory word before running, as `ADDRESS=VALUE`
        #[arg(short, long = "set", value_parser = parse_preset)]
        set: Vec<(u16, u16)>,
        /// Print memory words after running, as `ADDRESS` or `START..END`
        #[arg(short, long, value_parser = parse_range)]
        dump: Vec<(u16, u16)>,
        /// Print CPU state on every tick
        #[arg(long)]
        trace: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Create a `.hack` file from a `.asm` file
    Assemble {
        /// `.asm` file to assemble
        name: PathBuf,
        /// Destination to output `.hack` file
        dest: Option<PathBuf>,
    },
    /// Print a `.hack` file as assembly
    Disassemble {
        /// `.hack` file to disassemble
        name: PathBuf,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    hack::env::init();

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(&path, RunOptions::default());
        }
        println!("\n~ hack v{VERSION} ~");
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Run {
            name,
            ticks,
            set,
            dump,
            trace,
            minimal,
        } => run(
            &name,
            RunOptions {
                ticks,
                presets: set,
                dumps: dump,
                trace,
                minimal,
            },
        ),
        Command::Assemble { name, dest } => {
            file_message(MsgColor::Green, "Assembling", &name);
            let (program, _) = assemble(&name)?;
            let dest = dest.unwrap_or_else(|| name.with_extension("hack"));
            fs::write(&dest, program.to_hack_text()).into_diagnostic()?;
            message(
                MsgColor::Green,
                "Finished",
                format!("emit {} instructions", program.len()),
            );
            file_message(MsgColor::Green, "Saved", &dest);
            Ok(())
        }
        Command::Disassemble { name } => {
            let program = load_hack(&name)?;
            for line in program.to_assembly_array(&SymbolTable::new()) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Check { name } => {
            file_message(MsgColor::Green, "Checking", &name);
            assemble(&name)?;
            message(MsgColor::Green, "Success", "no errors found!");
            Ok(())
        }
    }
}

#[derive(Default)]
struct RunOptions {
    ticks: Option<usize>,
    presets: Vec<(u16, u16)>,
    dumps: Vec<(u16, u16)>,
    trace: bool,
    minimal: bool,
}

fn run(name: &Path, opts: RunOptions) -> Result<()> {
    hack::output::set_minimal(opts.minimal);
    file_message(MsgColor::Green, "Loading", name);

    let (program, symbols) = match name.extension().and_then(|ext| ext.to_str()) {
        Some("asm") => assemble(name)?,
        Some("hack") => (load_hack(name)?, SymbolTable::new()),
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    };

    let mut computer = Computer::from_program(&program).map_err(hack::error::load_error)?;
    for (address, value) in &opts.presets {
        computer.memory_mut().poke(*address, *value);
    }

    let max_ticks = opts.ticks.unwrap_or_else(hack::env::max_ticks);
    let trace = opts.trace || hack::env::is_trace_enabled();

    message(MsgColor::Green, "Running", format!("up to {max_ticks} ticks"));
    let mut halted = None;
    for tick in 1..=max_ticks {
        let out = computer.tick(false);
        if trace {
            hack::output::trace(tick, &out, &computer, &symbols);
        }
        if computer.is_halted(&out) {
            halted = Some(tick);
            break;
        }
    }
    match halted {
        Some(ticks) => message(MsgColor::Cyan, "Halted", format!("after {ticks} ticks")),
        None => message(MsgColor::Cyan, "Stopped", format!("after {max_ticks} ticks")),
    }

    for &(start, end) in &opts.dumps {
        for address in start..end {
            let value = computer.memory().peek(address);
            match Region::of(address) {
                Region::Void => println!("[{address}] = {value}"),
                region => println!("{region} = {}", value as i16),
            }
        }
    }

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

/// Assemble a source file, reporting every bad line.
fn assemble(name: &Path) -> Result<(Program, SymbolTable)> {
    let src = fs::read_to_string(name).into_diagnostic()?;
    let lines: Vec<&str> = src.lines().collect();
    Program::from_assembly_array(&lines).or_else(|errors| {
        report_all(hack::error::line_errors(errors, &name.to_string_lossy(), &src))
    })
}

fn load_hack(name: &Path) -> Result<Program> {
    let src = fs::read_to_string(name).into_diagnostic()?;
    Program::from_hack_text(&src).or_else(|errors| {
        report_all(hack::error::line_errors(errors, &name.to_string_lossy(), &src))
    })
}

/// Print all but the last report, and fail with the last.
fn report_all<T>(mut reports: Vec<miette::Report>) -> Result<T> {
    let last = reports.pop();
    for report in reports {
        eprintln!("{report:?}");
    }
    match last {
        Some(report) => Err(report),
        None => bail!("{}", "Unknown failure".red()),
    }
}

fn parse_number(s: &str) -> std::result::Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => match s.strip_prefix('-') {
            Some(_) => s.parse::<i16>().map(|v| v as u16).map_err(|e| e.to_string()),
            None => s.parse::<u16>().map_err(|e| e.to_string()),
        },
    };
    parsed.map_err(|e| format!("'{s}': {e}"))
}

fn parse_preset(s: &str) -> std::result::Result<(u16, u16), String> {
    let (address, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=VALUE, found '{s}'"))?;
    Ok((parse_number(address)?, parse_number(value)?))
}

/// `START..END` (exclusive) or a single address.
fn parse_range(s: &str) -> std::result::Result<(u16, u16), String> {
    match s.split_once("..") {
        Some((start, end)) => {
            let (start, end) = (parse_number(start)?, parse_number(end)?);
            if start > end {
                return Err(format!("range {start}..{end} is backwards"));
            }
            Ok((start, end))
        }
        None => {
            let address = parse_number(s)?;
            Ok((address, address.saturating_add(1)))
        }
    }
}

const SHORT_INFO: &str = r"
Welcome to hack, an assembler and cycle-accurate simulator for the 16-bit Hack computer.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
