use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use mcs51::Machine;

mod console;
use console::{Dump, Reply};

/// MCS-51 console, runner, and disassembler
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Reads hex-encoded instructions from stdin and executes them
    Repl,

    /// Loads a program image and runs it from address 0
    Run {
        /// Program image to load
        rom: PathBuf,

        /// Maximum number of instructions to execute
        #[clap(long)]
        steps: Option<usize>,

        /// Print machine state when the run ends
        #[clap(long)]
        dump: bool,
    },

    /// Prints a listing of a program image
    Disasm {
        /// Program image to disassemble
        rom: PathBuf,
    },
}

fn load(path: &Path) -> Result<Machine> {
    let rom = std::fs::read(path)
        .with_context(|| format!("failed to read {path:?}"))?;
    let mut m = Machine::new();
    m.load(&rom)
        .with_context(|| format!("failed to load {path:?}"))?;
    Ok(m)
}

fn repl() -> Result<()> {
    let mut m = Machine::new();

    // Blocking loop, listening to the stdin reader thread
    let rx = console::worker(std::io::BufReader::new(std::io::stdin()));
    while let Ok(line) = rx.recv() {
        match console::handle(&mut m, &line) {
            Ok(Reply::Nothing) => (),
            Ok(Reply::Quit) => break,
            Ok(Reply::Dump) => println!("{}", Dump(&m)),
            Ok(Reply::Fault(e)) => {
                error!("{:#}", anyhow::Error::from(e));
                println!("{}", Dump(&m));
            }
            Err(e) => error!("{e:#}"),
        }
    }
    Ok(())
}

fn run(rom: &Path, steps: Option<usize>, dump: bool) -> Result<()> {
    let mut m = load(rom)?;
    m.reset();

    let start = std::time::Instant::now();
    let r = m.run(steps.unwrap_or(usize::MAX));
    if let Ok(n) = &r {
        info!("executed {n} instructions in {:?}", start.elapsed());
    }
    if dump {
        println!("{}", Dump(&m));
    }
    r.with_context(|| format!("fault at {:#06x}", m.pc()))?;
    Ok(())
}

fn disasm(rom: &Path) -> Result<()> {
    let m = load(rom)?;
    for i in m.disassemble(0) {
        println!("{i}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("OSPREY_LOG", "info")
        .write_style_or("OSPREY_LOG", "always");
    env_logger::init_from_env(env);

    let args = Args::parse();
    match args.command {
        Mode::Repl => repl(),
        Mode::Run { rom, steps, dump } => run(&rom, steps, dump),
        Mode::Disasm { rom } => disasm(&rom),
    }
}
