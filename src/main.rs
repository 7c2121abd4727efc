use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::{info, Level, LevelFilter, Log, Metadata, Record};

use exp1::bytecode::{listing, parse_assembly};
use exp1::Machine;

#[derive(Parser, Debug)]
#[command(name = "exp1", about = "Assemble and run programs for the exp1 bytecode machine.")]
struct Args {
  /// Raise log verbosity (-v info, -vv debug, -vvv trace every instruction).
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Assemble a program and run it.
  Run {
    /// Assembly source file.
    #[arg(value_name = "FILE")]
    source: PathBuf,

    /// Print the data memory after the machine halts.
    #[arg(long, default_value_t = false)]
    dump: bool,
  },

  /// Assemble a program and print its listing.
  Listing {
    /// Assembly source file.
    #[arg(value_name = "FILE")]
    source: PathBuf,
  },
}

/// Writes log records to stderr.
struct StderrLogger {
  level: Level,
}

impl Log for StderrLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= self.level
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      eprintln!("[{:<5}] {}", record.level(), record.args());
    }
  }

  fn flush(&self) {}
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => Level::Warn,
    1 => Level::Info,
    2 => Level::Debug,
    _ => Level::Trace,
  };
  let logger: &'static StderrLogger = Box::leak(Box::new(StderrLogger { level }));
  if log::set_logger(logger).is_ok() {
    log::set_max_level(level.to_level_filter());
  } else {
    log::set_max_level(LevelFilter::Off);
  }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
  match args.command {

    Command::Run { source, dump } => {
      let text = fs::read_to_string(&source)?;
      let mut program = parse_assembly(&text)?;
      info!(
        "assembled {} instructions and {} cells of memory from {}",
        program.code.len(), program.memory.len(), source.display()
      );

      let outcome = program.run();
      if dump {
        println!("{}", Machine::memory_table(&program.memory));
      }
      println!("exit value: {}", outcome?);
    }

    Command::Listing { source } => {
      let text = fs::read_to_string(&source)?;
      let program = parse_assembly(&text)?;
      print!("{}", listing(&program.code, &program.symbols));
    }

  }
  Ok(())
}

fn main() {
  let args = Args::parse();
  init_logging(args.verbose);

  if let Err(err) = run(args) {
    eprintln!("{}", err);
    std::process::exit(1);
  }
}
