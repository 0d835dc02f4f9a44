use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use env_logger::Env;

use orcvm::{loader, Machine, Result};

/// Runs an ORC bytecode program.
///
/// Exit codes: 0 on completion, 65 for a malformed program, 66 if the file cannot be read,
/// 70 for an invalid address or jump target, 71 if memory cannot be allocated, 74 if output
/// cannot be written.
#[derive(Parser, Debug)]
#[command(name = "orcvm", version)]
struct Cli {
  /// Path to the ORC program
  program: PathBuf,
}

fn run(path: &Path) -> Result<()> {
  let program = loader::load_file(path)?;

  let stdout = io::stdout();
  let stderr = io::stderr();
  let mut machine = Machine::new(program, stdout.lock(), stderr.lock())?;
  machine.run()
}

fn main() {
  env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
  let cli = Cli::parse();

  if let Err(error) = run(&cli.program) {
    eprintln!("{}", error);
    process::exit(error.exit_code());
  }
}
