//! Reads ORC programs from disk.

use std::fs;
use std::path::Path;

use log::debug;

use crate::bytecode::{parse_program, Program};
use crate::error::{Error, Result};

/**
  Reads the whole file and parses it. The file is closed before this function returns, whether
  or not the contents are a valid program, so execution never starts with the handle open.
*/
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Program> {
  let path = path.as_ref();
  let bytes = fs::read(path).map_err(|source| Error::File { path: path.to_path_buf(), source })?;

  let program = parse_program(&bytes)?;
  debug!(
    "Loaded {} instructions and {} memory cells from {}.",
    program.len(),
    program.memory_size,
    path.display()
  );
  Ok(program)
}
