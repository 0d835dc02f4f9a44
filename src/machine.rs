//! Structures and functions for the ORC virtual machine: the fetch-decode-execute loop and the
//! semantics of each instruction.

use std::fmt::{Display, Formatter};
use std::io::Write;
use std::thread;
use std::time::Duration;

use log::{debug, trace};
use prettytable::{format as TableFormat, Table};

use crate::address::{Address, AddressNumberType};
use crate::bytecode::*;
use crate::error::{Error, Result};
use crate::memory::{Cell, Memory};

/// Where control goes after an instruction has executed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Flow {
  /// Continue with the following instruction.
  Next,
  /// Skip the following instruction.
  Skip,
  /// Continue at the given instruction index, which has already been range checked.
  Jump(AddressNumberType)
}

/**
  The machine owns the memory and the program for the duration of a run. Program output (`OUT`)
  goes to `output`, and recoverable errors are reported on `diagnostics`; both are plain writers
  so that a caller can point them at the standard streams or capture them.
*/
pub struct Machine<O: Write, D: Write> {
  memory      : Memory,
  program     : Program,
  ip          : AddressNumberType, // Instruction pointer
  output      : O,
  diagnostics : D,
}

impl<O: Write, D: Write> Machine<O, D> {

  // region Low-level utility methods

  /// Creates a machine with zeroed memory of the size the program asks for.
  pub fn new(program: Program, output: O, diagnostics: D) -> Result<Machine<O, D>> {
    let memory = Memory::new(program.memory_size as usize)?;
    Ok(Machine {
      memory,
      program,
      ip: 0,
      output,
      diagnostics,
    })
  }

  pub fn ip(&self) -> AddressNumberType {
    self.ip
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn output(&self) -> &O {
    &self.output
  }

  pub fn diagnostics(&self) -> &D {
    &self.diagnostics
  }

  pub fn into_parts(self) -> (Memory, O, D) {
    (self.memory, self.output, self.diagnostics)
  }

  /// The run is over once the instruction pointer has left the program.
  pub fn is_halted(&self) -> bool {
    self.ip >= self.program.len()
  }

  // endregion

  // region Execution

  /**
    Runs until the instruction pointer leaves the program or a fatal error occurs. Output is
    flushed on both paths, so everything written before a fault is visible.
  */
  pub fn run(&mut self) -> Result<()> {
    let mut result = Ok(());
    while !self.is_halted() {
      result = self.step();
      if result.is_err() {
        break;
      }
    }
    let flushed = self.output.flush();

    result?;
    flushed?;
    debug!("Program finished at instruction {}.", self.ip);
    Ok(())
  }

  /// Fetches, decodes and executes the instruction at `ip`. Does nothing once halted.
  pub fn step(&mut self) -> Result<()> {
    let encoded = match self.program.instructions.get(self.ip) {
      Some(encoded) => *encoded,
      None          => return Ok(())
    };
    trace!("{:>6}: {}", self.ip, encoded);

    let flow = match self.execute(&encoded) {
      Ok(flow)                        => flow,
      Err(error) if !error.is_fatal() => {
        self.report(&error)?;
        Flow::Next
      }
      Err(error)                      => return Err(error.at(self.ip, encoded))
    };

    self.ip = match flow {
      Flow::Next         => self.ip + 1,
      Flow::Skip         => self.ip + 2,
      Flow::Jump(target) => target
    };

    #[cfg(feature = "trace_computation")] eprintln!("{}", self);

    Ok(())
  }

  fn report(&mut self, error: &Error) -> Result<()> {
    debug!("Recovered at instruction {}: {}", self.ip, error);
    writeln!(self.diagnostics, "instruction {}: {}", self.ip, error)?;
    Ok(())
  }

  fn execute(&mut self, encoded: &EncodedInstruction) -> Result<Flow> {
    let instruction = try_decode_instruction(encoded)?;

    match instruction {

      Instruction::Nop => {}

      Instruction::Set { address, value } => {
        self.memory.write(address, value)?;
      }

      Instruction::Load { destination, source } => {
        let value = self.memory.read_indirect(source)?;
        self.memory.write(destination, value)?;
      }

      Instruction::Store { destination, source } => {
        let value  = self.memory.read(source)?;
        let target = self.memory.read(destination)?;
        self.memory.write(target, value)?;
      }

      Instruction::Jmp { target } => {
        let index  = self.memory.read(target)?;
        let target = Address::code(index, self.program.len())?;
        return Ok(Flow::Jump(target.idx()));
      }

      Instruction::Sgz { condition } => {
        if self.memory.read(condition)? > 0 {
          return Ok(Flow::Skip);
        }
      }

      Instruction::Add { destination, left, right } => {
        self.arithmetic(destination, left, right, |a, b| Ok(a.wrapping_add(b)))?;
      }

      Instruction::Mul { destination, left, right } => {
        self.arithmetic(destination, left, right, |a, b| Ok(a.wrapping_mul(b)))?;
      }

      Instruction::Div { destination, left, right } => {
        self.arithmetic(destination, left, right, |a, b| division(a, b, i64::wrapping_div))?;
      }

      Instruction::Mod { destination, left, right } => {
        self.arithmetic(destination, left, right, |a, b| division(a, b, i64::wrapping_rem))?;
      }

      Instruction::Out { source } => {
        // Only the low byte is a character.
        let value = self.memory.read(source)?;
        self.output.write_all(&[value as u8])?;
      }

      Instruction::Sleep { duration } => {
        let milliseconds = self.memory.read(duration)?;
        self.output.flush()?;
        if milliseconds > 0 {
          thread::sleep(Duration::from_millis(milliseconds as u64));
        }
      }

    }

    Ok(Flow::Next)
  }

  /**
    `M[destination] = operation(M[left], M[right])`. Every address is checked before the operation
    runs, so a bad address is reported even when the operation itself would also fail.
  */
  fn arithmetic<F>(&mut self, destination: i64, left: i64, right: i64, operation: F) -> Result<()>
    where F: FnOnce(Cell, Cell) -> Result<Cell>
  {
    self.memory.resolve(destination)?;
    let a = self.memory.read(left)?;
    let b = self.memory.read(right)?;
    let value = operation(a, b)?;
    self.memory.write(destination, value)
  }

  // endregion

}

/// Either operand being zero makes `DIV` and `MOD` refuse to run.
fn division(a: Cell, b: Cell, operation: fn(Cell, Cell) -> Cell) -> Result<Cell> {
  match (a, b) {
    | (0, _)
    | (_, 0) => Err(Error::DivisionByZero),
    _        => Ok(operation(a, b))
  }
}

// region Display methods

fn make_cell_table<T>(name: &str, cells: &[T], highlight: Option<usize>) -> Table
  where T: Display
{
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Address", ubl->"Contents"]);

  for (i, cell) in cells.iter().enumerate() {
    match highlight == Some(i) {

      true  => {
        table.add_row(
          row![r->format!("* --> {}[{}] =", name, i), format!("{}", cell)]
        );
      }

      false => {
        table.add_row(
          row![r->format!("{}[{}] =", name, i), format!("{}", cell)]
        );
      }

    } // end match on highlight
  } // end for
  table
}

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<O: Write, D: Write> Display for Machine<O, D> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let m_table    = make_cell_table("M",    self.memory.cells(),        None);
    let code_table = make_cell_table("CODE", &self.program.instructions, Some(self.ip));

    let mut combined_table = table!([m_table, code_table]);

    combined_table.set_titles(row![ub->"Memory", ub->"Program"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let status = match self.is_halted() {
      true  => "Halted.",
      false => "Running."
    };

    write!(f, "IP: {}\t{}\n{}", self.ip, status, combined_table)
  }
}

// endregion


#[cfg(test)]
mod tests;
