/*!
  The human readable textual form of bytecode is called assembly. This module leverages the
  `strum` derives of `Opcode` to read mnemonics, so the accepted text is exactly what
  `Instruction`'s `Display` produces:

  ```text
  SET(0, 72)      # one instruction per line
  out(0)          # mnemonics are case-insensitive
  NOP             # zero-operand instructions may drop the parentheses
  ```
*/

use std::str::FromStr;

use nom::{
  character::complete::{alpha1, char as one_char, i64 as integer, space0},
  combinator::{all_consuming, map, opt},
  multi::separated_list0,
  sequence::{delimited, pair},
  IResult
};
use thiserror::Error;

use super::{Instruction, Opcode, Operand};

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AssemblyError {
  #[error("Error on line {line}: cannot parse `{text}`.")]
  Syntax {
    line: usize,
    text: String
  },
  #[error("Error on line {line}: {name} is not an operation.")]
  NotAnOperation {
    line: usize,
    name: String
  },
  #[error("Error on line {line}: {opcode} requires {} arguments but was given {}.",
          .opcode.arity(), .args.len())]
  WrongArity {
    line   : usize,
    opcode : Opcode,
    args   : Vec<Operand>
  }
}

fn operand(input: &str) -> IResult<&str, Operand> {
  delimited(space0, integer, space0)(input)
}

/// `(a, b, ...)`
fn operand_list(input: &str) -> IResult<&str, Vec<Operand>> {
  delimited(one_char('('), separated_list0(one_char(','), operand), one_char(')'))(input)
}

/// `MNEMONIC` or `MNEMONIC(a, b, ...)`, surrounded by optional spaces.
fn statement(input: &str) -> IResult<&str, (&str, Vec<Operand>)> {
  all_consuming(
    delimited(
      space0,
      pair(
        alpha1,
        map(opt(delimited(space0, operand_list, space0)), Option::unwrap_or_default)
      ),
      space0
    )
  )(input)
}

fn parse_line(line: usize, text: &str) -> Result<Instruction, AssemblyError> {
  let (name, args) = match statement(text) {
    Ok((_, parsed)) => parsed,
    Err(_)          => return Err(AssemblyError::Syntax { line, text: text.trim().to_string() })
  };

  let opcode = Opcode::from_str(name)
      .map_err(|_| AssemblyError::NotAnOperation { line, name: name.to_string() })?;
  if args.len() != opcode.arity() {
    return Err(AssemblyError::WrongArity { line, opcode, args });
  }

  let mut operands = [0; 3];
  operands[..args.len()].copy_from_slice(&args);
  Ok(Instruction::new(opcode, operands))
}

/// Parses a whole listing. Everything after a `#` is a comment, and blank lines are skipped.
pub fn parse_assembly(text: &str) -> Result<Vec<Instruction>, AssemblyError> {
  let mut instructions = Vec::new();

  for (i, raw_line) in text.lines().enumerate() {
    let code = match raw_line.find('#') {
      Some(start) => &raw_line[..start],
      None        => raw_line
    };
    if code.trim().is_empty() {
      continue;
    }
    instructions.push(parse_line(i + 1, code)?);
  }

  Ok(instructions)
}
