/*!
  This module is responsible for the encoding and decoding of binary instructions and of the ORC
  container that holds them.

  The parsers are `nom` streaming parsers, so running out of input is reported as
  `Incomplete` rather than as a mismatch. That is exactly the distinction the container needs: a
  short file is a truncated header or record, while wrong bytes are a bad signature.
*/
use std::fmt::{Display, Formatter};

use nom::{
  bytes::streaming::tag,
  combinator::map,
  number::streaming::{le_i64, le_u32, le_u8},
  sequence::{preceded, tuple},
  Err as NomErr,
  IResult
};

use super::{Instruction, Opcode, Operand, Program};
use super::instruction::write_call;
use crate::error::{FormatError, Result};

// If you change any of these you must also change `EncodedInstruction::to_bytes`.
pub const MAGIC       : &[u8; 3] = b"ORC";
pub const HEADER_SIZE : usize    = 7;
pub const RECORD_SIZE : usize    = 25;

/// One instruction record exactly as it appears in the container. The opcode byte is kept raw so
/// that unknown opcodes survive loading and are reported when they are executed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EncodedInstruction {
  pub opcode   : u8,
  pub operands : [Operand; 3]
}

impl EncodedInstruction {
  pub fn new(opcode: u8, operands: [Operand; 3]) -> EncodedInstruction {
    EncodedInstruction { opcode, operands }
  }

  pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
    let mut bytes = [0u8; RECORD_SIZE];
    bytes[0] = self.opcode;
    for (i, operand) in self.operands.iter().enumerate() {
      let start = 1 + i * 8;
      bytes[start..start + 8].copy_from_slice(&operand.to_le_bytes());
    }
    bytes
  }
}

impl Display for EncodedInstruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match try_decode_instruction(self) {
      Ok(instruction) => write!(f, "{}", instruction),
      Err(_)          => write_call(f, &format_args!("{:#04X}", self.opcode), &self.operands)
    }
  }
}

pub fn try_decode_instruction(encoded: &EncodedInstruction) -> Result<Instruction> {
  let opcode = Opcode::from_code(encoded.opcode)?;
  Ok(Instruction::new(opcode, encoded.operands))
}

pub fn encode_instruction(instruction: &Instruction) -> EncodedInstruction {
  EncodedInstruction::new(instruction.opcode().code(), instruction.operands())
}

// region Parsers

/// `[Magic:3][MemorySize:4]`
fn header(input: &[u8]) -> IResult<&[u8], u32> {
  preceded(tag(&MAGIC[..]), le_u32)(input)
}

/// `[OpCode:1][Operand:8][Operand:8][Operand:8]`
fn encoded_instruction(input: &[u8]) -> IResult<&[u8], EncodedInstruction> {
  map(
    tuple((le_u8, le_i64, le_i64, le_i64)),
    |(opcode, a, b, c)| EncodedInstruction::new(opcode, [a, b, c])
  )(input)
}

/**
  Parses a complete ORC container. Records are read until the input is exhausted; input that ends
  inside a record, including directly after an opcode byte, is a truncated record.
*/
pub fn parse_program(bytes: &[u8]) -> Result<Program> {
  let (mut rest, memory_size) = match header(bytes) {
    Ok(parsed)                 => parsed,
    Err(NomErr::Incomplete(_)) => return Err(FormatError::TruncatedHeader.into()),
    Err(_)                     => return Err(FormatError::BadMagic.into())
  };
  if memory_size == 0 {
    return Err(FormatError::ZeroMemorySize.into());
  }

  let mut instructions = Vec::with_capacity(rest.len() / RECORD_SIZE);
  while !rest.is_empty() {
    match encoded_instruction(rest) {
      Ok((remaining, instruction)) => {
        instructions.push(instruction);
        rest = remaining;
      }
      Err(_) => {
        return Err(
          FormatError::TruncatedRecord {
            index  : instructions.len(),
            offset : bytes.len() - rest.len()
          }.into()
        );
      }
    }
  }

  Ok(Program::new(memory_size, instructions))
}

// endregion
