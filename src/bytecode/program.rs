use super::binary::{self, EncodedInstruction, HEADER_SIZE, MAGIC, RECORD_SIZE};
use super::{encode_instruction, Instruction};
use crate::error::Result;

/// A loaded program: the memory size requested by its header and its instruction records.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
  pub memory_size  : u32,
  pub instructions : Vec<EncodedInstruction>
}

impl Program {
  pub fn new(memory_size: u32, instructions: Vec<EncodedInstruction>) -> Program {
    Program { memory_size, instructions }
  }

  pub fn from_instructions(memory_size: u32, instructions: &[Instruction]) -> Program {
    Program::new(memory_size, instructions.iter().map(encode_instruction).collect())
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Program> {
    binary::parse_program(bytes)
  }

  /// Serializes the program as an ORC container.
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + RECORD_SIZE * self.instructions.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&self.memory_size.to_le_bytes());
    for instruction in &self.instructions {
      bytes.extend_from_slice(&instruction.to_bytes());
    }
    bytes
  }

  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }
}
