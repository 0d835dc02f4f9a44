//! Errors raised while loading or executing a program.
//!
//! Every error belongs to an `ErrorClass`. The class decides whether the machine may recover
//! from the error and, for fatal errors, which exit code the process terminates with.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bytecode::EncodedInstruction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ErrorClass {
  File,
  Format,
  Address,
  Arithmetic,
  UnknownOpcode,
  Io,
  Resource,
}

impl ErrorClass {
  /// Recoverable errors are reported and execution continues with the next instruction.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, ErrorClass::Arithmetic | ErrorClass::UnknownOpcode)
  }

  /// Process exit code for the class, following the `sysexits.h` conventions.
  pub fn exit_code(&self) -> i32 {
    match self {
      ErrorClass::Format   => 65, // EX_DATAERR
      ErrorClass::File     => 66, // EX_NOINPUT
      ErrorClass::Resource => 71, // EX_OSERR
      ErrorClass::Io       => 74, // EX_IOERR
      // Recoverable classes only reach the process boundary through a bug.
      | ErrorClass::Address
      | ErrorClass::Arithmetic
      | ErrorClass::UnknownOpcode => 70, // EX_SOFTWARE
    }
  }
}

/// Ways an ORC container can be malformed.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum FormatError {
  #[error("file is too short to hold the ORC header")]
  TruncatedHeader,
  #[error("missing \"ORC\" signature")]
  BadMagic,
  #[error("memory size must be greater than zero")]
  ZeroMemorySize,
  #[error("instruction {index} at byte {offset} is truncated")]
  TruncatedRecord {
    index  : usize,
    offset : usize,
  },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("couldn't open file {}: {source}", .path.display())]
  File {
    path   : PathBuf,
    source : io::Error,
  },

  #[error("invalid program format: {0}")]
  Format(#[from] FormatError),

  #[error("invalid address {value}: memory has {size} cells")]
  InvalidAddress {
    value : i64,
    size  : usize,
  },

  #[error("invalid instruction index {value}: program has {count} instructions")]
  InvalidInstructionIndex {
    value : i64,
    count : usize,
  },

  #[error("cannot divide by zero")]
  DivisionByZero,

  #[error("invalid instruction: unknown opcode {0:#04X}")]
  UnknownOpcode(u8),

  #[error("cannot allocate {cells} memory cells")]
  OutOfMemory {
    cells: usize,
  },

  #[error("output error: {0}")]
  Output(#[from] io::Error),

  /// A fatal error annotated with the instruction that raised it.
  #[error("instruction {ip} `{instruction}`: {source}")]
  Fault {
    ip          : usize,
    instruction : EncodedInstruction,
    #[source]
    source      : Box<Error>,
  },
}

impl Error {
  pub fn class(&self) -> ErrorClass {
    match self {
      Error::File{..}                    => ErrorClass::File,
      Error::Format(_)                   => ErrorClass::Format,
      | Error::InvalidAddress{..}
      | Error::InvalidInstructionIndex{..} => ErrorClass::Address,
      Error::DivisionByZero              => ErrorClass::Arithmetic,
      Error::UnknownOpcode(_)            => ErrorClass::UnknownOpcode,
      Error::OutOfMemory{..}             => ErrorClass::Resource,
      Error::Output(_)                   => ErrorClass::Io,
      Error::Fault{source, ..}           => source.class(),
    }
  }

  pub fn is_fatal(&self) -> bool {
    self.class().is_fatal()
  }

  pub fn exit_code(&self) -> i32 {
    self.class().exit_code()
  }

  /// Attaches the faulting instruction to the error.
  pub fn at(self, ip: usize, instruction: EncodedInstruction) -> Error {
    Error::Fault {
      ip,
      instruction,
      source: Box::new(self),
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recoverable_classes() {
    assert!(!Error::DivisionByZero.is_fatal());
    assert!(!Error::UnknownOpcode(0x7F).is_fatal());
    assert!(Error::InvalidAddress{ value: -1, size: 4 }.is_fatal());
    assert!(Error::Format(FormatError::BadMagic).is_fatal());
  }

  #[test]
  fn fault_takes_class_of_source() {
    let error = Error::InvalidInstructionIndex{ value: 9, count: 3 }
        .at(2, EncodedInstruction::new(0x91, [0, 0, 0]));

    assert_eq!(error.class(), ErrorClass::Address);
    assert_eq!(error.exit_code(), 70);
    assert_eq!(
      error.to_string(),
      "instruction 2 `JMP(0)`: invalid instruction index 9: program has 3 instructions"
    );
  }

  #[test]
  fn exit_codes_are_distinct() {
    let codes = [
      ErrorClass::File.exit_code(),
      ErrorClass::Format.exit_code(),
      ErrorClass::Address.exit_code(),
      ErrorClass::Resource.exit_code(),
      ErrorClass::Io.exit_code(),
    ];
    for (i, a) in codes.iter().enumerate() {
      assert_ne!(*a, 0);
      for b in &codes[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }
}
