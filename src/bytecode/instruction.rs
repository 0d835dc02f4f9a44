use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumString};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::error::{Error, Result};

/// The value type of every operand. Depending on the opcode it is an immediate, a memory address,
/// or the address of a cell holding another address.
pub type Operand = i64;

/**
  Opcodes of the virtual machine. The discriminants are the byte values used in the ORC
  container, so `Opcode::try_from(byte)` is the whole of opcode decoding.
*/
#[derive(
  StrumDisplay, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,       Eq, PartialEq,  Debug,            Hash
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[repr(u8)]
pub enum Opcode {
  Nop   = 0x00, // nop
  Set   = 0x95, // set( address, value )
  Load  = 0x5D, // load( address, address_of_address )
  Store = 0x63, // store( address_of_address, address )
  Jmp   = 0x91, // jmp( address_of_target )
  Sgz   = 0x25, // sgz( address )
  Add   = 0xAD, // add( address, address, address )
  Mul   = 0x33, // mul( address, address, address )
  Div   = 0x04, // div( address, address, address )
  Mod   = 0xB5, // mod( address, address, address )
  Out   = 0xC1, // out( address )
  Sleep = 0xBF, // sleep( address )
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Number of operands the opcode reads. The remaining slots of a record are ignored.
  pub fn arity(&self) -> usize {
    match self {
      Opcode::Nop => 0,

      | Opcode::Jmp
      | Opcode::Sgz
      | Opcode::Out
      | Opcode::Sleep => 1,

      | Opcode::Set
      | Opcode::Load
      | Opcode::Store => 2,

      | Opcode::Add
      | Opcode::Mul
      | Opcode::Div
      | Opcode::Mod => 3,
    }
  }

  pub fn from_code(code: u8) -> Result<Opcode> {
    Opcode::try_from(code).map_err(|_| Error::UnknownOpcode(code))
  }
}

/// A decoded instruction. Operands are named by the role they play for the opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  Nop,
  /// `M[address] = value`
  Set   { address: Operand, value: Operand },
  /// `M[destination] = M[M[source]]`
  Load  { destination: Operand, source: Operand },
  /// `M[M[destination]] = M[source]`
  Store { destination: Operand, source: Operand },
  /// Continue at the instruction whose index is stored in `M[target]`.
  Jmp   { target: Operand },
  /// Skip the next instruction if `M[condition] > 0`.
  Sgz   { condition: Operand },
  Add   { destination: Operand, left: Operand, right: Operand },
  Mul   { destination: Operand, left: Operand, right: Operand },
  Div   { destination: Operand, left: Operand, right: Operand },
  Mod   { destination: Operand, left: Operand, right: Operand },
  /// Writes the low byte of `M[source]`.
  Out   { source: Operand },
  /// Blocks for `M[duration]` milliseconds.
  Sleep { duration: Operand },
}

impl Instruction {
  /// Builds the instruction for `opcode` from a full operand triple, ignoring unused slots.
  pub fn new(opcode: Opcode, operands: [Operand; 3]) -> Instruction {
    let [a, b, c] = operands;
    match opcode {
      Opcode::Nop   => Instruction::Nop,
      Opcode::Set   => Instruction::Set   { address: a, value: b },
      Opcode::Load  => Instruction::Load  { destination: a, source: b },
      Opcode::Store => Instruction::Store { destination: a, source: b },
      Opcode::Jmp   => Instruction::Jmp   { target: a },
      Opcode::Sgz   => Instruction::Sgz   { condition: a },
      Opcode::Add   => Instruction::Add   { destination: a, left: b, right: c },
      Opcode::Mul   => Instruction::Mul   { destination: a, left: b, right: c },
      Opcode::Div   => Instruction::Div   { destination: a, left: b, right: c },
      Opcode::Mod   => Instruction::Mod   { destination: a, left: b, right: c },
      Opcode::Out   => Instruction::Out   { source: a },
      Opcode::Sleep => Instruction::Sleep { duration: a },
    }
  }

  pub fn opcode(&self) -> Opcode {
    match self {
      Instruction::Nop        => Opcode::Nop,
      Instruction::Set   {..} => Opcode::Set,
      Instruction::Load  {..} => Opcode::Load,
      Instruction::Store {..} => Opcode::Store,
      Instruction::Jmp   {..} => Opcode::Jmp,
      Instruction::Sgz   {..} => Opcode::Sgz,
      Instruction::Add   {..} => Opcode::Add,
      Instruction::Mul   {..} => Opcode::Mul,
      Instruction::Div   {..} => Opcode::Div,
      Instruction::Mod   {..} => Opcode::Mod,
      Instruction::Out   {..} => Opcode::Out,
      Instruction::Sleep {..} => Opcode::Sleep,
    }
  }

  /// The operand triple as it is laid out in a record, with unused slots set to zero.
  pub fn operands(&self) -> [Operand; 3] {
    match *self {
      Instruction::Nop => [0, 0, 0],

      | Instruction::Set   { address: a, value: b }
      | Instruction::Load  { destination: a, source: b }
      | Instruction::Store { destination: a, source: b } => [a, b, 0],

      | Instruction::Jmp   { target: a }
      | Instruction::Sgz   { condition: a }
      | Instruction::Out   { source: a }
      | Instruction::Sleep { duration: a } => [a, 0, 0],

      | Instruction::Add { destination: a, left: b, right: c }
      | Instruction::Mul { destination: a, left: b, right: c }
      | Instruction::Div { destination: a, left: b, right: c }
      | Instruction::Mod { destination: a, left: b, right: c } => [a, b, c],
    }
  }
}

/// Writes `name(a, b, ...)` with the first `arity` operands, or just `name` when there are none.
pub(crate) fn write_call(
  f        : &mut Formatter<'_>,
  name     : &dyn Display,
  operands : &[Operand]
) -> std::fmt::Result
{
  if operands.is_empty() {
    return write!(f, "{}", name);
  }
  write!(
    f,
    "{}({})",
    name,
    operands
      .iter()
      .map(Operand::to_string)
      .collect::<Vec<String>>()
      .join(", ")
  )
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let opcode = self.opcode();
    write_call(f, &opcode, &self.operands()[..opcode.arity()])
  }
}
