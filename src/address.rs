//! An `Either` type that holds the address of either a memory cell or an instruction, with some
//! convenience functions. Raw operands are plain `i64` values; an `Address` only exists once the
//! value has been checked against the bounds of its space.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

// `AddressNumberType` is `usize`, as it is naturally an index into a vector.
pub type AddressNumberType = usize;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Address {
  /// An index into the memory cells.
  Memory(AddressNumberType),
  /// An index into the instruction sequence, the target of a jump.
  Code(AddressNumberType)
}

impl Address {
  /// Converts the address to an index into the corresponding vector.
  pub fn idx(&self) -> AddressNumberType {
    match self {
      | Address::Memory(i)
      | Address::Code(i) => *i
    }
  }

  /// Resolves `value` as a memory address, failing unless it lies in `[0, size)`.
  pub fn memory(value: i64, size: usize) -> Result<Address> {
    match in_bounds(value, size) {
      Some(i) => Ok(Address::Memory(i)),
      None    => Err(Error::InvalidAddress { value, size })
    }
  }

  /// Resolves `value` as an instruction index, failing unless it lies in `[0, count)`.
  pub fn code(value: i64, count: usize) -> Result<Address> {
    match in_bounds(value, count) {
      Some(i) => Ok(Address::Code(i)),
      None    => Err(Error::InvalidInstructionIndex { value, count })
    }
  }
}

fn in_bounds(value: i64, top: usize) -> Option<AddressNumberType> {
  AddressNumberType::try_from(value).ok().filter(|i| *i < top)
}


impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Address::Memory(i) => {
        write!(f, "M[{}]", i)
      },
      Address::Code(i) => {
        write!(f, "CODE[{}]", i)
      }
    }
  }
}
