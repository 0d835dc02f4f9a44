/*!
  A virtual machine for ORC bytecode. A program is a sequence of three-operand instructions
  executed against a flat, fixed-size memory of signed 64-bit cells; addresses, data and jump
  targets all live in that memory.

  ```text
  bytes -> [`loader::load_file`] -> `Program` -> [`Machine::run`] -> output
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod error;
pub mod loader;
pub mod machine;
pub mod memory;

pub use error::{Error, ErrorClass, FormatError, Result};
pub use machine::{Flow, Machine};
pub use memory::Memory;
