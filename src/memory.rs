//! Flat data memory of the machine: a fixed number of signed 64-bit cells.

use std::alloc::{self, Layout};

use crate::address::Address;
use crate::error::{Error, Result};

pub type Cell = i64;

/**
  The memory store. Its size is fixed at creation and every cell starts out as zero, so two runs
  of the same program always see the same memory. All access goes through `read` and `write`,
  which resolve the raw operand to an `Address` first.
*/
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Memory {
  cells: Vec<Cell>
}

impl Memory {

  /**
    Allocates `size` zeroed cells. The cells come from a zeroed allocation rather than being
    written one by one, so untouched pages of a large memory are never committed. Fails instead
    of aborting when the allocation is refused.
  */
  pub fn new(size: usize) -> Result<Memory> {
    let out_of_memory = || Error::OutOfMemory { cells: size };
    if size == 0 {
      return Ok(Memory { cells: Vec::new() });
    }

    let layout = Layout::array::<Cell>(size).map_err(|_| out_of_memory())?;
    // SAFETY: `layout` has a nonzero size. All-zero bytes are a valid `i64`, and the vector takes
    // ownership of an allocation made by the global allocator with exactly the layout it will
    // free it with: `size` elements of `Cell`.
    let cells = unsafe {
      let pointer = alloc::alloc_zeroed(layout) as *mut Cell;
      if pointer.is_null() {
        return Err(out_of_memory());
      }
      Vec::from_raw_parts(pointer, size, size)
    };
    Ok(Memory { cells })
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  pub fn read(&self, address: i64) -> Result<Cell> {
    let address = self.resolve(address)?;
    Ok(self.cells[address.idx()])
  }

  pub fn write(&mut self, address: i64, value: Cell) -> Result<()> {
    let address = self.resolve(address)?;
    self.cells[address.idx()] = value;
    Ok(())
  }

  /// Reads the cell whose address is stored at `address`.
  pub fn read_indirect(&self, address: i64) -> Result<Cell> {
    self.read(self.read(address)?)
  }

  /// Checks `address` without touching the cell.
  pub fn resolve(&self, address: i64) -> Result<Address> {
    Address::memory(address, self.cells.len())
  }
}
