/*!

  Programs are stored in the little-endian ORC container:

    Magic:        3 bytes, the ASCII text `ORC`
    Memory size:  4 bytes, unsigned, the number of memory cells (nonzero)
    Records:      25 bytes each, until the end of the file

  and each record is

    Opcode:       8 bits
    Operand:     64 bits, signed
    Operand:     64 bits, signed
    Operand:     64 bits, signed

  Every record carries three operands whether or not its opcode uses them. Operands are plain
  integers; an opcode decides whether an operand is an immediate value, the address of a memory
  cell, or the address of a cell that holds another address. Jump targets are never literals in
  the bytecode: a jump names a memory cell, and the cell holds the instruction index.

  Two representations of an instruction are used. `EncodedInstruction` is the record as stored,
  with the opcode kept as a raw byte so that unknown opcodes can be loaded and reported later.
  `Instruction` is the decoded form, one variant per opcode with named operands, which is what
  the machine dispatches on.

*/

mod binary;
mod instruction;
mod program;
mod assembly;

pub use binary::{encode_instruction, try_decode_instruction, parse_program,
                 EncodedInstruction, HEADER_SIZE, MAGIC, RECORD_SIZE};
pub use instruction::{Instruction, Opcode, Operand};
pub use program::Program;
pub use assembly::{parse_assembly, AssemblyError};
