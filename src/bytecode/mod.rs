/*!

  The VM uses a 32 bit word for every instruction. There is exactly one instruction format, and
  the sizes of instruction components are as follows, from low bits to high bits:

    B:      12 bits
    A:      12 bits
    Opcode:  8 bits

  A is always the address of a data memory cell, which is both read and written. B is the source
  operand. The top bit of B (bit 11, `0x800`) is the immediate flag: when it is set, the low 11
  bits of B are a literal, which the machine truncates to a byte; when it is clear, B is the
  address of a data memory cell. Reserving the flag bit halves the range B can address, but it
  spares the machine a second instruction format.

  Data memory is a flat array of bytes and all arithmetic wraps modulo 256.

*/

mod binary;
mod instruction;
mod assembly;
mod listing;

pub use binary::{
  decode_instruction, encode_instruction,
  Word, OpcodeType, FieldType,
  A_BITS, B_BITS, OPCODE_BITS, A_MASK, B_MASK, OPCODE_MASK,
  IMMEDIATE_FLAG, IMMEDIATE_MASK
};
pub use instruction::{Instruction, Operation};
pub use assembly::{parse_assembly, AssemblyError, Program};
pub use listing::listing;
