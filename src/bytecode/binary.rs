/*!
  This module is responsible for the encoding and decoding of binary instructions.

*/

use super::Instruction;

// If you change these you must also change `encode_instruction` and `decode_instruction`.
pub type Word = u32;
pub type OpcodeType = u8;
pub type FieldType = u16;

pub const OPCODE_BITS: u32 = 8;
pub const A_BITS     : u32 = 12;
pub const B_BITS     : u32 = 12;

pub const OPCODE_MASK: Word = (1 << OPCODE_BITS) - 1;
pub const A_MASK     : Word = (1 << A_BITS) - 1;
pub const B_MASK     : Word = (1 << B_BITS) - 1;

/// Bit 11 of the `b` field. When set, `b` holds a literal rather than an address.
pub const IMMEDIATE_FLAG: FieldType = 1 << (B_BITS - 1);
/// The payload bits of an immediate `b` field.
pub const IMMEDIATE_MASK: FieldType = IMMEDIATE_FLAG - 1;

/**
  Splits a word into its three fields. Every word decodes to *some* instruction; whether the
  opcode means anything is decided by the executor.

  [OpCode:8][A:12][B:12]
*/
pub fn decode_instruction(word: Word) -> Instruction {
  Instruction {
    opcode: ((word >> (A_BITS + B_BITS)) & OPCODE_MASK) as OpcodeType,
    a     : ((word >> B_BITS) & A_MASK) as FieldType,
    b     : (word & B_MASK) as FieldType,
  }
}

/**
  Encodes the instruction into bytecode. Fields wider than their slot are masked, so it is the
  caller's responsibility to keep `a` and `b` within 12 bits.
*/
pub fn encode_instruction(instruction: Instruction) -> Word {
  ((instruction.opcode as Word & OPCODE_MASK) << (A_BITS + B_BITS)) |
    ((instruction.a    as Word & A_MASK     ) <<  B_BITS          ) |
     (instruction.b    as Word & B_MASK     )
}
