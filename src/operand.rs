//! An `Either` type that holds either the address of a memory cell or an immediate byte, with
//! some convenience functions.

use std::fmt::{Display, Formatter};

use crate::bytecode::{FieldType, IMMEDIATE_FLAG, IMMEDIATE_MASK};

// `Address` is `usize`, as it is naturally an index into the data memory.
pub type Address = usize;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Operand {
  /// A "pointer" to a cell is an index into data memory.
  Memory(Address),
  /// A literal carried in the instruction itself. It has no address and is never written.
  Immediate(u8),
}

impl Operand {
  /**
    Interprets a 12-bit `b` field. With the immediate flag set, the low 11 bits are the literal,
    truncated to a byte: `0x92C` is `Immediate(0x2C)`, not a saturated `0xFF`.
  */
  pub fn from_b_field(b: FieldType) -> Operand {
    match b & IMMEDIATE_FLAG != 0 {
      true  => Operand::Immediate((b & IMMEDIATE_MASK) as u8),
      false => Operand::Memory(b as Address),
    }
  }

  /// The inverse of `from_b_field` for addresses below the flag bit.
  pub fn to_b_field(&self) -> FieldType {
    match self {
      Operand::Memory(address)  => *address as FieldType,
      Operand::Immediate(value) => IMMEDIATE_FLAG | *value as FieldType,
    }
  }

  pub fn address(&self) -> Option<Address> {
    match self {
      Operand::Memory(address) => Some(*address),
      Operand::Immediate(_)    => None
    }
  }
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Memory(address) => {
        write!(f, "[{}]", address)
      },
      Operand::Immediate(value) => {
        write!(f, "#{}", value)
      }
    }
  }
}
