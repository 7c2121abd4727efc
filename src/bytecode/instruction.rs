use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::bytecode::binary::{encode_instruction, FieldType, OpcodeType, Word};
use crate::operand::{Address, Operand};

/**
  Opcodes of the virtual machine.

  The table is deliberately sparse: only the values listed here are instructions, and every other
  byte is rejected by the executor with `Fault::InvalidInstruction`. The discriminants are the
  encoded opcode values, so they must not be reordered.
*/
#[derive(
StrumDisplay, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,       Eq, PartialEq,       Debug,            Hash
)]
#[repr(u8)]
pub enum Operation {
  #[strum(serialize = "add")]
  Add  = 0x00,   // A := A + B
  #[strum(serialize = "sub")]
  Sub  = 0x01,   // A := A - B
  #[strum(serialize = "mul")]
  Mul  = 0x02,   // A := A * B
  #[strum(serialize = "div")]
  Div  = 0x03,   // A := A / B
  #[strum(serialize = "mod")]
  Mod  = 0x04,   // A := A % B
  #[strum(serialize = "exit")]
  Exit = 0x0F,   // halt with B
}

impl Operation {
  pub fn code(&self) -> OpcodeType {
    Into::<OpcodeType>::into(*self)
  }

  /// Looks up the operation for an opcode byte, if there is one.
  pub fn from_code(code: OpcodeType) -> Option<Operation> {
    Operation::try_from(code).ok()
  }

  /// True for the operations whose right operand is a divisor.
  pub fn divides(&self) -> bool {
    matches!(self, Operation::Div | Operation::Mod)
  }

  /**
    Applies the operation to a destination value and a source value with 8-bit wraparound.
    Returns `None` for a zero divisor and for `exit`, which has no arithmetic.
  */
  pub fn apply(&self, a: u8, b: u8) -> Option<u8> {
    match self {
      Operation::Add  => Some(a.wrapping_add(b)),
      Operation::Sub  => Some(a.wrapping_sub(b)),
      Operation::Mul  => Some(a.wrapping_mul(b)),
      Operation::Div  => a.checked_div(b),
      Operation::Mod  => a.checked_rem(b),
      Operation::Exit => None,
    }
  }
}

/// Holds the decoded, unvalidated fields of an instruction word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  pub opcode: OpcodeType,
  /// Destination address, 12 bits.
  pub a     : FieldType,
  /// Source address or flagged immediate, 12 bits.
  pub b     : FieldType,
}

impl Instruction {
  pub fn new(operation: Operation, a: Address, b: Operand) -> Instruction {
    Instruction {
      opcode: operation.code(),
      a     : a as FieldType,
      b     : b.to_b_field(),
    }
  }

  pub fn operation(&self) -> Option<Operation> {
    Operation::from_code(self.opcode)
  }

  /// Operand A is always a memory reference.
  pub fn operand_a(&self) -> Operand {
    Operand::Memory(self.a as Address)
  }

  /// Operand B before any bounds check.
  pub fn operand_b(&self) -> Operand {
    Operand::from_b_field(self.b)
  }

  pub fn encode(&self) -> Word {
    encode_instruction(*self)
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.operation() {

      Some(operation) => {
        write!(f, "{} {}, {}", operation, self.operand_a(), self.operand_b())
      }

      None => {
        write!(f, ".word 0x{:08x}", self.encode())
      }

    }
  }
}
