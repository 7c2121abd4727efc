//! Fatal conditions that halt the machine.

use strum_macros::Display as StrumDisplay;
use thiserror::Error;

use crate::bytecode::{OpcodeType, Operation};
use crate::operand::Address;

/// The instruction field whose address was out of range.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Field {
  #[strum(serialize = "a")]
  A,
  #[strum(serialize = "b")]
  B,
}

/**
  Every fault is fatal. A fault is raised before the offending fetch, access, or division takes
  place, so memory holds exactly the effects of the instructions that completed. `pc` is always
  the address of the instruction that faulted.
*/
#[derive(Error, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Fault {
  #[error("invalid pc: {pc} is outside code of size {code_size}")]
  InvalidPc {
    pc       : usize,
    code_size: usize,
  },

  #[error("invalid memory access ({field}): address {address:#05x} >= data size {data_size} at pc {pc}")]
  InvalidMemoryAccess {
    pc       : usize,
    field    : Field,
    address  : Address,
    data_size: usize,
  },

  #[error("invalid instruction: opcode {opcode:#04x} at pc {pc}")]
  InvalidInstruction {
    pc    : usize,
    opcode: OpcodeType,
  },

  #[error("division by zero in {operation} at pc {pc}")]
  DivisionByZero {
    pc       : usize,
    operation: Operation,
  },
}

impl Fault {
  /// The pc of the instruction that faulted.
  pub fn pc(&self) -> usize {
    match self {
      | Fault::InvalidPc { pc, .. }
      | Fault::InvalidMemoryAccess { pc, .. }
      | Fault::InvalidInstruction { pc, .. }
      | Fault::DivisionByZero { pc, .. } => *pc
    }
  }
}
