/*!
  A minimal memory-addressed bytecode virtual machine.

  The machine fetches 32 bit instructions from a code buffer, splits each into an opcode and two
  12 bit operand fields, and applies byte arithmetic to a flat data memory. The first operand
  always names a memory cell, which is both read and written; the second names a memory cell or
  carries an immediate. See `bytecode` for the encoding and `vm` for the loop.

  ```
  use exp1::bytecode::parse_assembly;

  let mut program = parse_assembly(".cell x = 3\nadd x, #5\nexit x").unwrap();
  assert_eq!(program.run(), Ok(8));
  assert_eq!(program.memory, vec![8]);
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod fault;
pub mod operand;
pub mod symboltable;
pub mod vm;

pub use fault::{Fault, Field};
pub use operand::{Address, Operand};
pub use vm::{run, Machine, Status};
