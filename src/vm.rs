//! Structures and functions for the machine itself: the fetch-decode-execute loop over a code
//! buffer and a flat byte memory.

use std::fmt::{Display, Formatter};

use log::{debug, trace};
use prettytable::{format as TableFormat, Table};

use crate::bytecode::{decode_instruction, Instruction, Operation, Word};
use crate::fault::{Fault, Field};
use crate::operand::{Address, Operand};

/// Where the machine is in its lifecycle. Both halted states are terminal.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Status {
  Running,
  Exited(u8),
  Faulted(Fault),
}

impl Status {
  pub fn is_halted(&self) -> bool {
    *self != Status::Running
  }

  fn outcome(&self) -> Option<Result<u8, Fault>> {
    match self {
      Status::Running       => None,
      Status::Exited(code)  => Some(Ok(*code)),
      Status::Faulted(fault) => Some(Err(fault.clone())),
    }
  }
}

impl Display for Status {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Status::Running        => write!(f, "Running"),
      Status::Exited(code)   => write!(f, "Exited with {}", code),
      Status::Faulted(fault) => write!(f, "Faulted: {}", fault),
    }
  }
}

/**
  The machine borrows its program and its data memory for the length of a run. The code is
  shared and never written; the memory is borrowed exclusively, so the executor is its only
  mutator. The embedder gets the memory back, with every completed instruction's effect in it,
  when the borrow ends.
*/
pub struct Machine<'m> {
  code  : &'m [Word],
  memory: &'m mut [u8],

  pc    : usize,
  status: Status,

  // The most recently fetched instruction, for display.
  current: Option<Instruction>,
}

impl<'m> Machine<'m> {

  // region Display methods

  fn make_memory_table(memory: &[u8], highlight: Option<Address>) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, cell) in memory.iter().enumerate() {
      match Some(i) == highlight {

        true  => {
          table.add_row(
            row![r->format!("* --> M[{}] =", i), format!("{:#04x} ({})", cell, cell)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("M[{}] =", i), format!("{:#04x} ({})", cell, cell)]
          );
        }

      } // end match on highlight
    } // end for
    table
  }

  /// A table of the given memory, for callers that only hold the memory after a run.
  pub fn memory_table(memory: &[u8]) -> Table {
    Machine::make_memory_table(memory, None)
  }

  // endregion

  // region Accessors

  pub fn new(code: &'m [Word], memory: &'m mut [u8]) -> Machine<'m> {
    Machine {
      code,
      memory,
      pc     : 0,
      status : Status::Running,
      current: None,
    }
  }

  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn status(&self) -> &Status {
    &self.status
  }

  pub fn memory(&self) -> &[u8] {
    &*self.memory
  }

  // endregion

  // region Interpretation

  /**
    Runs until the program exits or faults. Calling `run` again on a halted machine executes
    nothing and reports the same outcome.
  */
  pub fn run(&mut self) -> Result<u8, Fault> {
    loop {
      if let Some(exit_code) = self.step()? {
        return Ok(exit_code);
      }
    }
  }

  /**
    Executes one instruction. Returns `Ok(None)` while the machine keeps running and
    `Ok(Some(exit_code))` once it exits. A halted machine does not advance; it reports its
    recorded outcome again.
  */
  pub fn step(&mut self) -> Result<Option<u8>, Fault> {
    if let Some(outcome) = self.status.outcome() {
      return outcome.map(Some);
    }

    match self.execute() {

      Ok(None) => Ok(None),

      Ok(Some(exit_code)) => {
        debug!("exit value: {}", exit_code);
        self.status = Status::Exited(exit_code);
        Ok(Some(exit_code))
      }

      Err(fault) => {
        debug!("halted: {}", fault);
        self.status = Status::Faulted(fault.clone());
        Err(fault)
      }

    }
  }

  fn execute(&mut self) -> Result<Option<u8>, Fault> {
    let pc = self.pc;
    let instruction = self.fetch()?;

    trace!(
      "pc: {}, instr: {:08x}, op: {:02x}, a: {:03x}, b: {:03x}",
      pc, instruction.encode(), instruction.opcode, instruction.a, instruction.b
    );

    let a = self.resolve_a(pc, &instruction)?;
    let b = self.resolve_b(pc, &instruction)?;
    let b_value = self.value_of(b);

    let operation = match instruction.operation() {
      Some(operation) => operation,
      None => return Err(Fault::InvalidInstruction { pc, opcode: instruction.opcode }),
    };

    let result = match operation {

      Operation::Exit => {
        return Ok(Some(b_value));
      }

      operation => {
        match operation.apply(self.memory[a], b_value) {
          Some(value) => value,
          None => return Err(Fault::DivisionByZero { pc, operation }),
        }
      }

    };
    self.memory[a] = result;

    #[cfg(feature = "trace_computation")] println!("{}", self);

    Ok(None)
  }

  fn fetch(&mut self) -> Result<Instruction, Fault> {
    if self.pc >= self.code.len() {
      return Err(Fault::InvalidPc { pc: self.pc, code_size: self.code.len() });
    }

    let instruction = decode_instruction(self.code[self.pc]);
    self.pc += 1;
    self.current = Some(instruction);
    Ok(instruction)
  }

  /// Operand A is the destination and is always a memory cell.
  fn resolve_a(&self, pc: usize, instruction: &Instruction) -> Result<Address, Fault> {
    let address = instruction.a as Address;
    if address >= self.memory.len() {
      return Err(Fault::InvalidMemoryAccess {
        pc,
        field    : Field::A,
        address,
        data_size: self.memory.len(),
      });
    }
    Ok(address)
  }

  /// Operand B is either an immediate, which needs no check, or a memory cell, which does.
  fn resolve_b(&self, pc: usize, instruction: &Instruction) -> Result<Operand, Fault> {
    let operand = instruction.operand_b();
    match operand {

      Operand::Memory(address) if address >= self.memory.len() => {
        Err(Fault::InvalidMemoryAccess {
          pc,
          field    : Field::B,
          address,
          data_size: self.memory.len(),
        })
      }

      _ => Ok(operand)

    }
  }

  fn value_of(&self, operand: Operand) -> u8 {
    match operand {
      Operand::Memory(address)  => self.memory[address],
      Operand::Immediate(value) => value,
    }
  }

  // endregion

}

/**
  Runs `code` over `memory` from pc 0 and returns the exit code. Memory keeps the effects of
  every instruction that completed, including when the run faults.
*/
pub fn run(code: &[Word], memory: &mut [u8]) -> Result<u8, Fault> {
  Machine::new(code, memory).run()
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<'m> Display for Machine<'m> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let highlight = self.current.map(|instruction| instruction.a as Address);
    let m_table   = Machine::make_memory_table(&*self.memory, highlight);

    let instruction = match self.current {
      Some(instruction) => instruction.to_string(),
      None              => "-".to_string()
    };

    write!(
      f,
      "PC: {}\tLast: {}\t{}\n{}",
      self.pc, instruction, self.status, m_table
    )
  }
}
