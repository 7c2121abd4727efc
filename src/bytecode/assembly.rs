/*!
  The human readable textual form of bytecode is called assembly. This module parses assembly
  with `nom` and leverages the `strum` derives of `Operation` to turn mnemonics into opcodes.

  ```text
  ; comment to end of line
  .size 8              ; data memory is at least 8 cells
  .cell x = 3          ; named cell, addresses assigned in declaration order
  .cell y              ; initial value 0
  add x, #5            ; immediate operand
  mul x, [1]           ; raw memory address
  exit x               ; `exit B` is `exit [0], B`
  ```

  Assembly is line oriented. Cell declarations are collected before any instruction is encoded,
  so an instruction may name a cell declared further down.
*/

use std::str::FromStr;

use log::warn;
use nom::{
  branch::alt,
  bytes::complete::tag,
  character::complete::{
    alpha1,
    alphanumeric1,
    char as one_char,
    digit1,
    hex_digit1,
    space0,
    space1
  },
  combinator::{map, map_res, opt, recognize},
  error::ErrorKind,
  multi::many0,
  sequence::{delimited, pair, preceded, tuple},
  IResult
};
use string_cache::DefaultAtom;
use thiserror::Error;

use crate::bytecode::{Instruction, Operation, Word, FieldType, A_MASK, IMMEDIATE_FLAG, IMMEDIATE_MASK};
use crate::fault::{Fault, Field};
use crate::symboltable::SymbolTable;
use crate::vm;

/// The number of cells operand A can address.
const MAX_MEMORY_SIZE: usize = A_MASK as usize + 1;

type ParseResult<'a, O> = IResult<&'a str, O, (&'a str, ErrorKind)>;

#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum AssemblyError {
  #[error("line {line}: cannot parse `{text}`")]
  Syntax { line: usize, text: String },

  #[error("line {line}: {name} is not an operation")]
  UnknownOperation { line: usize, name: String },

  #[error("line {line}: {operation} requires 2 operands but was given {given}")]
  WrongArity { line: usize, operation: Operation, given: usize },

  #[error("line {line}: cell `{name}` is already declared")]
  DuplicateCell { line: usize, name: String },

  #[error("line {line}: cell `{name}` is not declared")]
  UndefinedCell { line: usize, name: String },

  #[error("line {line}: address {address} does not fit operand {field}")]
  AddressOutOfRange { line: usize, field: Field, address: u64 },

  #[error("line {line}: memory size {size} exceeds the {limit} addressable cells")]
  SizeOutOfRange { line: usize, size: u64, limit: usize },

  #[error("line {line}: immediate {value} does not fit in 11 bits")]
  ImmediateOutOfRange { line: usize, value: u64 },

  #[error("line {line}: cell value {value} does not fit in a byte")]
  ValueOutOfRange { line: usize, value: u64 },

  #[error("line {line}: the destination of {operation} cannot be an immediate")]
  ImmediateDestination { line: usize, operation: Operation },
}

/// An assembled program: the code buffer, the initial data memory, and the names of its cells.
#[derive(Clone, Debug)]
pub struct Program {
  pub code   : Vec<Word>,
  pub memory : Vec<u8>,
  pub symbols: SymbolTable,
}

impl Program {
  /// Runs the program over its own memory, which keeps the final state.
  pub fn run(&mut self) -> Result<u8, Fault> {
    vm::run(&self.code, &mut self.memory)
  }
}

// region Syntax

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Argument<'a> {
  Address(u64),
  Name(&'a str),
  Immediate(u64),
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Line<'a> {
  Size(u64),
  Cell {
    name : &'a str,
    value: Option<u64>
  },
  Instruction {
    mnemonic: &'a str,
    a       : Argument<'a>,
    b       : Option<Argument<'a>>
  },
}

fn number(input: &str) -> ParseResult<u64> {
  alt((
    map_res(preceded(tag("0x"), hex_digit1), |digits: &str| u64::from_str_radix(digits, 16)),
    map_res(digit1, |digits: &str| digits.parse::<u64>()),
  ))(input)
}

fn identifier(input: &str) -> ParseResult<&str> {
  recognize(
    pair(
      alt((alpha1, tag("_"))),
      many0(alt((alphanumeric1, tag("_"))))
    )
  )(input)
}

fn argument(input: &str) -> ParseResult<Argument> {
  alt((
    map(preceded(one_char('#'), number), Argument::Immediate),
    map(
      delimited(pair(one_char('['), space0), number, pair(space0, one_char(']'))),
      Argument::Address
    ),
    map(identifier, Argument::Name),
  ))(input)
}

fn directive(input: &str) -> ParseResult<Line> {
  alt((
    map(preceded(pair(tag(".size"), space1), number), Line::Size),
    map(
      pair(
        preceded(pair(tag(".cell"), space1), identifier),
        opt(preceded(tuple((space0, one_char('='), space0)), number))
      ),
      |(name, value)| Line::Cell { name, value }
    ),
  ))(input)
}

fn instruction(input: &str) -> ParseResult<Line> {
  map(
    tuple((
      alpha1,
      preceded(space1, argument),
      opt(preceded(tuple((space0, one_char(','), space0)), argument)),
    )),
    |(mnemonic, a, b)| Line::Instruction { mnemonic, a, b }
  )(input)
}

/// Parses one line with its comment and surrounding space already stripped.
fn parse_line(line_number: usize, text: &str) -> Result<Line, AssemblyError> {
  match alt((directive, instruction))(text) {
    Ok(("", line)) => Ok(line),
    Ok((rest, _))  => Err(AssemblyError::Syntax { line: line_number, text: rest.to_string() }),
    Err(_)         => Err(AssemblyError::Syntax { line: line_number, text: text.to_string() }),
  }
}

// endregion

// region Encoding

struct Assembler {
  symbols: SymbolTable,
  cells  : Vec<u8>,
  size   : usize,
}

impl Assembler {

  fn declare(&mut self, line: usize, name: &str, value: Option<u64>) -> Result<(), AssemblyError> {
    let value = value.unwrap_or(0);
    if value > u8::max_value() as u64 {
      return Err(AssemblyError::ValueOutOfRange { line, value });
    }

    let address = self.cells.len();
    self.symbols
        .insert(DefaultAtom::from(name), address)
        .map_err(|_| AssemblyError::DuplicateCell { line, name: name.to_string() })?;
    self.cells.push(value as u8);
    Ok(())
  }

  /// Memory never needs more cells than operand A can address.
  fn resize(&mut self, line: usize, size: u64) -> Result<(), AssemblyError> {
    if size > MAX_MEMORY_SIZE as u64 {
      return Err(AssemblyError::SizeOutOfRange { line, size, limit: MAX_MEMORY_SIZE });
    }
    self.size = self.size.max(size as usize);
    Ok(())
  }

  fn lookup(&self, line: usize, name: &str) -> Result<u64, AssemblyError> {
    self.symbols
        .get_address(name)
        .map(|address| address as u64)
        .ok_or_else(|| AssemblyError::UndefinedCell { line, name: name.to_string() })
  }

  fn a_field(&self, line: usize, operation: Operation, argument: Argument)
    -> Result<FieldType, AssemblyError>
  {
    let address = match argument {
      Argument::Address(address) => address,
      Argument::Name(name)       => self.lookup(line, name)?,
      Argument::Immediate(_)     => {
        return Err(AssemblyError::ImmediateDestination { line, operation });
      }
    };

    if address > A_MASK as u64 {
      return Err(AssemblyError::AddressOutOfRange { line, field: Field::A, address });
    }
    Ok(address as FieldType)
  }

  fn b_field(&self, line: usize, argument: Argument) -> Result<FieldType, AssemblyError> {
    let address = match argument {
      Argument::Address(address) => address,
      Argument::Name(name)       => self.lookup(line, name)?,
      Argument::Immediate(value) => {
        if value > IMMEDIATE_MASK as u64 {
          return Err(AssemblyError::ImmediateOutOfRange { line, value });
        }
        if value > u8::max_value() as u64 {
          warn!("line {}: immediate {} will be truncated to {}", line, value, value as u8);
        }
        return Ok(IMMEDIATE_FLAG | value as FieldType);
      }
    };

    if address >= IMMEDIATE_FLAG as u64 {
      return Err(AssemblyError::AddressOutOfRange { line, field: Field::B, address });
    }
    Ok(address as FieldType)
  }

  fn encode(&self, line: usize, mnemonic: &str, a: Argument, b: Option<Argument>)
    -> Result<Word, AssemblyError>
  {
    let operation = Operation::from_str(mnemonic)
      .map_err(|_| AssemblyError::UnknownOperation { line, name: mnemonic.to_string() })?;

    let (a, b) = match (operation, b) {
      (_, Some(b))              => (a, b),
      // `exit B` leaves A at cell 0, which the machine still checks.
      (Operation::Exit, None)   => (Argument::Address(0), a),
      (operation, None)         => {
        return Err(AssemblyError::WrongArity { line, operation, given: 1 });
      }
    };

    let instruction = Instruction {
      opcode: operation.code(),
      a     : self.a_field(line, operation, a)?,
      b     : self.b_field(line, b)?,
    };
    Ok(instruction.encode())
  }

}

// endregion

/**
  Assembles `text` into a `Program`. Data memory is as large as the largest `.size` directive or
  the number of declared cells, whichever is greater. Addresses are only checked against the
  width of their instruction field; an address past the end of data memory assembles and faults
  when executed.
*/
pub fn parse_assembly(text: &str) -> Result<Program, AssemblyError> {
  let mut lines: Vec<(usize, Line)> = vec![];

  for (index, raw) in text.lines().enumerate() {
    let code = match raw.find(';') {
      Some(start) => &raw[..start],
      None        => raw
    }.trim();

    if !code.is_empty() {
      lines.push((index + 1, parse_line(index + 1, code)?));
    }
  }

  let mut assembler = Assembler {
    symbols: SymbolTable::new(),
    cells  : vec![],
    size   : 0,
  };

  for (line_number, line) in &lines {
    match line {
      Line::Size(size)         => assembler.resize(*line_number, *size)?,
      Line::Cell{name, value}  => assembler.declare(*line_number, name, *value)?,
      Line::Instruction { .. } => {}
    }
  }

  let mut code: Vec<Word> = vec![];
  for (line_number, line) in &lines {
    if let Line::Instruction { mnemonic, a, b } = line {
      code.push(assembler.encode(*line_number, mnemonic, *a, *b)?);
    }
  }

  let mut memory = assembler.cells;
  if memory.len() < assembler.size {
    memory.resize(assembler.size, 0);
  }

  Ok(Program {
    code,
    memory,
    symbols: assembler.symbols,
  })
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::{decode_instruction, encode_instruction};

  fn word(operation: Operation, a: FieldType, b: FieldType) -> Word {
    encode_instruction(Instruction { opcode: operation.code(), a, b })
  }

  #[test]
  fn parses_arguments() {
    assert_eq!(argument("#5"), Ok(("", Argument::Immediate(5))));
    assert_eq!(argument("#0x7ff"), Ok(("", Argument::Immediate(0x7FF))));
    assert_eq!(argument("[ 12 ]"), Ok(("", Argument::Address(12))));
    assert_eq!(argument("total_1"), Ok(("", Argument::Name("total_1"))));
  }

  #[test]
  fn parses_directives() {
    assert_eq!(parse_line(1, ".size 0x10"), Ok(Line::Size(16)));
    assert_eq!(parse_line(1, ".cell x = 3"), Ok(Line::Cell { name: "x", value: Some(3) }));
    assert_eq!(parse_line(1, ".cell y"), Ok(Line::Cell { name: "y", value: None }));
  }

  #[test]
  fn trailing_garbage_is_a_syntax_error() {
    assert_eq!(
      parse_line(4, "add [0], #1 #2"),
      Err(AssemblyError::Syntax { line: 4, text: " #2".to_string() })
    );
    assert!(parse_line(2, "add").is_err());
  }

  #[test]
  fn assembles_named_cells_and_immediates() {
    let program = parse_assembly(
      "; adds five
       .cell x = 3
       add x, #5
       exit x"
    ).unwrap();

    assert_eq!(program.code, vec![word(Operation::Add, 0, 0x805), word(Operation::Exit, 0, 0)]);
    assert_eq!(program.memory, vec![3]);
    assert_eq!(program.symbols.get_address("x"), Some(0));
  }

  #[test]
  fn forward_cell_references_resolve() {
    let program = parse_assembly("sub y, x\n.cell x = 1\n.cell y = 9\nexit y").unwrap();
    assert_eq!(decode_instruction(program.code[0]), Instruction { opcode: 0x01, a: 1, b: 0 });
  }

  #[test]
  fn size_may_fill_the_addressable_range() {
    let program = parse_assembly(".size 4096\nexit [0]").unwrap();
    assert_eq!(program.memory.len(), 4096);
  }

  #[test]
  fn size_pads_memory() {
    let program = parse_assembly(".cell x = 7\n.size 4\nexit [3]").unwrap();
    assert_eq!(program.memory, vec![7, 0, 0, 0]);
  }

  #[test]
  fn reports_errors_with_line_numbers() {
    assert_eq!(
      parse_assembly("\n\njmp [0], [1]").unwrap_err(),
      AssemblyError::UnknownOperation { line: 3, name: "jmp".to_string() }
    );
    assert_eq!(
      parse_assembly("add z, #1").unwrap_err(),
      AssemblyError::UndefinedCell { line: 1, name: "z".to_string() }
    );
    assert_eq!(
      parse_assembly(".cell x\n.cell x").unwrap_err(),
      AssemblyError::DuplicateCell { line: 2, name: "x".to_string() }
    );
    assert_eq!(
      parse_assembly("add [0], #2048").unwrap_err(),
      AssemblyError::ImmediateOutOfRange { line: 1, value: 2048 }
    );
    assert_eq!(
      parse_assembly("add [0], [2048]").unwrap_err(),
      AssemblyError::AddressOutOfRange { line: 1, field: Field::B, address: 2048 }
    );
    assert_eq!(
      parse_assembly("add [4096], [0]").unwrap_err(),
      AssemblyError::AddressOutOfRange { line: 1, field: Field::A, address: 4096 }
    );
    assert_eq!(
      parse_assembly("add #1, [0]").unwrap_err(),
      AssemblyError::ImmediateDestination { line: 1, operation: Operation::Add }
    );
    assert_eq!(
      parse_assembly("mul [0]").unwrap_err(),
      AssemblyError::WrongArity { line: 1, operation: Operation::Mul, given: 1 }
    );
    assert_eq!(
      parse_assembly("exit #1\n.size 0xFFFFFFFFFFFFFFFF").unwrap_err(),
      AssemblyError::SizeOutOfRange { line: 2, size: u64::max_value(), limit: 4096 }
    );
    assert_eq!(
      parse_assembly(".size 4097").unwrap_err(),
      AssemblyError::SizeOutOfRange { line: 1, size: 4097, limit: 4096 }
    );
    assert_eq!(
      parse_assembly(".cell x = 256").unwrap_err(),
      AssemblyError::ValueOutOfRange { line: 1, value: 256 }
    );
  }

  #[test]
  fn wide_immediates_assemble_untruncated() {
    let program = parse_assembly("add [0], #300").unwrap();
    assert_eq!(decode_instruction(program.code[0]).b, 0x800 | 300);
  }
}
