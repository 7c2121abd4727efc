//! Renders a code buffer as a human readable listing, one instruction per line.

use std::fmt::Write;

use crate::bytecode::{decode_instruction, Word};
use crate::operand::Operand;
use crate::symboltable::SymbolTable;

fn operand_text(operand: Operand, symbols: &SymbolTable) -> String {
  match operand.address().and_then(|address| symbols.get_symbol(address)) {
    Some(name) => name.to_string(),
    None       => operand.to_string()
  }
}

/**
  Lists each word as `pc  word  op a b  text`. The text is the disassembled instruction with
  memory operands replaced by the names in `symbols` where there are any. Words whose opcode is
  not an operation are listed as `.word`.
*/
pub fn listing(code: &[Word], symbols: &SymbolTable) -> String {
  let mut text = String::new();

  for (pc, word) in code.iter().enumerate() {
    let instruction = decode_instruction(*word);
    let disassembly = match instruction.operation() {
      Some(operation) => format!(
        "{} {}, {}",
        operation,
        operand_text(instruction.operand_a(), symbols),
        operand_text(instruction.operand_b(), symbols)
      ),
      None => instruction.to_string()
    };

    // Writing to a `String` cannot fail.
    let _ = writeln!(
      text,
      "{:>4}  {:08x}  {:02x} {:03x} {:03x}  {}",
      pc, word, instruction.opcode, instruction.a, instruction.b, disassembly
    );
  }

  text
}


#[cfg(test)]
mod tests {
  use string_cache::DefaultAtom;

  use super::*;

  #[test]
  fn substitutes_cell_names() {
    let mut symbols = SymbolTable::new();
    symbols.insert(DefaultAtom::from("x"), 0).unwrap();

    let text = listing(&[0x00_000_805, 0x0F_000_001, 0x07_000_000], &symbols);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "   0  00000805  00 000 805  add x, #5");
    assert_eq!(lines[1], "   1  0f000001  0f 000 001  exit x, [1]");
    assert_eq!(lines[2], "   2  07000000  07 000 000  .word 0x07000000");
  }
}
