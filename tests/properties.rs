use proptest::prelude::*;

use exp1::bytecode::{decode_instruction, encode_instruction, Instruction, Operation};
use exp1::{run, Fault, Field, Operand};

proptest! {
  #[test]
  fn decoding_is_a_lossless_split(word in any::<u32>()) {
    let instruction = decode_instruction(word);
    prop_assert!(instruction.a < 0x1000);
    prop_assert!(instruction.b < 0x1000);
    prop_assert_eq!(encode_instruction(instruction), word);
  }

  #[test]
  fn flagged_b_resolves_to_truncated_payload(payload in 0u16..0x800, memory in prop::collection::vec(any::<u8>(), 1..16)) {
    let b = 0x800 | payload;
    prop_assert_eq!(Operand::from_b_field(b), Operand::Immediate(payload as u8));

    let code = [encode_instruction(Instruction { opcode: Operation::Exit.code(), a: 0, b })];
    let mut memory = memory;
    prop_assert_eq!(run(&code, &mut memory), Ok(payload as u8));
  }

  #[test]
  fn unflagged_b_reads_memory(memory in prop::collection::vec(any::<u8>(), 1..64), index in any::<prop::sample::Index>()) {
    let b = index.index(memory.len()) as u16;
    let expected = memory[b as usize];
    let code = [encode_instruction(Instruction { opcode: Operation::Exit.code(), a: 0, b })];
    let mut memory = memory;
    prop_assert_eq!(run(&code, &mut memory), Ok(expected));
  }

  #[test]
  fn out_of_range_destination_never_mutates(size in 1usize..32, a in 0u16..0x1000, opcode in any::<u8>()) {
    prop_assume!(a as usize >= size);
    let original = vec![0x5Au8; size];
    let mut memory = original.clone();
    let code = [encode_instruction(Instruction { opcode, a, b: 0x801 })];

    prop_assert_eq!(
      run(&code, &mut memory),
      Err(Fault::InvalidMemoryAccess { pc: 0, field: Field::A, address: a as usize, data_size: size })
    );
    prop_assert_eq!(memory, original);
  }
}
