use bimap::BiMap;
use string_cache::DefaultAtom;

use crate::operand::Address;

/**
  A symbol table is a mapping between the names of data memory cells declared in assembly and
  their addresses. The assembler resolves names to addresses with it, and listings resolve
  addresses back to names. A symbol table is really just a convenience wrapper around a BiMap.

*/
#[derive(Clone, Debug)]
pub struct SymbolTable {
  table: BiMap<DefaultAtom, Address>
}

impl SymbolTable {

  pub fn new() -> SymbolTable {
    SymbolTable {
      table: BiMap::new()
    }
  }

  pub fn get_symbol(&self, address: Address) -> Option<&DefaultAtom> {
    self.table.get_by_right(&address)
  }

  pub fn get_address(&self, name: &str) -> Option<Address> {
    self.table.get_by_left(&DefaultAtom::from(name)).cloned()
  }

  /// Fails with the rejected pair if either the name or the address is already taken.
  pub fn insert(&mut self, name: DefaultAtom, address: Address)
    -> Result<(), (DefaultAtom, Address)>{
    self.table.insert_no_overwrite(name, address)
  }
}
