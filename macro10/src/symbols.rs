use pdp10::debugger::{symbol_key, Debugger};
use pdp10::Word;
use std::collections::HashMap;

pub const LABEL: u8 = 0o1;
pub const PRIVATE: u8 = 0o2;
pub const INTERNAL: u8 = 0o4;

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub value: Word,
    pub flags: u8,
    pub line: u32,
}

/// Program symbols, keyed by uppercased six-character names. Every
/// insertion is mirrored into the host's variable table so expressions can
/// reference the symbol.
#[derive(Default)]
pub struct SymbolTable {
    map: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Defines or reassigns a symbol. Redefining a LABEL is an error;
    /// reassigning anything else overwrites.
    pub fn define(
        &mut self,
        dbg: &mut Debugger,
        name: &str,
        value: Word,
        flags: u8,
        line: u32,
    ) -> Result<(), String> {
        let key = symbol_key(name);
        if let Some(existing) = self.map.get(&key) {
            if existing.flags & LABEL != 0 && flags & LABEL != 0 {
                return Err(format!("label {} redefined", key));
            }
        }
        dbg.set_variable(&key, value as i64);
        self.map.insert(key, Symbol { value, flags, line });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.map.get(&symbol_key(name))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn labels_do_not_redefine() {
        let mut dbg = Debugger::new();
        let mut symbols = SymbolTable::new();
        symbols.define(&mut dbg, "A", 1, LABEL, 1).unwrap();
        let err = symbols.define(&mut dbg, "A", 2, LABEL, 2).unwrap_err();
        assert_eq!(err, "label A redefined");
        assert_eq!(symbols.get("A").unwrap().line, 1);
    }

    #[test]
    fn values_overwrite() {
        let mut dbg = Debugger::new();
        let mut symbols = SymbolTable::new();
        symbols.define(&mut dbg, "X", 1, 0, 1).unwrap();
        symbols.define(&mut dbg, "X", 2, PRIVATE, 2).unwrap();
        assert_eq!(symbols.get("X").unwrap().value, 2);
        assert_eq!(dbg.get_variable("X"), Some(2));
    }

    #[test]
    fn names_fold_and_truncate() {
        let mut dbg = Debugger::new();
        let mut symbols = SymbolTable::new();
        symbols.define(&mut dbg, "longname", 5, 0, 1).unwrap();
        assert_eq!(symbols.get("LONGNA").unwrap().value, 5);
        assert_eq!(dbg.get_variable("LONGNA"), Some(5));
    }
}
