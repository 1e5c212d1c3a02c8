//! The process-wide symbol table. Cross-file symbol resolution happens upstream; by the time
//! the passes in this crate run, each name maps to exactly one winning definition.

use crate::symbol::Symbol;
use crate::symbol::SymbolName;
use ahash::AHashMap;
use std::collections::hash_map::Entry;

/// An ID for a symbol. All symbols from all input files share one ID space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn from_usize(value: usize) -> SymbolId {
        SymbolId(u32::try_from(value).expect("Symbols overflowed 32 bits"))
    }

    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default)]
pub struct SymbolDb<'data> {
    symbols: Vec<Symbol<'data>>,
    ids_by_name: AHashMap<SymbolName<'data>, SymbolId>,
}

impl<'data> SymbolDb<'data> {
    /// Adds a symbol, interning it by name. If the name is already present then the existing
    /// entry wins and its ID is returned, matching what resolution already decided.
    pub fn add(&mut self, symbol: Symbol<'data>) -> SymbolId {
        match self.ids_by_name.entry(symbol.name) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = SymbolId::from_usize(self.symbols.len());
                entry.insert(id);
                self.symbols.push(symbol);
                id
            }
        }
    }

    /// Looks a symbol up by name. Returns None for names nothing in the link mentions, which
    /// callers treat as a best-effort miss rather than an error.
    pub fn get(&self, name: &[u8]) -> Option<SymbolId> {
        self.ids_by_name.get(name).copied()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol<'data> {
        &self.symbols[id.as_usize()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol<'data> {
        &mut self.symbols[id.as_usize()]
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }
}
