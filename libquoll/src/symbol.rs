use crate::context::FileId;
use crate::subsection::SubsectionId;
use bitflags::bitflags;
use std::fmt::Display;

/// Name of a symbol as it appears in an input file's string table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolName<'data> {
    bytes: &'data [u8],
}

impl<'data> SymbolName<'data> {
    pub fn new(bytes: &'data [u8]) -> SymbolName<'data> {
        Self { bytes }
    }

    pub fn bytes(&self) -> &'data [u8] {
        self.bytes
    }
}

impl std::borrow::Borrow<[u8]> for SymbolName<'_> {
    fn borrow(&self) -> &[u8] {
        self.bytes
    }
}

impl Display for SymbolName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Ok(s) = std::str::from_utf8(self.bytes) {
            Display::fmt(s, f)
        } else {
            write!(f, "INVALID UTF-8({:?})", self.bytes)
        }
    }
}

impl std::fmt::Debug for SymbolName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

bitflags! {
    /// `n_desc` bits that affect liveness.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SymbolFlags: u8 {
        /// `N_NO_DEAD_STRIP`: the symbol's subsection must be kept.
        const NO_DEAD_STRIP = 1 << 0;

        /// `REFERENCED_DYNAMICALLY`: referenced at runtime by name, e.g. via `dlsym`, so no
        /// static reference will ever be visible to us.
        const REFERENCED_DYNAMICALLY = 1 << 1;
    }
}

/// Visibility of a symbol within the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Not visible outside the defining translation unit.
    Local,

    /// Visible to the rest of the link, but hidden from the output's export table
    /// (`.private_extern`).
    PrivateExtern,

    /// Globally visible and exported.
    Extern,
}

/// A resolved symbol table entry. Symbols are interned process-wide by
/// [`SymbolDb`](crate::symbol_db::SymbolDb); the per-file symbol lists reference them by ID.
#[derive(Debug)]
pub struct Symbol<'data> {
    pub name: SymbolName<'data>,

    /// The file that defines this symbol. None for symbols that are undefined or that come
    /// from outside the set of loaded object files.
    pub file: Option<FileId>,

    pub scope: Scope,

    pub flags: SymbolFlags,

    /// The subsection that holds the symbol's storage. None for absolute and undefined
    /// symbols. The sweeper clears this when the subsection is discarded.
    pub subsection: Option<SubsectionId>,
}
