//! Process-wide linker state: the input object files, the subsection arena and the global
//! symbol table. The parsing and resolution stages populate this, then each pass mutates it
//! in place.

use crate::args::Args;
use crate::subsection::InputSection;
use crate::subsection::Subsection;
use crate::subsection::SubsectionId;
use crate::symbol::Symbol;
use crate::symbol_db::SymbolDb;
use crate::symbol_db::SymbolId;
use std::path::PathBuf;

/// Identifies an input file. The ID is an index into [`Context::objs`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(u32);

impl FileId {
    pub(crate) fn from_usize(value: usize) -> FileId {
        FileId(u32::try_from(value).expect("Input files overflowed 32 bits"))
    }

    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// One compiled input unit, together with the symbols and subsections carved out of it.
pub struct ObjectFile<'data> {
    pub name: PathBuf,

    /// Parent section headers, indexed by `Subsection::section_index`.
    pub sections: Vec<InputSection<'data>>,

    /// Symbols this file mentions, in symbol table order. The entries whose `Symbol::file` is
    /// this file are the ones it defines; the rest are imports.
    pub symbols: Vec<SymbolId>,

    /// Membership list of the file's subsections in input order. The sweeper drops dead
    /// entries from this list; the arena in [`Context`] keeps the storage.
    pub subsections: Vec<SubsectionId>,
}

pub struct Context<'data> {
    pub args: Args,
    pub objs: Vec<ObjectFile<'data>>,
    pub symbol_db: SymbolDb<'data>,
    pub(crate) subsections: Vec<Subsection>,
}

impl<'data> Context<'data> {
    pub fn new(args: Args) -> Context<'data> {
        Context {
            args,
            objs: Vec::new(),
            symbol_db: SymbolDb::default(),
            subsections: Vec::new(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<PathBuf>) -> FileId {
        let id = FileId::from_usize(self.objs.len());
        self.objs.push(ObjectFile {
            name: name.into(),
            sections: Vec::new(),
            symbols: Vec::new(),
            subsections: Vec::new(),
        });
        id
    }

    pub fn add_section(&mut self, file: FileId, section: InputSection<'data>) -> usize {
        let sections = &mut self.objs[file.as_usize()].sections;
        sections.push(section);
        sections.len() - 1
    }

    /// Carves a new subsection out of `file`'s section `section_index` and appends it to the
    /// file's membership list.
    pub fn add_subsection(
        &mut self,
        file: FileId,
        section_index: usize,
        size: u64,
    ) -> SubsectionId {
        let id = SubsectionId::from_usize(self.subsections.len());
        self.subsections.push(Subsection::new(file, section_index, size));
        self.objs[file.as_usize()].subsections.push(id);
        id
    }

    /// Adds `symbol` to the global table and, if it has a defining file, to that file's symbol
    /// list.
    pub fn add_symbol(&mut self, symbol: Symbol<'data>) -> SymbolId {
        let file = symbol.file;
        let id = self.symbol_db.add(symbol);
        if let Some(file) = file {
            self.objs[file.as_usize()].symbols.push(id);
        }
        id
    }

    pub fn subsection(&self, id: SubsectionId) -> &Subsection {
        &self.subsections[id.as_usize()]
    }

    pub fn subsection_mut(&mut self, id: SubsectionId) -> &mut Subsection {
        &mut self.subsections[id.as_usize()]
    }

    /// Looks up the parent section header of `subsection`.
    pub fn input_section(&self, subsection: &Subsection) -> &InputSection<'data> {
        &self.objs[subsection.file.as_usize()].sections[subsection.section_index]
    }

    pub(crate) fn subsections(&self) -> impl Iterator<Item = &Subsection> {
        self.subsections.iter()
    }
}
