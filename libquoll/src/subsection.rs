//! Subsections are the atomic unit of dead-stripping: contiguous chunks of code or data
//! carved out of an input section at symbol boundaries.

use crate::context::FileId;
use crate::macho::SECT_TEXT;
use crate::macho::SEG_TEXT;
use crate::macho::SectionAttributes;
use crate::macho::SectionKind;
use crate::symbol_db::SymbolId;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Identifies a subsection. All subsections from all input files live in one arena owned by
/// the context, so IDs stay valid for the whole link. The sweeper removes entries from the
/// per-file membership lists, never from the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubsectionId(u32);

impl SubsectionId {
    pub(crate) fn from_usize(value: usize) -> SubsectionId {
        SubsectionId(u32::try_from(value).expect("Subsections overflowed 32 bits"))
    }

    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Header-level details of an input section, shared by all subsections carved from it.
#[derive(Debug)]
pub struct InputSection<'data> {
    pub segment_name: &'data [u8],
    pub name: &'data [u8],
    pub attributes: SectionAttributes,
    pub kind: SectionKind,
}

impl<'data> InputSection<'data> {
    pub fn new(segment_name: &'data [u8], name: &'data [u8]) -> InputSection<'data> {
        InputSection {
            segment_name,
            name,
            attributes: SectionAttributes::empty(),
            kind: SectionKind::Regular,
        }
    }

    pub(crate) fn is_text(&self) -> bool {
        self.segment_name == SEG_TEXT && self.name == SECT_TEXT
    }

    pub(crate) fn display_name(&self) -> String {
        format!(
            "{},{}",
            String::from_utf8_lossy(self.segment_name),
            String::from_utf8_lossy(self.name)
        )
    }
}

/// A resolved relocation edge out of a subsection. Relocation decoding happened upstream; all
/// that's left to care about here is what the edge points at.
#[derive(Clone, Copy, Debug)]
pub enum Relocation {
    /// A relocation against a symbol, which may or may not resolve to a subsection.
    Symbol(SymbolId),

    /// A section-relative relocation that refers directly to another subsection, with no
    /// symbol involved.
    Subsection(SubsectionId),
}

/// Compact-unwind metadata associated with a subsection.
#[derive(Clone, Copy, Debug)]
pub struct UnwindRecord {
    /// The function subsection this record describes.
    pub function: SubsectionId,

    /// Language-specific data area consulted by the personality routine.
    pub lsda: Option<SubsectionId>,

    /// The personality routine invoked when unwinding through the function.
    pub personality: Option<SymbolId>,
}

pub struct Subsection {
    pub(crate) file: FileId,
    pub(crate) section_index: usize,
    pub size: u64,
    relocations: Vec<Relocation>,
    unwind_records: Vec<UnwindRecord>,
    is_alive: AtomicBool,
}

impl Subsection {
    pub(crate) fn new(file: FileId, section_index: usize, size: u64) -> Subsection {
        Subsection {
            file,
            section_index,
            size,
            relocations: Vec::new(),
            unwind_records: Vec::new(),
            is_alive: AtomicBool::new(false),
        }
    }

    pub fn push_relocation(&mut self, relocation: Relocation) {
        self.relocations.push(relocation);
    }

    pub fn push_unwind_record(&mut self, record: UnwindRecord) {
        self.unwind_records.push(record);
    }

    pub fn relocations(&self) -> &[Relocation] {
        &self.relocations
    }

    pub fn unwind_records(&self) -> &[UnwindRecord] {
        &self.unwind_records
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive.load(Ordering::Relaxed)
    }

    /// Atomically marks the subsection as alive, returning true if this call performed the
    /// transition. The previous value is the sole gate for whether the caller traverses the
    /// subsection's edges; a plain read-then-write would let two threads both see "dead" and
    /// both traverse.
    pub(crate) fn mark_alive(&self) -> bool {
        // The swap needs exclusive access to the cache line, which is wasteful when most
        // revisits hit an already-alive subsection, so check first.
        if self.is_alive.load(Ordering::Relaxed) {
            return false;
        }
        !self.is_alive.swap(true, Ordering::Relaxed)
    }

    pub(crate) fn reset_alive(&self) {
        self.is_alive.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_alive_transitions_once() {
        let subsection = Subsection::new(FileId::from_usize(0), 0, 0);
        assert!(!subsection.is_alive());
        assert!(subsection.mark_alive());
        assert!(!subsection.mark_alive());
        assert!(subsection.is_alive());

        subsection.reset_alive();
        assert!(!subsection.is_alive());
        assert!(subsection.mark_alive());
    }
}
