//! Mach-O constants needed by dead-stripping. Values match the definitions in
//! `<mach-o/loader.h>`.

use bitflags::bitflags;

bitflags! {
    /// Attribute bits from the high bytes of a section header's `flags` field.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SectionAttributes: u32 {
        /// `S_ATTR_PURE_INSTRUCTIONS`: the section contains only machine instructions.
        const PURE_INSTRUCTIONS = 0x8000_0000;

        /// `S_ATTR_NO_DEAD_STRIP`: the section must never be dead-stripped.
        const NO_DEAD_STRIP = 0x1000_0000;

        /// `S_ATTR_LIVE_SUPPORT`: the section is kept only while something already live
        /// references it.
        const LIVE_SUPPORT = 0x0800_0000;
    }
}

/// Section types from the low byte of a section header's `flags` field. Only the types that
/// influence dead-stripping are distinguished; everything else reads as `Regular`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SectionKind {
    #[default]
    Regular,
    ZeroFill,

    /// `S_MOD_INIT_FUNC_POINTERS`: a table of module initialiser pointers.
    ModInitFuncPointers,

    /// `S_MOD_TERM_FUNC_POINTERS`: a table of module terminator pointers.
    ModTermFuncPointers,
}

pub const SEG_TEXT: &[u8] = b"__TEXT";
pub const SECT_TEXT: &[u8] = b"__text";

/// The runtime routine that resolves lazy symbol bindings. Stubs jump through it, so it has
/// to survive even when no relocation points at it.
pub const STUB_BINDER_NAME: &[u8] = b"dyld_stub_binder";

/// Entry point used for executable outputs when no `-e` flag is given.
pub const DEFAULT_ENTRY_NAME: &str = "_main";
