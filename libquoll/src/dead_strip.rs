//! Removes unreferenced subsections before layout. A subsection survives if it's reachable
//! from the root set by following relocation and unwind edges, or if its section carries the
//! live-support attribute and something already live points at it. Everything else is dropped
//! from the per-file subsection lists, and any symbol defined on dropped storage loses its
//! target.
//!
//! Marking only ever flips per-subsection atomic flags, so the traversal can fan out across
//! threads; list mutation is confined to the sweep, which runs strictly after marking.

use crate::args::OutputType;
use crate::context::Context;
use crate::context::FileId;
use crate::error::Result;
use crate::gc_stats;
use crate::macho::STUB_BINDER_NAME;
use crate::macho::SectionAttributes;
use crate::macho::SectionKind;
use crate::subsection::Relocation;
use crate::subsection::Subsection;
use crate::subsection::SubsectionId;
use crate::symbol::Scope;
use crate::symbol::SymbolFlags;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;
use smallvec::SmallVec;
use smallvec::smallvec;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Runs the whole pass: root-set collection, reachability marking with the live-support fixed
/// point, then the sweep. Runs at most once per link.
#[tracing::instrument(skip_all, name = "Dead strip")]
pub fn dead_strip(ctx: &mut Context) -> Result {
    if !ctx.args.dead_strip {
        return Ok(());
    }

    let root_set = collect_root_set(ctx);
    mark(ctx, &root_set);
    gc_stats::maybe_write_gc_stats(ctx)?;
    sweep(ctx);
    Ok(())
}

/// Collects the subsections that must survive no matter what references them. Lookups that
/// don't resolve to a subsection contribute nothing; an absent optional root is a valid
/// configuration, not an error.
#[tracing::instrument(skip_all, name = "Collect root set")]
fn collect_root_set(ctx: &Context) -> Vec<SubsectionId> {
    let mut root_set = Vec::new();

    let subsection_of = |name: &[u8]| -> Option<SubsectionId> {
        let id = ctx.symbol_db.get(name)?;
        ctx.symbol_db.symbol(id).subsection
    };

    if let Some(entry) = &ctx.args.entry {
        root_set.extend(subsection_of(entry.as_bytes()));
    }

    // A dylib or bundle has no single entry point. Anything the output exports, or that the
    // runtime may reach by name, is a root. Imported symbols that happen to appear in a
    // file's symbol list are skipped; only the defining file contributes them.
    if matches!(ctx.args.output_type, OutputType::Dylib | OutputType::Bundle) {
        for (i, file) in ctx.objs.iter().enumerate() {
            let file_id = FileId::from_usize(i);
            for &symbol_id in &file.symbols {
                let symbol = ctx.symbol_db.symbol(symbol_id);
                if symbol.file == Some(file_id)
                    && (symbol.scope == Scope::Extern
                        || symbol.flags.intersects(
                            SymbolFlags::NO_DEAD_STRIP | SymbolFlags::REFERENCED_DYNAMICALLY,
                        ))
                {
                    root_set.extend(symbol.subsection);
                }
            }
        }
    }

    // Sections the ABI obliges us to keep whether or not any symbol in them is visible.
    for file in &ctx.objs {
        for &subsection_id in &file.subsections {
            let section = &file.sections[ctx.subsection(subsection_id).section_index];
            if section.attributes.contains(SectionAttributes::NO_DEAD_STRIP)
                || matches!(
                    section.kind,
                    SectionKind::ModInitFuncPointers | SectionKind::ModTermFuncPointers
                )
            {
                root_set.push(subsection_id);
            }
        }
    }

    for name in &ctx.args.undefined {
        if let Some(symbol_id) = ctx.symbol_db.get(name.as_bytes()) {
            let symbol = ctx.symbol_db.symbol(symbol_id);
            if symbol.file.is_some() {
                root_set.extend(symbol.subsection);
            }
        }
    }

    // Lazy-binding stubs jump through the stub binder, so it must survive even though no
    // relocation mentions it.
    root_set.extend(subsection_of(STUB_BINDER_NAME));

    tracing::debug!(roots = root_set.len(), "collected dead-strip roots");
    root_set
}

/// Marks everything reachable from the root set, then repeatedly folds in live-support
/// subsections until a scan makes no progress. The final live set is the least fixed point of
/// the reachability relation over the roots, so neither traversal order nor thread scheduling
/// can change it.
#[tracing::instrument(skip_all, name = "Mark live subsections")]
fn mark(ctx: &Context, root_set: &[SubsectionId]) {
    // Liveness is write-once for the remainder of the pass.
    for subsection in ctx.subsections() {
        subsection.reset_alive();
    }

    root_set.par_iter().for_each(|&id| visit(ctx, id));

    // A live-support subsection becomes live once any of its own relocation targets is.
    // Every scan either marks at least one previously-dead subsection or ends the loop, so
    // the subsection count bounds the number of iterations.
    loop {
        let marked_any = AtomicBool::new(false);

        ctx.objs.par_iter().for_each(|file| {
            for &subsection_id in &file.subsections {
                let subsection = ctx.subsection(subsection_id);
                let section = &file.sections[subsection.section_index];
                if section.attributes.contains(SectionAttributes::LIVE_SUPPORT)
                    && !subsection.is_alive()
                    && refers_live_subsection(ctx, subsection)
                {
                    visit(ctx, subsection_id);
                    marked_any.store(true, Ordering::Relaxed);
                }
            }
        });

        if !marked_any.into_inner() {
            break;
        }
    }
}

/// Marks `root` and everything transitively reachable from it as alive.
///
/// The graph can contain cycles (mutually recursive functions are routine), so the atomic
/// mark doubles as the visited set. An explicit stack rather than call recursion keeps deep
/// reference chains from overflowing the native stack.
fn visit(ctx: &Context, root: SubsectionId) {
    let mut stack: SmallVec<[SubsectionId; 32]> = smallvec![root];

    while let Some(id) = stack.pop() {
        let subsection = ctx.subsection(id);
        if !subsection.mark_alive() {
            continue;
        }

        for relocation in subsection.relocations() {
            match *relocation {
                Relocation::Symbol(symbol_id) => {
                    stack.extend(ctx.symbol_db.symbol(symbol_id).subsection);
                }
                Relocation::Subsection(target) => stack.push(target),
            }
        }

        for record in subsection.unwind_records() {
            stack.push(record.function);
            stack.extend(record.lsda);
            if let Some(personality) = record.personality {
                stack.extend(ctx.symbol_db.symbol(personality).subsection);
            }
        }
    }
}

/// Whether any relocation in `subsection` targets a subsection that has already been marked.
fn refers_live_subsection(ctx: &Context, subsection: &Subsection) -> bool {
    subsection.relocations().iter().any(|relocation| match *relocation {
        Relocation::Symbol(symbol_id) => ctx
            .symbol_db
            .symbol(symbol_id)
            .subsection
            .is_some_and(|target| ctx.subsection(target).is_alive()),
        Relocation::Subsection(target) => ctx.subsection(target).is_alive(),
    })
}

/// Nulls out symbols defined on dead subsections, then drops the dead subsections from each
/// file's membership list, preserving the order of the survivors. Arena storage is left
/// untouched so that IDs held by live symbols stay valid.
#[tracing::instrument(skip_all, name = "Sweep dead subsections")]
fn sweep(ctx: &mut Context) {
    let Context {
        objs,
        symbol_db,
        subsections,
        ..
    } = ctx;

    for (i, file) in objs.iter().enumerate() {
        let file_id = FileId::from_usize(i);
        for &symbol_id in &file.symbols {
            let symbol = symbol_db.symbol(symbol_id);
            if symbol.file != Some(file_id) {
                continue;
            }
            if symbol
                .subsection
                .is_some_and(|id| !subsections[id.as_usize()].is_alive())
            {
                symbol_db.symbol_mut(symbol_id).subsection = None;
            }
        }
    }

    for file in objs.iter_mut() {
        file.subsections
            .retain(|id| subsections[id.as_usize()].is_alive());
    }
}
