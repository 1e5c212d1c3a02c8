//! Optionally writes dead-strip statistics to a text file. To use this, pass
//! `--write-gc-stats=/path/to/file.txt`.
//!
//! You can also ignore selected files by passing `--gc-stats-ignore=some-string`. Any files
//! that contain `some-string` in their filename will be ignored.
//!
//! By default, only the stats per input file and the totals for all input files are shown. If
//! you'd like to also see which subsections were discarded, run with `--verbose-gc-stats`.
//!
//! Note that only `__TEXT,__text` subsections are reported. Data and bss subsections are
//! commonly stripped too, but are ignored for the purpose of this report.

use crate::context::Context;
use crate::context::ObjectFile;
use crate::error::Result;
use crate::subsection::SubsectionId;
use anyhow::Context as _;
use itertools::Itertools;
use std::collections::HashMap;
use std::path::PathBuf;

pub(crate) fn maybe_write_gc_stats(ctx: &Context) -> Result {
    let Some(stats_file) = ctx.args.write_gc_stats.as_ref() else {
        return Ok(());
    };
    write_gc_stats(ctx, stats_file)
        .with_context(|| format!("Failed to write GC stats to `{}`", stats_file.display()))
}

struct InputFile {
    path: PathBuf,
    kept: u64,
    discarded: u64,
    discarded_names: Vec<String>,
}

fn write_gc_stats(ctx: &Context, stats_file: &std::path::Path) -> Result {
    use std::io::Write as _;

    let mut kept = 0;
    let mut discarded = 0;
    let mut files = HashMap::new();
    for file in &ctx.objs {
        let file_display_name = file.name.to_string_lossy();
        if ctx
            .args
            .gc_stats_ignore
            .iter()
            .any(|ignore| file_display_name.contains(ignore))
        {
            continue;
        }

        // Group by input filename. If the file is an archive, then there can be multiple
        // objects within it.
        let file_record = files.entry(&file.name).or_insert_with(|| InputFile {
            path: file.name.clone(),
            kept: 0,
            discarded: 0,
            discarded_names: Default::default(),
        });

        let mut file_kept = 0;
        let mut file_discarded = 0;
        for &subsection_id in &file.subsections {
            let subsection = ctx.subsection(subsection_id);
            if !ctx.input_section(subsection).is_text() {
                continue;
            }
            if subsection.is_alive() {
                file_kept += subsection.size;
            } else {
                file_discarded += subsection.size;
                if ctx.args.verbose_gc_stats {
                    file_record
                        .discarded_names
                        .push(subsection_display_name(ctx, file, subsection_id));
                }
            }
        }

        file_record.kept += file_kept;
        file_record.discarded += file_discarded;

        kept += file_kept;
        discarded += file_discarded;
    }

    let mut files = files.values().collect_vec();
    files.sort_by_key(|f| (f.discarded, &f.path));

    let mut out = std::io::BufWriter::new(
        std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(stats_file)?,
    );

    for f in &files {
        let total = f.discarded + f.kept;
        if total == 0 {
            continue;
        }
        let percent = f.discarded * 100 / total;
        writeln!(
            &mut out,
            "Discarded {}. {percent}% of {} from {}",
            Bytes(f.discarded),
            Bytes(total),
            f.path.display()
        )?;
        for name in &f.discarded_names {
            writeln!(&mut out, "  {name}")?;
        }
    }

    let total = kept + discarded;
    if total > 0 {
        let percent = discarded * 100 / total;
        writeln!(
            &mut out,
            "Discarded {}. {percent}% of all executable code ({}).",
            Bytes(discarded),
            Bytes(total)
        )?;
    }
    Ok(())
}

/// Best name we can give a discarded subsection: the first symbol defined on it, falling back
/// to its section name.
fn subsection_display_name(ctx: &Context, file: &ObjectFile, id: SubsectionId) -> String {
    file.symbols
        .iter()
        .find_map(|&symbol_id| {
            let symbol = ctx.symbol_db.symbol(symbol_id);
            (symbol.subsection == Some(id)).then(|| symbol.name.to_string())
        })
        .unwrap_or_else(|| ctx.input_section(ctx.subsection(id)).display_name())
}

struct Bytes(u64);

impl std::fmt::Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bytesize::to_string(self.0, true))
    }
}
