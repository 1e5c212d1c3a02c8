//! A handwritten parser for the subset of the platform linker's arguments that this crate
//! cares about.
//!
//! We don't use a third-party library like clap because we need to accept flags the way ld64
//! spells them: long options with a single dash (`-dead_strip`), the same option with one or
//! two dashes, and values either as a separate argument (`-e name`) or attached with an
//! equals sign (`--entry=name`).

use crate::error::Result;
use crate::error::warning;
use crate::macho::DEFAULT_ENTRY_NAME;
use anyhow::Context as _;
use anyhow::bail;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub struct Args {
    pub output_type: OutputType,

    /// Name of the entry-point symbol, if any. Executable outputs default to `_main`.
    pub entry: Option<String>,

    /// Symbol names the user asked us to treat as undefined and keep (`-u`).
    pub undefined: Vec<String>,

    /// Whether to remove subsections that aren't reachable from the root set.
    pub dead_strip: bool,

    pub num_threads: NonZeroUsize,

    /// If set, GC stats will be written to the specified filename.
    pub write_gc_stats: Option<PathBuf>,

    /// If set, and we're writing GC stats, then ignore any input files that contain any of
    /// the specified substrings.
    pub gc_stats_ignore: Vec<String>,

    pub verbose_gc_stats: bool,
}

/// The kind of output artifact being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// `MH_EXECUTE`: a main executable.
    Executable,

    /// `MH_DYLIB`: a dynamic library.
    Dylib,

    /// `MH_BUNDLE`: a loadable bundle.
    Bundle,
}

pub(crate) fn available_parallelism() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::new(1).unwrap())
}

impl Default for Args {
    fn default() -> Self {
        Args {
            output_type: OutputType::Executable,
            entry: None,
            undefined: Vec::new(),
            dead_strip: false,
            num_threads: available_parallelism(),
            write_gc_stats: None,
            gc_stats_ignore: Vec::new(),
            verbose_gc_stats: false,
        }
    }
}

// Parse the supplied input arguments, which should not include the program name.
pub fn parse<S: AsRef<str>, I: Iterator<Item = S>>(mut input: I) -> Result<Args> {
    let mut args = Args::default();
    let mut entry = None;

    while let Some(arg) = input.next() {
        let arg = arg.as_ref();

        fn strip_option(arg: &str) -> Option<&str> {
            arg.strip_prefix("--").or(arg.strip_prefix('-'))
        }
        let long_arg_eq = |option: &str| strip_option(arg) == Some(option);
        let long_arg_split_prefix = |option: &str| -> Option<&str> {
            strip_option(arg).and_then(|stripped_arg| stripped_arg.strip_prefix(option))
        };

        if long_arg_eq("execute") {
            args.output_type = OutputType::Executable;
        } else if long_arg_eq("dylib") {
            args.output_type = OutputType::Dylib;
        } else if long_arg_eq("bundle") {
            args.output_type = OutputType::Bundle;
        } else if long_arg_eq("dead_strip") {
            args.dead_strip = true;
        } else if long_arg_eq("e") || long_arg_eq("entry") {
            entry = Some(next_value(&mut input, arg)?);
        } else if let Some(rest) = long_arg_split_prefix("entry=") {
            entry = Some(rest.to_owned());
        } else if long_arg_eq("u") {
            args.undefined.push(next_value(&mut input, arg)?);
        } else if let Some(rest) = long_arg_split_prefix("threads=") {
            args.num_threads = rest
                .parse()
                .with_context(|| format!("Invalid number of threads `{rest}`"))?;
        } else if let Some(rest) = long_arg_split_prefix("write-gc-stats=") {
            args.write_gc_stats = Some(PathBuf::from(rest));
        } else if let Some(rest) = long_arg_split_prefix("gc-stats-ignore=") {
            args.gc_stats_ignore.push(rest.to_owned());
        } else if long_arg_eq("verbose-gc-stats") {
            args.verbose_gc_stats = true;
        } else if long_arg_eq("why_live") {
            // ld64's dead-strip debugging aid. TODO: record provenance during marking so we
            // can answer it instead of shrugging.
            let _ = next_value(&mut input, arg)?;
            warning("-why_live is not yet supported");
        } else {
            bail!("Unrecognised argument `{arg}`");
        }
    }

    if let Some(entry) = entry {
        args.entry = Some(entry);
    } else if args.output_type == OutputType::Executable {
        args.entry = Some(DEFAULT_ENTRY_NAME.to_owned());
    }

    Ok(args)
}

fn next_value<S: AsRef<str>, I: Iterator<Item = S>>(input: &mut I, arg: &str) -> Result<String> {
    Ok(input
        .next()
        .with_context(|| format!("Missing argument to {arg}"))?
        .as_ref()
        .to_owned())
}

impl Args {
    /// Builds the global rayon thread pool. The driver calls this once before linking starts.
    pub fn setup_thread_pool(&self) -> Result {
        ThreadPoolBuilder::new()
            .num_threads(self.num_threads.get())
            .build_global()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_link_invocation() {
        let args = parse(
            [
                "-dylib",
                "-e",
                "_start",
                "-u",
                "_keep_me",
                "-u",
                "_also_keep",
                "-dead_strip",
                "--threads=4",
                "--write-gc-stats=/tmp/stats.txt",
                "--gc-stats-ignore=libc",
                "--verbose-gc-stats",
            ]
            .iter(),
        )
        .unwrap();

        assert_eq!(args.output_type, OutputType::Dylib);
        assert_eq!(args.entry.as_deref(), Some("_start"));
        assert_eq!(args.undefined, vec!["_keep_me", "_also_keep"]);
        assert!(args.dead_strip);
        assert_eq!(args.num_threads.get(), 4);
        assert_eq!(
            args.write_gc_stats.as_deref(),
            Some(std::path::Path::new("/tmp/stats.txt"))
        );
        assert_eq!(args.gc_stats_ignore, vec!["libc"]);
        assert!(args.verbose_gc_stats);
    }

    #[test]
    fn executables_default_the_entry_point() {
        let args = parse(["-execute", "-dead_strip"].iter()).unwrap();
        assert_eq!(args.entry.as_deref(), Some("_main"));
    }

    #[test]
    fn libraries_have_no_default_entry_point() {
        let args = parse(["-bundle"].iter()).unwrap();
        assert_eq!(args.entry, None);
    }

    #[test]
    fn accepts_double_dash_and_attached_values() {
        let args = parse(["--dead_strip", "--entry=_begin"].iter()).unwrap();
        assert!(args.dead_strip);
        assert_eq!(args.entry.as_deref(), Some("_begin"));
    }

    #[test]
    fn rejects_unknown_arguments() {
        assert!(parse(["-no_such_flag"].iter()).is_err());
        assert!(parse(["-e"].iter()).is_err());
    }
}
