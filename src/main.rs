//! swordx CLI: count the words of a set of files.
//!
//! Thin wrapper over the `swordx` library crate.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use swordx::output::{read_counts, write_log, write_words};
use swordx::scan::{collect_files, ingest};
use swordx::{Config, Error, FrequencyIndex, Result};

/// swordx: count word occurrences across files and directories.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Files or directories to read.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Also descend into subdirectories.
    #[arg(short, long)]
    recursive: bool,

    /// Follow symbolic links.
    #[arg(short, long)]
    follow: bool,

    /// File to leave out (repeatable).
    #[arg(short, long, value_name = "FILE")]
    exclude: Vec<PathBuf>,

    /// Only count purely alphabetic words.
    #[arg(short, long)]
    alpha: bool,

    /// Ignore words shorter than this.
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    min: usize,

    /// File listing words to ignore, one per line.
    #[arg(short, long, value_name = "FILE")]
    ignore: Option<PathBuf>,

    /// List words by occurrence count instead of alphabetically.
    #[arg(short, long)]
    sortbyoccurrency: bool,

    /// Merge the counts of a previous output file into this run.
    #[arg(short, long, value_name = "FILE")]
    update: Option<PathBuf>,

    /// Result file.
    #[arg(short, long, value_name = "FILE", default_value = "swordx.out")]
    output: PathBuf,

    /// Write per-file statistics here.
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Ingestion worker threads.
    #[arg(short = 'j', long, value_name = "N", default_value_t = 1)]
    threads: usize,
}

fn config_from(args: &Args) -> Result<Config> {
    let mut cfg = Config {
        recursive: args.recursive,
        follow_links: args.follow,
        alpha_only: args.alpha,
        min_len: args.min,
        threads: args.threads,
        ..Config::default()
    };
    for path in &args.exclude {
        match cfg.add_exclude(path) {
            Ok(()) => {}
            // Nothing to exclude if it does not exist.
            Err(Error::Io { .. }) => eprintln!("swordx: exclude {} not found", path.display()),
            Err(e) => return Err(e),
        }
    }
    if let Some(ref path) = args.ignore {
        cfg.load_ignore_file(path)?;
    }
    Ok(cfg)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(path, e))
}

fn run(args: Args) -> Result<()> {
    let cfg = config_from(&args)?;
    let mut index = FrequencyIndex::new();

    if let Some(ref path) = args.update {
        for (word, count) in read_counts(path)? {
            match index.record_n(&word, count) {
                Ok(_) => {}
                Err(Error::InvalidArgument(msg)) => {
                    eprintln!("swordx: {}: skipping entry: {msg}", path.display())
                }
                Err(e) => return Err(e),
            }
        }
    }

    let files = collect_files(&args.inputs, &cfg);
    let stats = ingest(&files, &cfg, &mut index)?;

    let entries = if args.sortbyoccurrency {
        index.emit_by_occurrence()
    } else {
        index.emit_by_alpha()
    };
    write_words(create(&args.output)?, entries).map_err(|e| Error::io(&args.output, e))?;

    if let Some(ref path) = args.log {
        write_log(create(path)?, &stats).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("swordx: {err}");
            ExitCode::FAILURE
        }
    }
}
