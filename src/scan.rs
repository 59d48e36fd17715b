//! Input collection, tokenization and ingestion into a [`FrequencyIndex`].

use std::collections::HashSet;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{FrequencyIndex, SharedIndex};

/// Per-file outcome of a scan, written to the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    pub path: PathBuf,
    /// Words recorded in the index.
    pub counted: usize,
    /// Tokens rejected by [`word_is_valid`].
    pub ignored: usize,
    pub elapsed: Duration,
}

/// Accepted words of one file, in input order.
#[derive(Debug, Clone)]
pub struct FileScan {
    pub path: PathBuf,
    pub words: Vec<String>,
    pub ignored: usize,
}

/// Expand `inputs` into the list of regular files to read.
///
/// Files are taken as given. A directory contributes the files directly in
/// it, and those of its subdirectories when `recursive` is set; entries are
/// visited in name order and hidden entries are skipped. Symbolic links are
/// only followed with `follow_links`. Excluded files and files already
/// collected (by canonical path) are dropped. Inputs that cannot be read are
/// reported on stderr and skipped.
pub fn collect_files(inputs: &[PathBuf], cfg: &Config) -> Vec<PathBuf> {
    let mut walker = Walker {
        cfg,
        seen: HashSet::new(),
        visited_dirs: HashSet::new(),
        out: Vec::new(),
    };
    for input in inputs {
        walker.visit(input, true);
    }
    walker.out
}

struct Walker<'a> {
    cfg: &'a Config,
    seen: HashSet<PathBuf>,
    visited_dirs: HashSet<PathBuf>,
    out: Vec<PathBuf>,
}

impl Walker<'_> {
    fn visit(&mut self, path: &Path, top_level: bool) {
        let link = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                eprintln!("swordx: skipping {}", Error::io(path, e));
                return;
            }
        };
        if link.file_type().is_symlink() && !self.cfg.follow_links {
            if top_level {
                eprintln!("swordx: skipping symbolic link {}", path.display());
            }
            return;
        }
        let canonical = match fs::canonicalize(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("swordx: skipping {}", Error::io(path, e));
                return;
            }
        };
        let meta = match fs::metadata(&canonical) {
            Ok(meta) => meta,
            Err(e) => {
                eprintln!("swordx: skipping {}", Error::io(path, e));
                return;
            }
        };

        if meta.is_dir() {
            if top_level || self.cfg.recursive {
                self.visit_dir(path, canonical);
            }
        } else if meta.is_file() {
            if self.cfg.is_excluded(&canonical) {
                return;
            }
            if self.seen.insert(canonical) {
                self.out.push(path.to_path_buf());
            }
        }
    }

    fn visit_dir(&mut self, dir: &Path, canonical: PathBuf) {
        // Guards against link cycles when following links.
        if !self.visited_dirs.insert(canonical) {
            return;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("swordx: skipping {}", Error::io(dir, e));
                return;
            }
        };
        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.path())
            .collect();
        children.sort();
        for child in children {
            self.visit(&child, false);
        }
    }
}

/// Split on ASCII whitespace and punctuation, lowercasing each token.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_ascii_whitespace() || c.is_ascii_punctuation())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
}

/// Whether a lowercased token should be recorded under `cfg`.
///
/// `min_len` counts bytes, which equals characters only because the ASCII
/// check comes first. Keep that order.
pub fn word_is_valid(word: &str, cfg: &Config) -> bool {
    !word.is_empty()
        && word.bytes().all(|b| b.is_ascii_alphanumeric())
        && word.len() >= cfg.min_len
        && (!cfg.alpha_only || word.bytes().all(|b| b.is_ascii_alphabetic()))
        && !cfg.ignore.contains(word)
}

/// Read `path` and split it into accepted words. Invalid UTF-8 is replaced
/// rather than rejected, so the bytes around it still tokenize.
pub fn scan_file(path: &Path, cfg: &Config) -> Result<FileScan> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let mut words = Vec::new();
    let mut ignored = 0;
    for token in tokenize(&text) {
        if word_is_valid(&token, cfg) {
            words.push(token);
        } else {
            ignored += 1;
        }
    }
    Ok(FileScan {
        path: path.to_path_buf(),
        words,
        ignored,
    })
}

/// Scan every file and record its words in `index`.
///
/// Unreadable files are reported and skipped; index failures abort the run.
/// With `cfg.threads > 1` files are scanned by that many workers feeding a
/// [`SharedIndex`]. Stats come back in the order of `files` either way.
pub fn ingest(files: &[PathBuf], cfg: &Config, index: &mut FrequencyIndex) -> Result<Vec<FileStats>> {
    if cfg.threads > 1 && files.len() > 1 {
        return ingest_parallel(files, cfg, index);
    }
    let mut stats = Vec::with_capacity(files.len());
    for path in files {
        let start = Instant::now();
        let scan = match scan_file(path, cfg) {
            Ok(scan) => scan,
            Err(err) => {
                eprintln!("swordx: skipping {err}");
                continue;
            }
        };
        for word in &scan.words {
            index.record(word)?;
        }
        stats.push(finish(scan, start));
    }
    Ok(stats)
}

fn ingest_parallel(
    files: &[PathBuf],
    cfg: &Config,
    index: &mut FrequencyIndex,
) -> Result<Vec<FileStats>> {
    let shared = SharedIndex::new(mem::take(index));
    let next = AtomicUsize::new(0);
    let workers = cfg.threads.min(files.len());

    let results: Vec<Result<Vec<(usize, FileStats)>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(|| -> Result<Vec<(usize, FileStats)>> {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = files.get(i) else {
                            break;
                        };
                        let start = Instant::now();
                        match scan_file(path, cfg) {
                            Ok(scan) => {
                                shared.record_all(&scan.words)?;
                                done.push((i, finish(scan, start)));
                            }
                            Err(err) => eprintln!("swordx: skipping {err}"),
                        }
                    }
                    Ok(done)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    *index = shared.into_inner();
    let mut stats = Vec::with_capacity(files.len());
    for result in results {
        stats.extend(result?);
    }
    stats.sort_by_key(|(i, _)| *i);
    Ok(stats.into_iter().map(|(_, s)| s).collect())
}

fn finish(scan: FileScan, start: Instant) -> FileStats {
    FileStats {
        path: scan.path,
        counted: scan.words.len(),
        ignored: scan.ignored,
        elapsed: start.elapsed(),
    }
}
