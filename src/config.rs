//! Options that shape which files are read and which words are counted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::prefix_map::PrefixMap;

/// Scan configuration, passed explicitly to every scan entry point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Descend into directories given as inputs.
    pub recursive: bool,
    /// Follow symbolic links, both as inputs and while walking.
    pub follow_links: bool,
    /// Files that are never read. Compared by canonical path.
    pub exclude: Vec<PathBuf>,
    /// Only count words made purely of letters.
    pub alpha_only: bool,
    /// Words shorter than this are ignored.
    pub min_len: usize,
    /// Words never counted.
    pub ignore: PrefixMap,
    /// Ingestion worker threads. `0` and `1` both mean sequential.
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recursive: false,
            follow_links: false,
            exclude: Vec::new(),
            alpha_only: false,
            min_len: 0,
            ignore: PrefixMap::new(),
            threads: 1,
        }
    }
}

impl Config {
    /// Add every word of an ignore file (one per line) to [`Config::ignore`].
    ///
    /// Blank lines and `#` comments are skipped. Lines that are not a valid
    /// word are reported on stderr and skipped. Returns the number of words
    /// added.
    pub fn load_ignore_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut added = 0;
        for (n, line) in content.lines().enumerate() {
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            match self.ignore.insert_word(word) {
                Ok(()) => added += 1,
                Err(Error::InvalidArgument(_)) => {
                    eprintln!("{}:{}: skipping invalid word {word:?}", path.display(), n + 1);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Canonicalize and remember `path` as excluded.
    pub fn add_exclude(&mut self, path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|e| Error::io(path, e))?;
        self.exclude.push(canonical);
        Ok(())
    }

    pub fn is_excluded(&self, canonical: &Path) -> bool {
        self.exclude.iter().any(|p| p == canonical)
    }
}
