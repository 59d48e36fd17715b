//! Line-based result and log files.
//!
//! Results are one `<word> <occurrences>` pair per line. The same format is
//! read back by [`read_counts`] so a previous run can be merged into a new
//! one.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::scan::FileStats;

pub fn write_words<W, I, S>(mut out: W, entries: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    for (word, count) in entries {
        writeln!(out, "{} {}", word.as_ref(), count)?;
    }
    out.flush()
}

/// Parse a results file. Blank lines are skipped; any other line must hold
/// exactly a word and a positive count.
pub fn read_counts(path: &Path) -> Result<Vec<(String, u64)>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut counts = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || Error::MalformedLine {
            path: path.to_path_buf(),
            line: n + 1,
        };
        let mut fields = line.split_whitespace();
        let (Some(word), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let count: u64 = count.parse().map_err(|_| malformed())?;
        if count == 0 {
            return Err(malformed());
        }
        counts.push((word.to_string(), count));
    }
    Ok(counts)
}

/// One line per file: `<path> cw <counted> iw <ignored> time <seconds>`.
pub fn write_log<W: Write>(mut out: W, stats: &[FileStats]) -> io::Result<()> {
    for s in stats {
        writeln!(
            out,
            "{} cw {} iw {} time {:.6}",
            s.path.display(),
            s.counted,
            s.ignored,
            s.elapsed.as_secs_f64()
        )?;
    }
    out.flush()
}
