//! Word frequency index.
//!
//! A word's count lives in two places: its counter in the primary
//! [`PrefixMap`], and its membership in the bucket (a nested `PrefixMap`)
//! stored under that count in an [`OrderedMap`]. Every recorded occurrence
//! moves the word from its old bucket to the next one, so listing words by
//! count is an in-order walk with no sort at the end.
//!
//! Buckets are created the first time a count is reached and are kept even
//! once every word has moved on.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::ordered_map::OrderedMap;
use crate::prefix_map::{check_word, PrefixMap};

#[derive(Clone, Debug, Default)]
pub struct FrequencyIndex {
    primary: PrefixMap,
    buckets: OrderedMap<u64, PrefixMap>,
    total: u64,
}

impl FrequencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `word`, returning its new count.
    pub fn record(&mut self, word: &str) -> Result<u64> {
        self.record_n(word, 1)
    }

    /// Record `n` occurrences of `word` in one rebucketing step, returning
    /// its new count.
    ///
    /// Invalid arguments are rejected before either structure is touched. On
    /// allocation failure neither holds a partial update, though an empty
    /// bucket for the target count may remain.
    pub fn record_n(&mut self, word: &str, n: u64) -> Result<u64> {
        check_word(word)?;
        if n == 0 {
            return Err(Error::InvalidArgument(format!(
                "cannot record {word:?} zero times"
            )));
        }
        let old = self.primary.occurrences(word);
        let new = old.checked_add(n).ok_or_else(|| {
            Error::InvalidArgument(format!("count of {word:?} would overflow"))
        })?;

        self.buckets
            .get_or_insert_with(new, PrefixMap::new)?
            .set_occurrences(word, new)?;

        if let Err(err) = self.primary.insert(word, n) {
            if let Some(bucket) = self.buckets.get_mut(&new) {
                bucket.remove(word);
            }
            return Err(err);
        }

        if old > 0 {
            let removed = self
                .buckets
                .get_mut(&old)
                .and_then(|bucket| bucket.remove(word));
            debug_assert_eq!(removed, Some(old), "{word:?} missing from bucket {old}");
        }

        self.total = self.total.saturating_add(n);
        Ok(new)
    }

    /// Current count of `word`, zero if never recorded.
    pub fn occurrences(&self, word: &str) -> u64 {
        self.primary.occurrences(word)
    }

    /// Words currently at exactly `count` occurrences.
    pub fn bucket(&self, count: u64) -> Option<&PrefixMap> {
        self.buckets.get(&count)
    }

    pub fn words(&self) -> &PrefixMap {
        &self.primary
    }

    pub fn buckets(&self) -> &OrderedMap<u64, PrefixMap> {
        &self.buckets
    }

    pub fn distinct_words(&self) -> usize {
        self.primary.len()
    }

    /// Sum of all recorded occurrences.
    pub fn total_words(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Every word with its count in alphabet order.
    pub fn emit_by_alpha(&self) -> Vec<(String, u64)> {
        self.primary.to_word_list()
    }

    /// Every word with its count, lowest count first; words sharing a count
    /// keep alphabet order.
    pub fn emit_by_occurrence(&self) -> Vec<(String, u64)> {
        let mut out = Vec::with_capacity(self.primary.len());
        for (_, bucket) in self.buckets.iter() {
            out.extend(bucket.iter());
        }
        out
    }
}

/// A [`FrequencyIndex`] shared between ingestion threads.
///
/// The lock is held across a whole `record` so the read of the old count and
/// both structure updates happen as one step.
#[derive(Debug, Default)]
pub struct SharedIndex {
    inner: Mutex<FrequencyIndex>,
}

impl SharedIndex {
    pub fn new(index: FrequencyIndex) -> Self {
        Self {
            inner: Mutex::new(index),
        }
    }

    pub fn record(&self, word: &str) -> Result<u64> {
        self.inner.lock().record(word)
    }

    /// Record a batch of words under one lock acquisition.
    pub fn record_all<I, S>(&self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = self.inner.lock();
        for word in words {
            index.record(word.as_ref())?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> FrequencyIndex {
        self.inner.into_inner()
    }
}
