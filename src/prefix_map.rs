//! Prefix tree mapping words over `[0-9a-z]` to occurrence counters.
//!
//! Nodes live in a single arena (`Vec<Node>`) and refer to each other by
//! 32-bit index. Every child slot is owned by exactly one parent; the
//! `parent` index is a navigation aid used to rebuild a word from its
//! terminal node and never keeps anything alive.
//!
//! Removing a word clears its terminal marker and counter but leaves the
//! path in place, so a later insert of the same word reuses the nodes.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Number of symbols: digits `0-9` followed by letters `a-z`.
pub const ALPHABET: usize = 36;

type NodeId = u32;

const ROOT: NodeId = 0;
const NIL: NodeId = NodeId::MAX;

/// Child index of an ASCII byte, case-folded. Digits sort before letters.
#[inline]
fn symbol_index(b: u8) -> Option<usize> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as usize),
        b'a'..=b'z' => Some((b - b'a') as usize + 10),
        b'A'..=b'Z' => Some((b - b'A') as usize + 10),
        _ => None,
    }
}

#[inline]
fn symbol_byte(index: usize) -> u8 {
    debug_assert!(index < ALPHABET);
    if index < 10 {
        b'0' + index as u8
    } else {
        b'a' + (index - 10) as u8
    }
}

/// Translate a word into its child-index path, rejecting empty words and
/// anything outside the alphabet.
fn encode(word: &str) -> Result<SmallVec<[u8; 32]>> {
    if word.is_empty() {
        return Err(Error::invalid_word(word));
    }
    word.bytes()
        .map(|b| symbol_index(b).map(|i| i as u8))
        .collect::<Option<SmallVec<[u8; 32]>>>()
        .ok_or_else(|| Error::invalid_word(word))
}

/// Rejects exactly the words [`PrefixMap::insert`] would reject.
pub(crate) fn check_word(word: &str) -> Result<()> {
    encode(word).map(drop)
}

#[derive(Clone)]
struct Node {
    /// Lowercase ASCII symbol; `0` for the root.
    symbol: u8,
    /// Zero whenever `terminal` is false.
    occurrences: u64,
    terminal: bool,
    children: [NodeId; ALPHABET],
    parent: NodeId,
}

impl Node {
    fn new(symbol: u8, parent: NodeId) -> Self {
        Self {
            symbol,
            occurrences: 0,
            terminal: false,
            children: [NIL; ALPHABET],
            parent,
        }
    }
}

/// Word to counter map backed by a 36-way trie.
#[derive(Clone)]
pub struct PrefixMap {
    nodes: Vec<Node>,
    /// Number of terminal nodes.
    words: usize,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(0, NIL)],
            words: 0,
        }
    }

    /// Number of stored words.
    #[inline]
    pub fn len(&self) -> usize {
        self.words
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    /// Number of allocated nodes, root included. Removed words keep their
    /// paths, so this never shrinks.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add `occurrences` to the counter of `word`, creating it if needed.
    ///
    /// Repeated inserts accumulate. Fails with [`Error::InvalidArgument`] for
    /// an empty word, a word with characters outside `[0-9a-zA-Z]`, or a zero
    /// count, and with [`Error::AllocationFailure`] if the arena cannot grow.
    /// The map is untouched on failure.
    pub fn insert(&mut self, word: &str, occurrences: u64) -> Result<()> {
        if occurrences == 0 {
            return Err(Error::InvalidArgument(format!(
                "cannot insert {word:?} with zero occurrences"
            )));
        }
        let path = encode(word)?;
        let node = self.walk_or_create(&path)?;
        self.mark(node, occurrences, true);
        Ok(())
    }

    /// `insert(word, 1)`.
    pub fn insert_word(&mut self, word: &str) -> Result<()> {
        self.insert(word, 1)
    }

    /// Insert every word once, stopping at the first invalid one.
    pub fn insert_all<I, S>(&mut self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.insert_word(word.as_ref())?;
        }
        Ok(())
    }

    /// Overwrite the counter of `word`, inserting it first if absent.
    pub fn set_occurrences(&mut self, word: &str, count: u64) -> Result<()> {
        if count == 0 {
            return Err(Error::InvalidArgument(format!(
                "occurrence count for {word:?} must be positive"
            )));
        }
        let path = encode(word)?;
        match self.find_terminal(&path) {
            Some(node) => {
                self.nodes[node as usize].occurrences = count;
                Ok(())
            }
            None => {
                let node = self.walk_or_create(&path)?;
                self.mark(node, count, false);
                Ok(())
            }
        }
    }

    /// False for empty or invalid words.
    pub fn contains(&self, word: &str) -> bool {
        match encode(word) {
            Ok(path) => self.find_terminal(&path).is_some(),
            Err(_) => false,
        }
    }

    /// Stored counter of `word`; zero when absent, empty or invalid.
    pub fn occurrences(&self, word: &str) -> u64 {
        encode(word)
            .ok()
            .and_then(|path| self.find_terminal(&path))
            .map_or(0, |node| self.nodes[node as usize].occurrences)
    }

    /// Clear the word marker and counter of `word`, returning the old count.
    pub fn remove(&mut self, word: &str) -> Option<u64> {
        let path = encode(word).ok()?;
        let node = self.find_terminal(&path)?;
        let node = &mut self.nodes[node as usize];
        let old = node.occurrences;
        node.occurrences = 0;
        node.terminal = false;
        self.words -= 1;
        Some(old)
    }

    /// Every stored word with its counter, digits before letters, shorter
    /// prefixes before their extensions.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            map: self,
            stack: vec![ROOT],
        }
    }

    /// Collect [`PrefixMap::iter`] into a fresh vector.
    pub fn to_word_list(&self) -> Vec<(String, u64)> {
        self.iter().collect()
    }

    fn find_terminal(&self, path: &[u8]) -> Option<NodeId> {
        let mut node = ROOT;
        for &sym in path {
            let child = self.nodes[node as usize].children[sym as usize];
            if child == NIL {
                return None;
            }
            node = child;
        }
        self.nodes[node as usize].terminal.then_some(node)
    }

    fn walk_or_create(&mut self, path: &[u8]) -> Result<NodeId> {
        // Reserve the worst case up front so node creation below cannot fail
        // halfway down the path.
        self.nodes.try_reserve(path.len())?;
        let mut node = ROOT;
        for &sym in path {
            let child = self.nodes[node as usize].children[sym as usize];
            node = if child == NIL {
                let id = self.nodes.len() as NodeId;
                assert!(id != NIL, "prefix map node arena exhausted");
                self.nodes.push(Node::new(symbol_byte(sym as usize), node));
                self.nodes[node as usize].children[sym as usize] = id;
                id
            } else {
                child
            };
        }
        Ok(node)
    }

    fn mark(&mut self, node: NodeId, occurrences: u64, accumulate: bool) {
        let n = &mut self.nodes[node as usize];
        if !n.terminal {
            n.terminal = true;
            n.occurrences = 0;
            self.words += 1;
        }
        n.occurrences = if accumulate {
            n.occurrences.saturating_add(occurrences)
        } else {
            occurrences
        };
    }

    /// Rebuild the word ending at `node` by following parent links.
    fn word_of(&self, mut node: NodeId) -> String {
        let mut rev: SmallVec<[u8; 32]> = SmallVec::new();
        while node != ROOT {
            let n = &self.nodes[node as usize];
            rev.push(n.symbol);
            node = n.parent;
        }
        rev.reverse();
        // Symbols are always ASCII.
        rev.iter().map(|&b| b as char).collect()
    }
}

impl Default for PrefixMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PrefixMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Depth-first, symbol-ascending walk over terminal nodes.
pub struct Iter<'a> {
    map: &'a PrefixMap,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (String, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        while let Some(id) = self.stack.pop() {
            let node = &map.nodes[id as usize];
            for &child in node.children.iter().rev() {
                if child != NIL {
                    self.stack.push(child);
                }
            }
            if node.terminal {
                return Some((map.word_of(id), node.occurrences));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_accumulates() {
        let mut m = PrefixMap::new();
        m.insert("cat", 1).unwrap();
        m.insert("cat", 2).unwrap();
        m.insert_word("dog").unwrap();
        assert_eq!(m.occurrences("cat"), 3);
        assert_eq!(m.occurrences("dog"), 1);
        assert_eq!(m.occurrences("cow"), 0);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_invalid_words() {
        let mut m = PrefixMap::new();
        assert!(matches!(m.insert("", 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(m.insert("a!b", 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(m.insert("caffè", 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(m.insert("ok", 0), Err(Error::InvalidArgument(_))));
        assert!(m.is_empty());
        // Failed inserts must not allocate path nodes.
        assert_eq!(m.node_count(), 1);
        assert!(!m.contains(""));
        assert!(!m.contains("a!b"));
        assert_eq!(m.occurrences("a!b"), 0);
    }

    #[test]
    fn test_case_folding() {
        let mut m = PrefixMap::new();
        m.insert("Hello", 1).unwrap();
        m.insert("HELLO", 1).unwrap();
        assert!(m.contains("hello"));
        assert_eq!(m.occurrences("hElLo"), 2);
        assert_eq!(m.to_word_list(), vec![("hello".to_string(), 2)]);
    }

    #[test]
    fn test_set_occurrences() {
        let mut m = PrefixMap::new();
        m.set_occurrences("new", 7).unwrap();
        assert_eq!(m.occurrences("new"), 7);
        m.insert("new", 1).unwrap();
        m.set_occurrences("new", 2).unwrap();
        assert_eq!(m.occurrences("new"), 2);
        assert!(matches!(
            m.set_occurrences("new", 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            m.set_occurrences("", 3),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_remove_and_reinsert() {
        let mut m = PrefixMap::new();
        assert!(!m.contains("abc"));
        m.insert("abc", 4).unwrap();
        m.insert("ab", 1).unwrap();
        assert!(m.contains("abc"));

        let nodes = m.node_count();
        assert_eq!(m.remove("abc"), Some(4));
        assert!(!m.contains("abc"));
        assert_eq!(m.occurrences("abc"), 0);
        assert_eq!(m.remove("abc"), None);
        assert_eq!(m.len(), 1);
        // Path is kept.
        assert_eq!(m.node_count(), nodes);
        assert!(m.contains("ab"));

        // Reinsertion starts from zero, not from the cleared counter.
        m.insert("abc", 1).unwrap();
        assert_eq!(m.occurrences("abc"), 1);
        assert_eq!(m.node_count(), nodes);
    }

    #[test]
    fn test_prefix_is_not_a_word() {
        let mut m = PrefixMap::new();
        m.insert("abcd", 1).unwrap();
        assert!(!m.contains("abc"));
        assert!(!m.contains("abcde"));
        assert_eq!(m.remove("ab"), None);
    }

    #[test]
    fn test_word_list_order() {
        let mut m = PrefixMap::new();
        m.insert_all(["b", "a", "ab", "9", "10", "aa", "z1"]).unwrap();
        m.insert("ab", 2).unwrap();
        let got = m.to_word_list();
        let expected: Vec<(String, u64)> = [
            ("10", 1),
            ("9", 1),
            ("a", 1),
            ("aa", 1),
            ("ab", 3),
            ("b", 1),
            ("z1", 1),
        ]
        .iter()
        .map(|&(w, c)| (w.to_string(), c))
        .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_word_list_skips_removed() {
        let mut m = PrefixMap::new();
        m.insert_all(["one", "two", "three"]).unwrap();
        m.remove("two");
        let words: Vec<String> = m.iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["one", "three"]);
        // Each call starts a fresh traversal.
        assert_eq!(m.to_word_list(), m.to_word_list());
    }

    #[test]
    fn test_insert_all_stops_at_invalid() {
        let mut m = PrefixMap::new();
        let err = m.insert_all(["good", "bad word", "never"]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(m.contains("good"));
        assert!(!m.contains("never"));
    }

    #[test]
    fn test_empty_map() {
        let m = PrefixMap::default();
        assert!(m.is_empty());
        assert_eq!(m.iter().count(), 0);
        assert_eq!(format!("{m:?}"), "{}");
    }
}
