//! # swordx
//!
//! Counts word occurrences across a set of files and lists the results either
//! alphabetically or grouped by occurrence count.
//!
//! Two structures do the work: a [`PrefixMap`] (36-way trie over `[0-9a-z]`)
//! holding each word's counter, and an [`OrderedMap`] (AVL tree) mapping each
//! count to a nested `PrefixMap` of the words currently at that count.
//! [`FrequencyIndex`] keeps the two in step on every occurrence.
//!
//! ## Example
//!
//! ```rust
//! use swordx::FrequencyIndex;
//!
//! let mut index = FrequencyIndex::new();
//! for word in ["cat", "cat", "dog", "cat"] {
//!     index.record(word).unwrap();
//! }
//!
//! assert_eq!(index.occurrences("cat"), 3);
//! assert_eq!(
//!     index.emit_by_occurrence(),
//!     vec![("dog".to_string(), 1), ("cat".to_string(), 3)]
//! );
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod ordered_map;
pub mod output;
pub mod prefix_map;
pub mod scan;

pub use config::Config;
pub use error::{Error, Result};
pub use index::{FrequencyIndex, SharedIndex};
pub use ordered_map::OrderedMap;
pub use prefix_map::PrefixMap;

#[cfg(test)]
mod proptests;
