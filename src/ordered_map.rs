//! AVL tree keyed by an ordered key, storing arbitrary values.
//!
//! Nodes live in an arena and link to each other by index. `left`/`right`
//! are the owning edges; `parent` is only followed for rotations and for
//! in-order successor lookup. Nodes are never removed, so an index handed
//! out by the arena stays valid for the lifetime of the map.
//!
//! Heights count edges: a childless node has height `0`, and a missing child
//! counts as `-1` when computing balance factors.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::error::Result;

type NodeId = u32;

const NIL: NodeId = NodeId::MAX;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    height: i32,
    left: NodeId,
    right: NodeId,
    parent: NodeId,
}

enum Search {
    Found(NodeId),
    /// `parent` is `NIL` for an empty map.
    Vacant { parent: NodeId, left: bool },
}

/// Self-balancing ordered map with ascending iteration.
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    nodes: Vec<Node<K, V>>,
    root: NodeId,
}

impl<K: Ord, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Height of the root in edges, `None` for an empty map.
    pub fn height(&self) -> Option<usize> {
        (self.root != NIL).then(|| self.node(self.root).height as usize)
    }

    /// Insert `value` under `key`.
    ///
    /// An existing key has its value replaced and the old value returned; the
    /// shape of the tree does not change. A new key is linked in as a leaf and
    /// its ancestors are retraced, rotating at any node whose balance factor
    /// leaves `[-1, 1]`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.search(&key) {
            Search::Found(id) => Ok(Some(mem::replace(&mut self.node_mut(id).value, value))),
            Search::Vacant { parent, left } => {
                self.link(key, value, parent, left)?;
                Ok(None)
            }
        }
    }

    /// Value under `key`, inserting `f()` first if the key is absent.
    ///
    /// `f` runs only for a new key, which is linked in and retraced exactly
    /// as by [`insert`](Self::insert).
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> Result<&mut V> {
        let id = match self.search(&key) {
            Search::Found(id) => id,
            Search::Vacant { parent, left } => self.link(key, f(), parent, left)?,
        };
        Ok(&mut self.node_mut(id).value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let id = self.find(key)?;
        Some(&self.node(id).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find(key)?;
        Some(&mut self.node_mut(id).value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Smallest key.
    ///
    /// # Panics
    ///
    /// If the map is empty.
    pub fn min_key(&self) -> &K {
        assert!(!self.is_empty(), "min_key called on an empty OrderedMap");
        &self.node(self.minimum(self.root)).key
    }

    /// Largest key.
    ///
    /// # Panics
    ///
    /// If the map is empty.
    pub fn max_key(&self) -> &K {
        assert!(!self.is_empty(), "max_key called on an empty OrderedMap");
        &self.node(self.maximum(self.root)).key
    }

    /// Ascending `(key, value)` pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let next = if self.root == NIL {
            NIL
        } else {
            self.minimum(self.root)
        };
        Iter {
            map: self,
            next,
            remaining: self.len(),
        }
    }

    /// An explicit `has_next`/`advance` cursor positioned before the first key.
    pub fn cursor(&self) -> Cursor<'_, K, V> {
        Cursor {
            map: self,
            position: Position::Start,
        }
    }

    // -------------------------------------------------------------------------
    // Arena helpers
    // -------------------------------------------------------------------------

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id as usize]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id as usize]
    }

    /// Caller must have reserved capacity.
    fn push(&mut self, key: K, value: V, parent: NodeId) -> NodeId {
        let id = self.nodes.len() as NodeId;
        assert!(id != NIL, "ordered map node arena exhausted");
        self.nodes.push(Node {
            key,
            value,
            height: 0,
            left: NIL,
            right: NIL,
            parent,
        });
        id
    }

    /// Where `key` lives, or the empty child slot it would be linked into.
    fn search(&self, key: &K) -> Search {
        let mut parent = NIL;
        let mut left = false;
        let mut cur = self.root;
        while cur != NIL {
            let node = self.node(cur);
            parent = cur;
            cur = match key.cmp(&node.key) {
                Ordering::Equal => return Search::Found(cur),
                Ordering::Less => {
                    left = true;
                    node.left
                }
                Ordering::Greater => {
                    left = false;
                    node.right
                }
            };
        }
        Search::Vacant { parent, left }
    }

    /// Link a new leaf under `parent` (the root slot if `parent` is `NIL`)
    /// and retrace. Arena ids are stable across rotations, so the returned id
    /// stays valid.
    fn link(&mut self, key: K, value: V, parent: NodeId, left: bool) -> Result<NodeId> {
        self.nodes.try_reserve(1)?;
        let id = self.push(key, value, parent);
        if parent == NIL {
            self.root = id;
            return Ok(id);
        }
        if left {
            self.node_mut(parent).left = id;
        } else {
            self.node_mut(parent).right = id;
        }
        self.retrace(parent);
        Ok(id)
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while cur != NIL {
            let node = self.node(cur);
            cur = match key.cmp(&node.key) {
                Ordering::Equal => return Some(cur),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while self.node(id).left != NIL {
            id = self.node(id).left;
        }
        id
    }

    fn maximum(&self, mut id: NodeId) -> NodeId {
        while self.node(id).right != NIL {
            id = self.node(id).right;
        }
        id
    }

    fn successor(&self, id: NodeId) -> NodeId {
        let right = self.node(id).right;
        if right != NIL {
            return self.minimum(right);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != NIL && self.node(parent).right == child {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    // -------------------------------------------------------------------------
    // Balancing
    // -------------------------------------------------------------------------

    #[inline]
    fn height_of(&self, id: NodeId) -> i32 {
        if id == NIL {
            -1
        } else {
            self.node(id).height
        }
    }

    fn update_height(&mut self, id: NodeId) {
        let node = self.node(id);
        let h = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.node_mut(id).height = h;
    }

    /// Left height minus right height.
    fn balance_factor(&self, id: NodeId) -> i32 {
        let node = self.node(id);
        self.height_of(node.left) - self.height_of(node.right)
    }

    /// Walk from `id` up to the root refreshing heights and rotating where
    /// the balance factor is out of range.
    fn retrace(&mut self, mut id: NodeId) {
        while id != NIL {
            self.update_height(id);
            if !(-1..=1).contains(&self.balance_factor(id)) {
                id = self.rebalance(id);
            }
            id = self.node(id).parent;
        }
    }

    /// Returns the new root of the rotated subtree.
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        if self.balance_factor(id) < 0 {
            let right = self.node(id).right;
            if self.balance_factor(right) > 0 {
                self.rotate_right(right);
            }
            self.rotate_left(id)
        } else {
            let left = self.node(id).left;
            if self.balance_factor(left) < 0 {
                self.rotate_left(left);
            }
            self.rotate_right(id)
        }
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let y = self.node(x).right;
        debug_assert!(y != NIL);
        let inner = self.node(y).left;
        self.node_mut(x).right = inner;
        if inner != NIL {
            self.node_mut(inner).parent = x;
        }
        let parent = self.node(x).parent;
        self.replace_child(parent, x, y);
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let y = self.node(x).left;
        debug_assert!(y != NIL);
        let inner = self.node(y).right;
        self.node_mut(x).left = inner;
        if inner != NIL {
            self.node_mut(inner).parent = x;
        }
        let parent = self.node(x).parent;
        self.replace_child(parent, x, y);
        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Point `parent`'s edge to `old` at `new` instead (or the root pointer
    /// when `parent` is NIL), and set `new`'s parent.
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if parent == NIL {
            self.root = new;
        } else if self.node(parent).left == old {
            self.node_mut(parent).left = new;
        } else {
            self.node_mut(parent).right = new;
        }
        self.node_mut(new).parent = parent;
    }

    /// Check links, cached heights, balance and ordering of every node.
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        if self.root == NIL {
            assert!(self.nodes.is_empty(), "empty tree must have no nodes");
            return;
        }
        assert_eq!(self.node(self.root).parent, NIL, "root must have no parent");

        let mut reached = 0usize;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            reached += 1;
            let node = self.node(id);
            for child in [node.left, node.right] {
                if child != NIL {
                    assert_eq!(self.node(child).parent, id, "broken parent link");
                    stack.push(child);
                }
            }
            if node.left != NIL {
                assert!(self.node(node.left).key < node.key, "left child out of order");
            }
            if node.right != NIL {
                assert!(self.node(node.right).key > node.key, "right child out of order");
            }
            assert_eq!(
                node.height,
                1 + self.height_of(node.left).max(self.height_of(node.right)),
                "stored height must match children"
            );
            let bf = self.balance_factor(id);
            assert!((-1..=1).contains(&bf), "balance factor {bf} out of range");
        }
        assert_eq!(reached, self.nodes.len(), "every node must be reachable once");
    }
}

impl<K: Ord, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, K, V> {
    map: &'a OrderedMap<K, V>,
    next: NodeId,
    remaining: usize,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NIL {
            return None;
        }
        let map = self.map;
        let node = map.node(self.next);
        self.next = map.successor(self.next);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Ord, V> ExactSizeIterator for Iter<'a, K, V> {}

#[derive(Clone, Copy)]
enum Position {
    Start,
    At(NodeId),
}

/// Single-pass ascending cursor.
///
/// Starts before the first key; each [`Cursor::advance`] moves to the
/// minimum and then to successive in-order successors. Reading the key or
/// value before the first advance, or advancing when [`Cursor::has_next`] is
/// false, is a caller bug and panics.
pub struct Cursor<'a, K, V> {
    map: &'a OrderedMap<K, V>,
    position: Position,
}

impl<'a, K: Ord, V> Cursor<'a, K, V> {
    pub fn has_next(&self) -> bool {
        match self.position {
            Position::Start => !self.map.is_empty(),
            Position::At(id) => self.map.successor(id) != NIL,
        }
    }

    pub fn advance(&mut self) {
        let next = match self.position {
            Position::Start => {
                assert!(!self.map.is_empty(), "advance on an empty OrderedMap");
                self.map.minimum(self.map.root)
            }
            Position::At(id) => {
                let next = self.map.successor(id);
                assert!(next != NIL, "advance past the last key");
                next
            }
        };
        self.position = Position::At(next);
    }

    pub fn key(&self) -> &'a K {
        &self.map.node(self.current()).key
    }

    pub fn value(&self) -> &'a V {
        &self.map.node(self.current()).value
    }

    fn current(&self) -> NodeId {
        match self.position {
            Position::At(id) => id,
            Position::Start => panic!("cursor read before the first advance"),
        }
    }
}
