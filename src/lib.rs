//! # critbit-map
//!
//! An ordered map over fixed-width integer keys using a crit-bit
//! (binary PATRICIA) trie.
//!
//! Every internal node records the highest-order bit at which the keys below
//! it disagree, so lookups, inserts and removals touch at most one node per key
//! bit and never rebalance. A [`Cursor`] walks the trie in key order in either
//! direction from any seek position, using an explicit path stack instead of
//! parent pointers.
//!
//! ## Example
//!
//! ```rust
//! use critbit_map::CritBitMap;
//!
//! let mut map: CritBitMap<i64, &str> = CritBitMap::new();
//! map.insert(-1, "minus one");
//! map.insert(1, "one");
//! map.insert(10, "ten");
//!
//! assert_eq!(map.get(1), Some(&"one"));
//!
//! let mut cursor = map.cursor();
//! cursor.seek(2);
//! assert!(cursor.move_next());
//! assert_eq!(cursor.key(), Some(10));
//! assert!(cursor.move_prev());
//! assert_eq!(cursor.key(), Some(1));
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod key;
mod node;

pub use config::Config;
pub use cursor::{Cursor, Direction, Iter, Keys, Range, Values};
pub use error::{CritBitError, Result};
pub use key::{CritBitKey, KeyBits};

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::RangeBounds;

use config::MIN_COMPACT_SLOTS;
use node::{Node, NodeArena, NodeId};

// =============================================================================
// Search primitives
// =============================================================================

/// Outcome of comparing a search key against one node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Probe {
    /// The node is a leaf holding exactly the search key.
    Exact,
    /// Highest-order bit at which the key leaves the node's subtree, or the
    /// node's own critical bit when the key agrees with everything above it.
    Diverges(u32),
}

/// Compare `key` with the node's recorded bits.
///
/// For an internal node only the bits above its critical bit are examined.
#[inline]
pub(crate) fn find_crit<B: KeyBits, V>(node: &Node<B, V>, key: B) -> Probe {
    match *node {
        Node::Internal { prefix, crit, .. } => {
            Probe::Diverges(prefix.high_diff(key, crit).unwrap_or(crit))
        }
        Node::Leaf { key: stored, .. } => match stored.first_diff(key) {
            None => Probe::Exact,
            Some(bit) => Probe::Diverges(bit),
        },
    }
}

/// Result of [`CritBitMap::locate`].
#[derive(Clone, Copy, Debug)]
struct Located {
    probe: Probe,
    /// Node sharing the longest prefix with the key.
    node: NodeId,
    /// Parent of `node`, `None` when `node` is the root.
    parent: Option<NodeId>,
}

// =============================================================================
// CritBitMap
// =============================================================================

/// An ordered map from integer keys to values, stored as a crit-bit trie.
///
/// Keys are ordered numerically, signed keys included. Depth never exceeds the
/// key's bit width, so every operation is bounded by `K::Bits::WIDTH` node
/// visits regardless of the number of entries.
pub struct CritBitMap<K: CritBitKey, V> {
    nodes: NodeArena<K::Bits, V>,
    root: Option<NodeId>,
    count: usize,
    compact_threshold: Option<f64>,
    _marker: PhantomData<K>,
}

impl<K: CritBitKey, V> CritBitMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
            count: 0,
            compact_threshold: None,
            _marker: PhantomData,
        }
    }

    /// Create an empty map with node slots reserved for `keys` entries.
    pub fn with_capacity(keys: usize) -> Self {
        let slots = Config::default().initial_capacity(keys).slot_capacity();
        Self {
            nodes: NodeArena::with_capacity(slots),
            ..Self::new()
        }
    }

    /// Create an empty map from a validated [`Config`].
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "crit-bit map configured: initial_capacity={}, compact_threshold={:?}",
            config.initial_capacity,
            config.compact_threshold
        );
        Ok(Self {
            nodes: NodeArena::with_capacity(config.slot_capacity()),
            compact_threshold: config.compact_threshold,
            ..Self::new()
        })
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        log::debug!("clearing crit-bit map with {} keys", self.count);
        self.nodes.clear();
        self.root = None;
        self.count = 0;
    }

    /// Heap bytes held by the node arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity_bytes()
    }

    pub fn shrink_to_fit(&mut self) {
        let before = self.nodes.capacity_bytes();
        self.nodes.shrink_to_fit();
        log::debug!(
            "shrunk node arena from {} to {} bytes",
            before,
            self.nodes.capacity_bytes()
        );
    }

    /// Rebuild the node arena densely, dropping slots vacated by removals.
    ///
    /// Returns the number of vacant slots reclaimed.
    pub fn compact(&mut self) -> usize {
        let reclaimed = self.nodes.vacant();
        match self.root {
            Some(root) => self.root = Some(self.nodes.compact(root)),
            None => self.nodes.clear(),
        }
        log::debug!(
            "compacted node arena: {} live slots, {} reclaimed",
            self.nodes.live(),
            reclaimed
        );
        reclaimed
    }

    fn maybe_compact(&mut self) {
        let Some(ratio) = self.compact_threshold else {
            return;
        };
        let slots = self.nodes.slot_count();
        if slots >= MIN_COMPACT_SLOTS && self.nodes.vacant() as f64 >= ratio * slots as f64 {
            self.compact();
        }
    }

    /// Descend from `root` while `key` agrees with each node's prefix.
    ///
    /// Stops at a leaf, or at the first node whose prefix `key` leaves above
    /// the node's critical bit.
    fn locate(&self, root: NodeId, key: K::Bits) -> Located {
        let mut parent = None;
        let mut id = root;
        loop {
            let node = &self.nodes[id];
            let probe = find_crit(node, key);
            match (node, probe) {
                (Node::Internal { crit, children, .. }, Probe::Diverges(bit)) if bit == *crit => {
                    parent = Some(id);
                    id = children[key.bit(bit)];
                }
                _ => {
                    return Located {
                        probe,
                        node: id,
                        parent,
                    }
                }
            }
        }
    }

    fn find_leaf(&self, key: K) -> Option<NodeId> {
        let located = self.locate(self.root?, key.to_bits());
        (located.probe == Probe::Exact).then_some(located.node)
    }

    /// Insert or replace the value for `key`, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics if the node arena runs out of addressable slots; see
    /// [`CritBitMap::try_insert`].
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(old) => old,
            Err(err) => panic!("{}", err),
        }
    }

    /// Insert or replace the value for `key`, failing instead of panicking
    /// when the node arena is full.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let bits = key.to_bits();
        let Some(root) = self.root else {
            self.nodes.ensure_room(1)?;
            self.root = Some(self.nodes.alloc(Node::Leaf { key: bits, value }));
            self.count = 1;
            return Ok(None);
        };

        let located = self.locate(root, bits);
        let crit = match located.probe {
            Probe::Diverges(bit) => bit,
            Probe::Exact => {
                let old = self.nodes[located.node]
                    .value_mut()
                    .map(|slot| mem::replace(slot, value));
                debug_assert!(old.is_some());
                return Ok(old);
            }
        };

        // Split in place: the located node's content moves down one level and
        // its slot becomes the new branch point, so the parent's reference
        // (or the root id) stays valid.
        self.nodes.ensure_room(2)?;
        let n = located.node;
        let prefix = self.nodes[n].bits();
        let moved = self.nodes.relocate(n);
        let leaf = self.nodes.alloc(Node::Leaf { key: bits, value });
        let children = if bits.bit(crit) == 1 {
            [moved, leaf]
        } else {
            [leaf, moved]
        };
        self.nodes.fill(
            n,
            Node::Internal {
                prefix,
                crit,
                children,
            },
        );
        self.count += 1;
        log::trace!("split at bit {} inserting {:?}", crit, key);
        Ok(None)
    }

    /// Reference to the value for `key`.
    pub fn get(&self, key: K) -> Option<&V> {
        let id = self.find_leaf(key)?;
        self.nodes[id].value()
    }

    /// Mutable reference to the value for `key`, for in-place updates.
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let id = self.find_leaf(key)?;
        self.nodes[id].value_mut()
    }

    /// Copy of the value for `key`.
    pub fn get_cloned(&self, key: K) -> Option<V>
    where
        V: Clone,
    {
        self.get(key).cloned()
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.find_leaf(key).is_some()
    }

    /// Remove `key`, returning its value. Absent keys leave the map untouched.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let located = self.locate(self.root?, key.to_bits());
        if located.probe != Probe::Exact {
            return None;
        }

        let removed = match located.parent {
            None => {
                self.root = None;
                self.nodes.release(located.node)
            }
            Some(parent) => {
                // Collapse the branch: the sibling's content takes over the
                // parent's slot.
                let sibling = match self.nodes[parent] {
                    Node::Internal {
                        children: [left, right],
                        ..
                    } => {
                        if left == located.node {
                            right
                        } else {
                            left
                        }
                    }
                    Node::Leaf { .. } => unreachable!("located node's parent is a leaf"),
                };
                let content = self.nodes.release(sibling);
                self.nodes.fill(parent, content);
                log::trace!("collapsed branch removing {:?}", key);
                self.nodes.release(located.node)
            }
        };

        self.count -= 1;
        self.maybe_compact();
        removed.into_value()
    }

    fn edge_leaf(&self, side: usize) -> Option<NodeId> {
        let mut id = self.root?;
        while let Some(child) = self.nodes[id].child(side) {
            id = child;
        }
        Some(id)
    }

    pub(crate) fn entry_at(&self, id: NodeId) -> Option<(K, &V)> {
        match &self.nodes[id] {
            Node::Leaf { key, value } => Some((K::from_bits(*key), value)),
            Node::Internal { .. } => None,
        }
    }

    /// Entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(K, &V)> {
        self.entry_at(self.edge_leaf(0)?)
    }

    /// Entry with the largest key.
    pub fn last_key_value(&self) -> Option<(K, &V)> {
        self.entry_at(self.edge_leaf(1)?)
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id] {
                Node::Internal {
                    children: [left, right],
                    ..
                } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                Node::Leaf { .. } => deepest = deepest.max(depth),
            }
        }
        deepest
    }

    /// Check the trie's structural invariants.
    ///
    /// Every child must agree with its parent's prefix above the parent's
    /// critical bit, sit on the side named by its bit at that position, and
    /// carry a strictly lower-order critical bit. By induction this gives
    /// prefix coherence for every leaf.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.count != 0 {
                return Err(CritBitError::invariant(format!(
                    "empty trie reports {} keys",
                    self.count
                )));
            }
            return Ok(());
        };

        let width = <K::Bits as KeyBits>::WIDTH;
        let mut leaves = 0usize;
        let mut reachable = 0usize;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            reachable += 1;
            let (prefix, crit, children) = match self.nodes[id] {
                Node::Leaf { .. } => {
                    leaves += 1;
                    continue;
                }
                Node::Internal {
                    prefix,
                    crit,
                    children,
                } => (prefix, crit, children),
            };
            if crit >= width {
                return Err(CritBitError::invariant(format!(
                    "critical bit {} outside a {}-bit key",
                    crit, width
                )));
            }
            for (side, child) in children.into_iter().enumerate() {
                let node = &self.nodes[child];
                let bits = node.bits();
                if let Node::Internal {
                    crit: child_crit, ..
                } = *node
                {
                    if child_crit <= crit {
                        return Err(CritBitError::invariant(format!(
                            "child critical bit {} not below parent bit {}",
                            child_crit, crit
                        )));
                    }
                }
                if let Some(bit) = prefix.high_diff(bits, crit) {
                    return Err(CritBitError::invariant(format!(
                        "child {:?} leaves prefix {:?} at bit {} above critical bit {}",
                        bits, prefix, bit, crit
                    )));
                }
                if bits.bit(crit) != side {
                    return Err(CritBitError::invariant(format!(
                        "child {:?} stored on side {} of critical bit {}",
                        bits, side, crit
                    )));
                }
                stack.push(child);
            }
        }

        if leaves != self.count {
            return Err(CritBitError::invariant(format!(
                "{} reachable leaves but length is {}",
                leaves, self.count
            )));
        }
        if reachable != self.nodes.live() {
            return Err(CritBitError::invariant(format!(
                "{} reachable nodes but {} live slots",
                reachable,
                self.nodes.live()
            )));
        }
        Ok(())
    }

    /// A cursor positioned before the first entry.
    pub fn cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Entries whose keys fall in `range`, in ascending order.
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Range<'_, K, V> {
        Range::new(
            self,
            range.start_bound().cloned(),
            range.end_bound().cloned(),
        )
    }
}

impl<B, V> Node<B, V> {
    #[inline]
    fn value(&self) -> Option<&V> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Internal { .. } => None,
        }
    }

    #[inline]
    fn value_mut(&mut self) -> Option<&mut V> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Internal { .. } => None,
        }
    }

    #[inline]
    fn into_value(self) -> Option<V> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Internal { .. } => None,
        }
    }
}

impl<K: CritBitKey, V> Default for CritBitMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CritBitKey, V: Clone> Clone for CritBitMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            count: self.count,
            compact_threshold: self.compact_threshold,
            _marker: PhantomData,
        }
    }
}

impl<K: CritBitKey, V: fmt::Debug> fmt::Debug for CritBitMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: CritBitKey, V: PartialEq> PartialEq for CritBitMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: CritBitKey, V: Eq> Eq for CritBitMap<K, V> {}

impl<K: CritBitKey, V> FromIterator<(K, V)> for CritBitMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: CritBitKey, V> Extend<(K, V)> for CritBitMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: CritBitKey, V> IntoIterator for &'a CritBitMap<K, V> {
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
