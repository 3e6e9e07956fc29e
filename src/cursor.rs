//! Bidirectional cursor and the iterators built on it.
//!
//! A cursor keeps the path from the root to its current node on a stack, so it
//! can step to the neighbouring key in either direction without parent
//! pointers: climb while the top of the path is the child on the travel side,
//! swap to the sibling on the travel side, then descend toward the near edge.
//! A full traversal touches every node a constant number of times.

use std::fmt;
use std::iter::FusedIterator;
use std::ops::Bound;

use crate::key::{CritBitKey, KeyBits};
use crate::node::{Node, NodeId};
use crate::{find_crit, CritBitMap, Probe};

/// Travel direction of a cursor step.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    /// Toward smaller keys.
    Backward = 0,
    /// Toward larger keys.
    Forward = 1,
}

impl Direction {
    /// Child index on the side this direction travels toward.
    #[inline]
    fn side(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn reverse(self) -> Self {
        match self {
            Direction::Backward => Direction::Forward,
            Direction::Forward => Direction::Backward,
        }
    }

    #[inline]
    fn from_bit(bit: usize) -> Self {
        if bit == 1 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Position {
    /// Never moved; the first step enters from the root.
    Fresh,
    /// Placed by `seek`. `None`: the path ends at the leaf holding the sought
    /// key. `Some(dir)`: the sought key lies beyond the subtree on top of the
    /// path in direction `dir`.
    Seeked(Option<Direction>),
    /// The path ends at the leaf reported by the last step.
    Stepped,
    /// Ran off the end of the map travelling in the given direction; the path
    /// is empty.
    End(Direction),
}

/// A stateful position in a [`CritBitMap`].
///
/// Starts before the first entry: [`Cursor::move_next`] yields the smallest
/// key and [`Cursor::move_prev`] the largest. After [`Cursor::seek`] the next
/// step yields the sought key if present, otherwise its nearest neighbour in
/// the step's direction.
///
/// The cursor borrows the map, so the map cannot change while it is alive.
pub struct Cursor<'a, K: CritBitKey, V> {
    map: &'a CritBitMap<K, V>,
    path: Vec<NodeId>,
    position: Position,
    current: Option<(K, &'a V)>,
}

impl<'a, K: CritBitKey, V> Cursor<'a, K, V> {
    pub(crate) fn new(map: &'a CritBitMap<K, V>) -> Self {
        Self {
            map,
            // Depth never exceeds the key width.
            path: Vec::with_capacity(<K::Bits as KeyBits>::WIDTH as usize + 1),
            position: Position::Fresh,
            current: None,
        }
    }

    /// Forget the position and the last result.
    pub fn reset(&mut self) {
        self.path.clear();
        self.position = Position::Fresh;
        self.current = None;
    }

    /// Position the cursor so the next step lands on `key`, or on the nearest
    /// key in the step's direction when `key` is absent.
    pub fn seek(&mut self, key: K) {
        self.reset();
        let map = self.map;
        let Some(root) = map.root else {
            return;
        };

        let bits = key.to_bits();
        let mut id = root;
        loop {
            let node = &map.nodes[id];
            let bit = match find_crit(node, bits) {
                Probe::Exact => {
                    self.path.push(id);
                    self.position = Position::Seeked(None);
                    return;
                }
                Probe::Diverges(bit) => bit,
            };
            match *node {
                Node::Internal { crit, children, .. } if bit == crit => {
                    self.path.push(id);
                    id = children[bits.bit(bit)];
                }
                _ => {
                    // Every key below `id` lies on the other side of `key`.
                    let side = Direction::from_bit(bits.bit(bit));
                    if self.path.is_empty() {
                        // Diverged at the root: nothing lies beyond `key` on
                        // `side`, as if a step that way had already run off.
                        self.position = Position::End(side);
                    } else {
                        self.path.push(id);
                        self.position = Position::Seeked(Some(side));
                    }
                    return;
                }
            }
        }
    }

    /// Step to the next larger key. Returns whether one was found.
    pub fn move_next(&mut self) -> bool {
        self.step(Direction::Forward)
    }

    /// Step to the next smaller key. Returns whether one was found.
    pub fn move_prev(&mut self) -> bool {
        self.step(Direction::Backward)
    }

    /// Whether the last step found a key.
    #[inline]
    pub fn found(&self) -> bool {
        self.current.is_some()
    }

    /// Key found by the last step.
    #[inline]
    pub fn key(&self) -> Option<K> {
        self.current.map(|(key, _)| key)
    }

    /// Value for the key found by the last step.
    #[inline]
    pub fn value(&self) -> Option<&'a V> {
        self.current.map(|(_, value)| value)
    }

    #[inline]
    pub fn entry(&self) -> Option<(K, &'a V)> {
        self.current
    }

    /// Step one key in `dir`. Returns whether one was found.
    pub fn step(&mut self, dir: Direction) -> bool {
        match self.position {
            Position::Fresh | Position::End(_) => {
                // Leaving an end the other way, or starting out, re-enters
                // from the root.
                let reenter = match self.position {
                    Position::End(last) => last != dir,
                    _ => true,
                };
                match self.map.root {
                    Some(root) if reenter => {
                        self.path.clear();
                        self.path.push(root);
                    }
                    _ => {
                        self.current = None;
                        return false;
                    }
                }
            }
            Position::Seeked(None) => {}
            Position::Seeked(Some(side)) if side != dir => {}
            Position::Seeked(Some(_)) | Position::Stepped => {
                if !self.climb(dir) {
                    self.path.clear();
                    self.position = Position::End(dir);
                    self.current = None;
                    return false;
                }
            }
        }
        self.descend(dir);
        self.position = Position::Stepped;
        true
    }

    /// Replace the top of the path with the nearest subtree beyond it in
    /// direction `dir`. Returns `false` when there is none.
    fn climb(&mut self, dir: Direction) -> bool {
        let map = self.map;
        let side = dir.side();
        while let &[.., parent, top] = self.path.as_slice() {
            match map.nodes[parent].child(side) {
                Some(far) if far != top => {
                    if let Some(last) = self.path.last_mut() {
                        *last = far;
                    }
                    return true;
                }
                _ => {
                    self.path.pop();
                }
            }
        }
        false
    }

    /// Follow near-side children from the top of the path down to a leaf and
    /// report it.
    fn descend(&mut self, dir: Direction) {
        let map = self.map;
        let near = dir.reverse().side();
        let Some(&top) = self.path.last() else {
            self.current = None;
            return;
        };
        let mut id = top;
        while let Some(child) = map.nodes[id].child(near) {
            self.path.push(child);
            id = child;
        }
        self.current = map.entry_at(id);
    }
}

impl<K: CritBitKey, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.position)
            .field("depth", &self.path.len())
            .field("current", &self.current)
            .finish()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Entries of a [`CritBitMap`] in ascending key order.
///
/// Runs a forward and a backward cursor toward each other; the remaining count
/// keeps them from crossing.
pub struct Iter<'a, K: CritBitKey, V> {
    front: Cursor<'a, K, V>,
    back: Cursor<'a, K, V>,
    remaining: usize,
}

impl<'a, K: CritBitKey, V> Iter<'a, K, V> {
    pub(crate) fn new(map: &'a CritBitMap<K, V>) -> Self {
        Self {
            front: Cursor::new(map),
            back: Cursor::new(map),
            remaining: map.len(),
        }
    }
}

impl<'a, K: CritBitKey, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.front.move_next();
        let entry = self.front.entry()?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: CritBitKey, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.back.move_prev();
        let entry = self.back.entry()?;
        self.remaining -= 1;
        Some(entry)
    }
}

impl<K: CritBitKey, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K: CritBitKey, V> FusedIterator for Iter<'_, K, V> {}

/// Keys of a [`CritBitMap`] in ascending order.
pub struct Keys<'a, K: CritBitKey, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<K: CritBitKey, V> Iterator for Keys<'_, K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: CritBitKey, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K: CritBitKey, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Values of a [`CritBitMap`] in ascending key order.
pub struct Values<'a, K: CritBitKey, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K: CritBitKey, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: CritBitKey, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K: CritBitKey, V> ExactSizeIterator for Values<'_, K, V> {}

/// Entries with keys inside a range, ascending. Built on [`Cursor::seek`].
pub struct Range<'a, K: CritBitKey, V> {
    cursor: Cursor<'a, K, V>,
    start: Bound<K>,
    end: Bound<K>,
    started: bool,
    done: bool,
}

impl<'a, K: CritBitKey, V> Range<'a, K, V> {
    pub(crate) fn new(map: &'a CritBitMap<K, V>, start: Bound<K>, end: Bound<K>) -> Self {
        Self {
            cursor: Cursor::new(map),
            start,
            end,
            started: false,
            done: false,
        }
    }

    fn below_end(&self, key: K) -> bool {
        match self.end {
            Bound::Included(end) => key <= end,
            Bound::Excluded(end) => key < end,
            Bound::Unbounded => true,
        }
    }
}

impl<'a, K: CritBitKey, V> Iterator for Range<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Bound::Included(start) | Bound::Excluded(start) = self.start {
                self.cursor.seek(start);
            }
        }
        loop {
            if !self.cursor.move_next() {
                self.done = true;
                return None;
            }
            let (key, value) = self.cursor.entry()?;
            if self.start == Bound::Excluded(key) {
                continue;
            }
            if !self.below_end(key) {
                self.done = true;
                return None;
            }
            return Some((key, value));
        }
    }
}

impl<K: CritBitKey, V> FusedIterator for Range<'_, K, V> {}
