// =============================================================================
// Node arena
// =============================================================================
//
// Every trie node lives in one slot of `NodeArena`. Children are referenced by
// `NodeId` (a `u32` slot index). A slot is owned by exactly one parent, or is
// the root. Vacated slots go onto a free list and are handed out again before
// the arena grows.

use std::mem;
use std::ops::{Index, IndexMut};

use crate::error::{CritBitError, Result};

/// Largest number of slots a `u32` id can address.
const MAX_SLOTS: usize = u32::MAX as usize;

/// Index of a node slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A trie node: a branch point or a key/value pair.
#[derive(Clone, Debug)]
pub(crate) enum Node<B, V> {
    /// Branch point. Keys below agree with `prefix` on every bit above `crit`;
    /// `children[b]` holds the keys whose bit at `crit` is `b`.
    Internal {
        prefix: B,
        crit: u32,
        children: [NodeId; 2],
    },
    Leaf {
        key: B,
        value: V,
    },
}

impl<B: Copy, V> Node<B, V> {
    /// Stored key for a leaf, recorded prefix for an internal node.
    #[inline]
    pub(crate) fn bits(&self) -> B {
        match self {
            Node::Internal { prefix, .. } => *prefix,
            Node::Leaf { key, .. } => *key,
        }
    }

    /// Child on `side`, or `None` for a leaf.
    #[inline]
    pub(crate) fn child(&self, side: usize) -> Option<NodeId> {
        match self {
            Node::Internal { children, .. } => Some(children[side]),
            Node::Leaf { .. } => None,
        }
    }
}

/// Slot storage for trie nodes with a free list.
#[derive(Clone)]
pub(crate) struct NodeArena<B, V> {
    slots: Vec<Option<Node<B, V>>>,
    free: Vec<NodeId>,
}

impl<B, V> NodeArena<B, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(slots: usize) -> Self {
        Self {
            slots: Vec::with_capacity(slots),
            free: Vec::new(),
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of slots waiting on the free list.
    #[inline]
    pub(crate) fn vacant(&self) -> usize {
        self.free.len()
    }

    /// Total number of slots, occupied or not.
    #[inline]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Heap bytes held by the arena.
    pub(crate) fn capacity_bytes(&self) -> usize {
        self.slots.capacity() * mem::size_of::<Option<Node<B, V>>>()
            + self.free.capacity() * mem::size_of::<NodeId>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing vacant slots can go entirely.
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.index() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Fail unless `additional` more slots can be allocated.
    pub(crate) fn ensure_room(&self, additional: usize) -> Result<()> {
        let available = self.free.len() + (MAX_SLOTS - self.slots.len());
        if additional > available {
            return Err(CritBitError::capacity_exceeded(self.live() + additional));
        }
        Ok(())
    }

    /// Store `node` in a free slot. Callers check [`NodeArena::ensure_room`] first.
    pub(crate) fn alloc(&mut self, node: Node<B, V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            debug_assert!(self.slots[id.index()].is_none());
            self.slots[id.index()] = Some(node);
            return id;
        }
        debug_assert!(self.slots.len() < MAX_SLOTS);
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(node));
        id
    }

    /// Move the content of `id` into a fresh slot, leaving `id` empty until
    /// [`NodeArena::fill`] writes it again.
    pub(crate) fn relocate(&mut self, id: NodeId) -> NodeId {
        let node = self.slots[id.index()]
            .take()
            .expect("relocating a vacant slot");
        self.alloc(node)
    }

    /// Write `node` into `id`, dropping whatever was there.
    pub(crate) fn fill(&mut self, id: NodeId, node: Node<B, V>) {
        self.slots[id.index()] = Some(node);
    }

    /// Remove the node at `id` and put the slot on the free list.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<B, V> {
        let node = self.slots[id.index()]
            .take()
            .expect("releasing a vacant slot");
        self.free.push(id);
        node
    }

    /// Rebuild the arena so that the tree under `root` occupies slots
    /// `0..live` in depth-first order. Returns the new root id.
    pub(crate) fn compact(&mut self, root: NodeId) -> NodeId {
        let mut old = mem::take(&mut self.slots);
        let live = old.len() - self.free.len();
        self.free.clear();
        self.slots.reserve_exact(live);

        let mut take = |id: NodeId| {
            old[id.index()]
                .take()
                .expect("compacting a dangling child id")
        };

        let new_root = self.alloc(take(root));
        let mut pending = vec![new_root];
        while let Some(id) = pending.pop() {
            let Some(Node::Internal { children, .. }) = &self.slots[id.index()] else {
                continue;
            };
            let [left, right] = *children;
            let left = self.alloc(take(left));
            let right = self.alloc(take(right));
            if let Some(Node::Internal { children, .. }) = &mut self.slots[id.index()] {
                *children = [left, right];
            }
            pending.push(right);
            pending.push(left);
        }
        new_root
    }
}

impl<B, V> Index<NodeId> for NodeArena<B, V> {
    type Output = Node<B, V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        self.slots[id.index()]
            .as_ref()
            .expect("node id refers to a vacant slot")
    }
}

impl<B, V> IndexMut<NodeId> for NodeArena<B, V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.slots[id.index()]
            .as_mut()
            .expect("node id refers to a vacant slot")
    }
}
