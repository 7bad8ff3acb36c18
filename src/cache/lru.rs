//! LRU List Module
//!
//! Recency ordering for cache eviction, kept as a doubly linked list whose
//! nodes live in a slab. Nodes are addressed by [`NodeId`] so the store can
//! reposition or unlink a key in O(1) without searching.

use crate::cache::CacheKey;

/// Index of a node inside an [`LruList`].
pub type NodeId = usize;

#[derive(Debug)]
struct Node {
    key: CacheKey,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

// == LRU List ==
/// Keys ordered by recency.
///
/// - Front = least recently used (next eviction candidate)
/// - Back = most recently used
#[derive(Debug, Default)]
pub struct LruList {
    nodes: Vec<Option<Node>>,
    /// Vacant slots available for reuse
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl LruList {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    // == Push Back ==
    /// Appends a key at the most recently used end and returns its node.
    pub fn push_back(&mut self, key: CacheKey) -> NodeId {
        let node = Node {
            key,
            prev: self.tail,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    // == Move To Back ==
    /// Marks a node as most recently used.
    pub fn move_to_back(&mut self, id: NodeId) {
        if self.tail == Some(id) {
            return;
        }
        self.unlink(id);

        let tail = self.tail;
        {
            let node = self.node_mut(id);
            node.prev = tail;
            node.next = None;
        }
        match tail {
            Some(tail) => self.node_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    // == Remove ==
    /// Unlinks a node and returns its key. Neighbouring order is unchanged.
    pub fn remove(&mut self, id: NodeId) -> Option<CacheKey> {
        self.nodes.get(id)?.as_ref()?;
        self.unlink(id);
        let node = self.nodes[id].take()?;
        self.free.push(id);
        self.len -= 1;
        Some(node.key)
    }

    // == Pop Front ==
    /// Removes and returns the least recently used key.
    pub fn pop_front(&mut self) -> Option<CacheKey> {
        let head = self.head?;
        self.remove(head)
    }

    // == Peek Front ==
    /// Returns the least recently used key without removing it.
    pub fn peek_front(&self) -> Option<&CacheKey> {
        self.head
            .and_then(|id| self.nodes[id].as_ref())
            .map(|node| &node.key)
    }

    // == Iter ==
    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes[cursor?].as_ref()?;
            cursor = node.next;
            Some(&node.key)
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Internals ==
    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = {
            let node = self.node_mut(id);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id]
            .as_mut()
            .unwrap_or_else(|| panic!("LRU node {id} is vacant"))
    }
}
