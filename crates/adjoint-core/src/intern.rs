//! Opt-in hash-consing of expression nodes.
//!
//! Composition normally allocates a fresh node for every operator, so
//! building `e = e * e` in a loop doubles the tree each round. With a cache
//! attached to the arena, structurally identical nodes share one handle and
//! the same loop grows linearly.

use hashbrown::HashMap;

use crate::expr::ExprNode;
use crate::handle::ExprHandle;

/// Maps node content to the handle that first stored it.
#[derive(Debug, Default)]
pub struct SubexpressionCache {
    map: HashMap<ExprNode, ExprHandle>,
    hits: usize,
}

impl SubexpressionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            hits: 0,
        }
    }

    /// Returns the handle already holding `node`, counting the hit.
    pub fn lookup(&mut self, node: &ExprNode) -> Option<ExprHandle> {
        let found = self.map.get(node).copied();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    /// Records that `node` lives at `handle`.
    pub fn record(&mut self, node: ExprNode, handle: ExprHandle) {
        self.map.insert(node, handle);
    }

    /// Returns the number of distinct nodes recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns how many allocations the cache has saved.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }
}
