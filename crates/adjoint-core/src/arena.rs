//! Arena allocator for expression storage.
//!
//! Every node of a graph lives in one contiguous `Vec`, together with the
//! symbol table and the shared-value side table. Operators reference their
//! operands by handle, and since an operand must exist before the operator
//! that uses it, handles are always topologically ordered.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::expr::{BinaryOp, ExprNode, Number, Real, SharedId, UnaryOp};
use crate::handle::ExprHandle;
use crate::intern::SubexpressionCache;
use crate::scalar::{Domain, Scalar, Shared};
use crate::symbol::{SymbolId, SymbolKind, SymbolRecord};

/// Source of arena ids. Zero is never handed out.
static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// The storage behind a graph.
#[derive(Debug)]
pub struct ExprArena {
    /// Process-wide identity, embedded in every symbol id declared here.
    id: u32,
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Declared symbols, indexed by id.
    symbols: Vec<SymbolRecord>,
    /// Caller-owned cells read by `Shared` leaves.
    shared: Vec<Shared>,
    /// Present only when hash-consing is enabled.
    cache: Option<SubexpressionCache>,
}

impl Default for ExprArena {
    fn default() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            symbols: Vec::new(),
            shared: Vec::new(),
            cache: None,
        }
    }
}

impl ExprArena {
    /// Creates a new empty arena without hash-consing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Creates an arena that interns structurally identical nodes.
    #[must_use]
    pub fn with_hash_consing(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            cache: Some(SubexpressionCache::with_capacity(capacity)),
            ..Self::default()
        }
    }

    /// Stores a node, returning its handle.
    ///
    /// With hash-consing enabled an identical node already in the arena is
    /// reused; otherwise every call allocates.
    ///
    /// # Panics
    ///
    /// Panics if the arena exceeds `u32::MAX` nodes.
    pub fn push(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(cache) = self.cache.as_mut() {
            if let Some(handle) = cache.lookup(&node) {
                return handle;
            }
        }

        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        assert!(index < u32::MAX, "Arena capacity exceeded");

        let handle = ExprHandle::new(index);
        self.nodes.push(node);
        if let Some(cache) = self.cache.as_mut() {
            cache.record(node, handle);
        }
        handle
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> ExprNode {
        self.nodes[handle.slot()]
    }

    /// Returns all nodes in allocation order.
    #[must_use]
    pub fn nodes(&self) -> &[ExprNode] {
        &self.nodes
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if hash-consing is enabled.
    #[must_use]
    pub fn is_hash_consing(&self) -> bool {
        self.cache.is_some()
    }

    /// Returns the subexpression cache, if hash-consing is enabled.
    #[must_use]
    pub fn cache(&self) -> Option<&SubexpressionCache> {
        self.cache.as_ref()
    }

    // === Symbols ===

    /// Declares a fresh symbol and allocates its leaf node.
    ///
    /// Every call yields a new identity, even for identical arguments.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` symbols are declared.
    pub fn declare(&mut self, kind: SymbolKind, domain: Domain) -> (SymbolId, ExprHandle) {
        let index = u32::try_from(self.symbols.len()).unwrap_or(u32::MAX);
        assert!(index < u32::MAX, "Symbol table capacity exceeded");

        let id = SymbolId::new(self.id, index);
        self.symbols.push(SymbolRecord { kind, domain });
        (id, self.push(ExprNode::Symbol(id)))
    }

    /// Returns what was declared for `id`.
    ///
    /// Ids declared by another arena yield `None`.
    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<SymbolRecord> {
        if !self.owns(id) {
            return None;
        }
        self.symbols.get(id.index() as usize).copied()
    }

    /// Returns true if `id` was declared by this arena.
    #[must_use]
    pub fn owns(&self, id: SymbolId) -> bool {
        id.arena() == self.id
    }

    /// Returns this arena's process-wide identity.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the number of declared symbols.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    // === Shared values ===

    /// Registers a caller-owned cell and allocates a leaf reading it.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` cells are registered.
    pub fn share(&mut self, cell: Shared) -> ExprHandle {
        let index = u32::try_from(self.shared.len()).unwrap_or(u32::MAX);
        assert!(index < u32::MAX, "Shared table capacity exceeded");

        self.shared.push(cell);
        self.push(ExprNode::Shared(index))
    }

    /// Returns the cell behind a `Shared` leaf.
    #[must_use]
    pub fn shared(&self, id: SharedId) -> Option<&Shared> {
        self.shared.get(id as usize)
    }

    // === Convenience constructors ===

    /// Creates a constant leaf.
    pub fn constant(&mut self, value: f64) -> ExprHandle {
        self.push(ExprNode::Constant(Real(value)))
    }

    /// Creates an owned runtime value leaf, keeping the value's kind.
    pub fn value(&mut self, value: impl Into<Scalar>) -> ExprHandle {
        self.push(ExprNode::Value(Number(value.into())))
    }

    /// Creates a unary operator node.
    pub fn unary(&mut self, op: UnaryOp, arg: ExprHandle) -> ExprHandle {
        if let Some(c) = self.get(arg).as_constant() {
            return self.constant(op.apply(c));
        }
        self.push(ExprNode::Unary { op, arg })
    }

    /// Creates a binary operator node.
    ///
    /// An operator applied to two constants is folded into a constant.
    pub fn binary(&mut self, op: BinaryOp, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        if let (Some(a), Some(b)) = (self.get(lhs).as_constant(), self.get(rhs).as_constant()) {
            return self.constant(op.apply(a, b));
        }
        self.push(ExprNode::Binary { op, lhs, rhs })
    }

    /// Creates an addition node.
    pub fn add(&mut self, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    /// Creates a subtraction node.
    pub fn sub(&mut self, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    /// Creates a multiplication node.
    pub fn mul(&mut self, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    /// Creates a division node.
    pub fn div(&mut self, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        self.binary(BinaryOp::Div, lhs, rhs)
    }

    /// Creates `-arg` as `-1 * arg`.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        let minus_one = self.constant(-1.0);
        self.mul(minus_one, arg)
    }
}
