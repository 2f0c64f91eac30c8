//! Graph handles, expressions and symbols.
//!
//! A [`Graph`] owns the arena behind a shared, reference-counted handle.
//! [`Expr`] pairs a graph with a node handle so operator overloads can
//! allocate new nodes without an explicit arena argument.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::arena::ExprArena;
use crate::expr::{ExprNode, UnaryOp};
use crate::handle::ExprHandle;
use crate::scalar::{Domain, Shared};
use crate::symbol::{SymbolId, SymbolKind, SymbolRecord, Symbolic};

/// Configuration for a new graph.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Intern structurally identical nodes to a single handle.
    pub hash_consing: bool,
    /// Initial node capacity.
    pub capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            hash_consing: false,
            capacity: 64,
        }
    }
}

/// A shared handle to an expression arena.
///
/// Cloning a graph clones the handle, not the arena.
#[derive(Clone, Default)]
pub struct Graph {
    arena: Rc<RefCell<ExprArena>>,
}

impl Graph {
    /// Creates a graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Creates a graph with a custom configuration.
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        let arena = if config.hash_consing {
            ExprArena::with_hash_consing(config.capacity)
        } else {
            ExprArena::with_capacity(config.capacity)
        };
        Self {
            arena: Rc::new(RefCell::new(arena)),
        }
    }

    /// Borrows the arena.
    ///
    /// # Panics
    ///
    /// Panics if the arena is currently borrowed mutably.
    #[must_use]
    pub fn arena(&self) -> Ref<'_, ExprArena> {
        self.arena.borrow()
    }

    /// Borrows the arena mutably.
    ///
    /// # Panics
    ///
    /// Panics if the arena is currently borrowed.
    #[must_use]
    pub fn arena_mut(&self) -> RefMut<'_, ExprArena> {
        self.arena.borrow_mut()
    }

    /// Returns true if both handles refer to the same arena.
    #[must_use]
    pub fn ptr_eq(&self, other: &Graph) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena)
    }

    /// Wraps a handle of this graph as an expression.
    #[must_use]
    pub fn expr(&self, handle: ExprHandle) -> Expr {
        Expr {
            graph: self.clone(),
            handle,
        }
    }

    /// Returns the node behind `handle`.
    #[must_use]
    pub fn node(&self, handle: ExprHandle) -> ExprNode {
        self.arena().get(handle)
    }

    /// Returns the declaration record of `id`.
    #[must_use]
    pub fn symbol_record(&self, id: SymbolId) -> Option<SymbolRecord> {
        self.arena().symbol(id)
    }

    // === Leaves ===

    fn declare(&self, kind: SymbolKind, domain: Domain) -> Symbol {
        let (id, handle) = self.arena_mut().declare(kind, domain);
        Symbol {
            expr: self.expr(handle),
            id,
            kind,
            domain,
        }
    }

    /// Declares an unconstrained variable.
    #[must_use]
    pub fn var(&self) -> Symbol {
        self.declare(SymbolKind::Variable, Domain::Any)
    }

    /// Declares a variable accepting values of `domain`.
    #[must_use]
    pub fn var_in(&self, domain: Domain) -> Symbol {
        self.declare(SymbolKind::Variable, domain)
    }

    /// Declares an unconstrained parameter.
    #[must_use]
    pub fn param(&self) -> Symbol {
        self.declare(SymbolKind::Parameter, Domain::Any)
    }

    /// Declares a parameter accepting values of `domain`.
    #[must_use]
    pub fn param_in(&self, domain: Domain) -> Symbol {
        self.declare(SymbolKind::Parameter, domain)
    }

    /// Creates a constant.
    ///
    /// Constants never need binding and take part in derivative
    /// simplification; they cannot be differentiated against.
    #[must_use]
    pub fn constant(&self, value: f64) -> Expr {
        let handle = self.arena_mut().constant(value);
        self.expr(handle)
    }

    /// Creates a runtime value, snapshotted now.
    #[must_use]
    pub fn value(&self, value: impl Into<crate::scalar::Scalar>) -> Expr {
        let handle = self.arena_mut().value(value);
        self.expr(handle)
    }

    /// Creates a runtime value that reads `cell` at every evaluation.
    #[must_use]
    pub fn shared(&self, cell: &Shared) -> Expr {
        let handle = self.arena_mut().share(Rc::clone(cell));
        self.expr(handle)
    }

    /// Returns the number of nodes allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena().len()
    }

    /// Returns true if no node has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena().is_empty()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena();
        f.debug_struct("Graph")
            .field("nodes", &arena.len())
            .field("symbols", &arena.symbol_count())
            .field("hash_consing", &arena.is_hash_consing())
            .finish()
    }
}

/// An expression: a node of a particular graph.
///
/// Cloning an expression is cheap; both clones name the same node.
#[derive(Clone)]
pub struct Expr {
    pub(crate) graph: Graph,
    pub(crate) handle: ExprHandle,
}

impl Expr {
    /// Returns the graph this expression lives in.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns the node handle.
    #[must_use]
    pub fn handle(&self) -> ExprHandle {
        self.handle
    }

    /// Returns the root node.
    #[must_use]
    pub fn node(&self) -> ExprNode {
        self.graph.node(self.handle)
    }

    /// Returns `exp(self)`.
    #[must_use]
    pub fn exp(&self) -> Expr {
        self.apply(UnaryOp::Exp)
    }

    /// Returns `sqrt(self)`.
    #[must_use]
    pub fn sqrt(&self) -> Expr {
        self.apply(UnaryOp::Sqrt)
    }

    fn apply(&self, op: UnaryOp) -> Expr {
        let handle = self.graph.arena_mut().unary(op, self.handle);
        self.graph.expr(handle)
    }

    /// Returns true if this is the exact zero constant.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.node().is_zero()
    }

    /// Returns the symbol this expression is, if it is a bare symbol.
    #[must_use]
    pub fn as_symbol(&self) -> Option<SymbolId> {
        self.node().as_symbol()
    }
}

impl PartialEq for Expr {
    /// Two expressions are equal when they name the same node.
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.graph.ptr_eq(&other.graph)
    }
}

impl Eq for Expr {}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} = {:?}", self.handle, self.node())
    }
}

/// A declared variable or parameter.
///
/// A symbol is deliberately not `Clone`: each declaration is one identity,
/// and expressions refer to it by borrowing (`&x + &y`) or consuming it.
pub struct Symbol {
    expr: Expr,
    id: SymbolId,
    kind: SymbolKind,
    domain: Domain,
}

impl Symbol {
    /// Returns the identity of this symbol.
    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Returns whether this is a variable or a parameter.
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Returns the declared domain.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns true for variables.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.kind == SymbolKind::Variable
    }

    /// Returns the leaf expression naming this symbol.
    #[must_use]
    pub fn expr(&self) -> Expr {
        self.expr.clone()
    }
}

impl Deref for Symbol {
    type Target = Expr;

    fn deref(&self) -> &Expr {
        &self.expr
    }
}

impl Symbolic for Symbol {
    fn symbol_id(&self) -> SymbolId {
        self.id
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("domain", &self.domain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fixed_at_declaration() {
        let g = Graph::new();
        let symbols: Vec<Symbol> = (0..3).map(|_| g.var()).collect();

        assert_ne!(symbols[0].id(), symbols[1].id());
        assert_ne!(symbols[1].id(), symbols[2].id());
        assert_eq!(g.arena().symbol_count(), 3);
    }

    #[test]
    fn test_symbol_metadata() {
        let g = Graph::new();
        let p = g.param_in(Domain::Real);

        assert_eq!(p.kind(), SymbolKind::Parameter);
        assert_eq!(p.domain(), Domain::Real);
        assert!(!p.is_variable());
        assert_eq!(p.as_symbol(), Some(p.id()));
        assert_eq!(
            g.symbol_record(p.id()),
            Some(SymbolRecord {
                kind: SymbolKind::Parameter,
                domain: Domain::Real
            })
        );
    }

    #[test]
    fn test_expr_equality_is_identity() {
        let g = Graph::new();
        let a = g.value(1.0);
        let b = g.value(1.0);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let other = Graph::new();
        let c = other.value(1.0);
        assert_eq!(a.handle(), c.handle());
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_consing_config() {
        let g = Graph::with_config(GraphConfig {
            hash_consing: true,
            ..GraphConfig::default()
        });
        let a = g.value(2.0);
        let b = g.value(2.0);
        assert_eq!(a, b);
        assert_eq!(g.len(), 1);
    }
}
