//! Translation between graph expressions and e-graph terms.

use egg::{Id, RecExpr, Symbol};
use rustc_hash::FxHashMap;

use adjoint_core::{reachable, BinaryOp, Error, Expr, ExprHandle, ExprNode, Graph, Result, UnaryOp};

use crate::language::{AdjointLang, Literal};

/// A term lowered from a graph, with the table needed to rebuild it.
#[derive(Debug)]
pub struct Lowered {
    /// The e-graph term.
    pub term: RecExpr<AdjointLang>,
    /// Opaque leaf names and the graph nodes they stand for.
    pub leaves: FxHashMap<Symbol, ExprHandle>,
}

/// Lowers the subgraph under `expr` into a term.
///
/// Constants become literals; symbols print as `s<id>`, runtime values as
/// `v<slot>` and shared values as `h<id>`. Shared subexpressions become
/// shared term nodes, so the term is no larger than the subgraph.
#[must_use]
pub fn lower(expr: &Expr) -> Lowered {
    let arena = expr.graph().arena();
    let mut term = RecExpr::default();
    let mut ids: FxHashMap<ExprHandle, Id> = FxHashMap::default();
    let mut leaves = FxHashMap::default();

    for handle in reachable(&arena, expr.handle()) {
        let node = match arena.get(handle) {
            ExprNode::Constant(c) => AdjointLang::Num(Literal(c.get())),
            ExprNode::Value(_) => leaf(&mut leaves, format!("v{}", handle.slot()), handle),
            ExprNode::Shared(id) => leaf(&mut leaves, format!("h{id}"), handle),
            ExprNode::Symbol(id) => leaf(&mut leaves, id.to_string(), handle),
            ExprNode::Unary { op, arg } => {
                let arg = ids[&arg];
                match op {
                    UnaryOp::Exp => AdjointLang::Exp(arg),
                    UnaryOp::Sqrt => AdjointLang::Sqrt(arg),
                }
            }
            ExprNode::Binary { op, lhs, rhs } => {
                let children = [ids[&lhs], ids[&rhs]];
                match op {
                    BinaryOp::Add => AdjointLang::Add(children),
                    BinaryOp::Sub => AdjointLang::Sub(children),
                    BinaryOp::Mul => AdjointLang::Mul(children),
                    BinaryOp::Div => AdjointLang::Div(children),
                }
            }
        };
        ids.insert(handle, term.add(node));
    }

    Lowered { term, leaves }
}

fn leaf(leaves: &mut FxHashMap<Symbol, ExprHandle>, name: String, handle: ExprHandle) -> AdjointLang {
    let symbol = Symbol::from(name);
    leaves.insert(symbol, handle);
    AdjointLang::Leaf(symbol)
}

/// Rebuilds a term in `graph`, returning the root expression.
///
/// Operators go through the arena's builders, so literal operands are
/// folded again on the way in.
///
/// # Errors
///
/// Returns [`Error::SimplifyFailed`] if the term is empty or names a leaf
/// missing from `leaves`.
pub fn raise(graph: &Graph, term: &RecExpr<AdjointLang>, leaves: &FxHashMap<Symbol, ExprHandle>) -> Result<Expr> {
    let nodes = term.as_ref();
    let mut handles: Vec<ExprHandle> = Vec::with_capacity(nodes.len());
    {
        let mut arena = graph.arena_mut();
        for node in nodes {
            let at = |id: Id| handles[usize::from(id)];
            let handle = match node {
                AdjointLang::Num(n) => arena.constant(n.0),
                AdjointLang::Leaf(name) => *leaves
                    .get(name)
                    .ok_or_else(|| Error::SimplifyFailed(format!("unknown leaf `{name}`")))?,
                AdjointLang::Add([a, b]) => arena.add(at(*a), at(*b)),
                AdjointLang::Sub([a, b]) => arena.sub(at(*a), at(*b)),
                AdjointLang::Mul([a, b]) => arena.mul(at(*a), at(*b)),
                AdjointLang::Div([a, b]) => arena.div(at(*a), at(*b)),
                AdjointLang::Exp(a) => arena.unary(UnaryOp::Exp, at(*a)),
                AdjointLang::Sqrt(a) => arena.unary(UnaryOp::Sqrt, at(*a)),
            };
            handles.push(handle);
        }
    }

    handles
        .last()
        .map(|&root| graph.expr(root))
        .ok_or_else(|| Error::SimplifyFailed("empty term".to_string()))
}
