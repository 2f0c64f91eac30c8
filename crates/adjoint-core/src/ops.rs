//! Operator overloads composing expressions.
//!
//! `+ - * /` and unary `-` are implemented for [`Expr`], [`Symbol`] and
//! their references, with any [`IntoExpr`] operand on the right and `f64`
//! or `i32` literals on the left. Literals become runtime values, so
//! `x + 3.0` and `3.0 + x` build mirror-image trees.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::expr::{BinaryOp, UnaryOp};
use crate::graph::{Expr, Graph, Symbol};
use crate::handle::ExprHandle;
use crate::scalar::Scalar;

/// Something that already lives in a graph.
pub trait ExprLike {
    /// Returns the owning graph.
    fn graph(&self) -> &Graph;

    /// Returns the node handle.
    fn handle(&self) -> ExprHandle;
}

impl ExprLike for Expr {
    fn graph(&self) -> &Graph {
        Expr::graph(self)
    }

    fn handle(&self) -> ExprHandle {
        Expr::handle(self)
    }
}

impl ExprLike for Symbol {
    fn graph(&self) -> &Graph {
        Expr::graph(self)
    }

    fn handle(&self) -> ExprHandle {
        Expr::handle(self)
    }
}

impl<T: ExprLike + ?Sized> ExprLike for &T {
    fn graph(&self) -> &Graph {
        (**self).graph()
    }

    fn handle(&self) -> ExprHandle {
        (**self).handle()
    }
}

/// Conversion of an operand into an expression of a given graph.
pub trait IntoExpr {
    /// Converts `self`, allocating a leaf in `graph` if needed.
    ///
    /// # Panics
    ///
    /// Panics if `self` already belongs to a different graph.
    fn into_expr(self, graph: &Graph) -> Expr;
}

fn adopt(graph: &Graph, operand: &impl ExprLike) -> Expr {
    assert!(
        graph.ptr_eq(operand.graph()),
        "cannot combine expressions from different graphs"
    );
    graph.expr(operand.handle())
}

impl IntoExpr for Expr {
    fn into_expr(self, graph: &Graph) -> Expr {
        adopt(graph, &self)
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self, graph: &Graph) -> Expr {
        adopt(graph, self)
    }
}

impl IntoExpr for Symbol {
    fn into_expr(self, graph: &Graph) -> Expr {
        adopt(graph, &self)
    }
}

impl IntoExpr for &Symbol {
    fn into_expr(self, graph: &Graph) -> Expr {
        adopt(graph, self)
    }
}

impl IntoExpr for f64 {
    fn into_expr(self, graph: &Graph) -> Expr {
        graph.value(self)
    }
}

impl IntoExpr for i32 {
    fn into_expr(self, graph: &Graph) -> Expr {
        graph.value(self)
    }
}

impl IntoExpr for Scalar {
    fn into_expr(self, graph: &Graph) -> Expr {
        graph.value(self)
    }
}

fn combine(op: BinaryOp, lhs: &impl ExprLike, rhs: impl IntoExpr) -> Expr {
    let graph = lhs.graph();
    let rhs = rhs.into_expr(graph);
    let handle = graph.arena_mut().binary(op, lhs.handle(), rhs.handle);
    graph.expr(handle)
}

fn combine_literal(op: BinaryOp, lhs: impl IntoExpr, rhs: &impl ExprLike) -> Expr {
    let graph = rhs.graph();
    let lhs = lhs.into_expr(graph);
    let handle = graph.arena_mut().binary(op, lhs.handle, rhs.handle());
    graph.expr(handle)
}

fn negate(operand: &impl ExprLike) -> Expr {
    let graph = operand.graph();
    let handle = graph.arena_mut().neg(operand.handle());
    graph.expr(handle)
}

macro_rules! impl_binary_ops {
    ($($lhs:ty),* $(,)?) => {$(
        impl<R: IntoExpr> Add<R> for $lhs {
            type Output = Expr;

            fn add(self, rhs: R) -> Expr {
                combine(BinaryOp::Add, &self, rhs)
            }
        }

        impl<R: IntoExpr> Sub<R> for $lhs {
            type Output = Expr;

            fn sub(self, rhs: R) -> Expr {
                combine(BinaryOp::Sub, &self, rhs)
            }
        }

        impl<R: IntoExpr> Mul<R> for $lhs {
            type Output = Expr;

            fn mul(self, rhs: R) -> Expr {
                combine(BinaryOp::Mul, &self, rhs)
            }
        }

        impl<R: IntoExpr> Div<R> for $lhs {
            type Output = Expr;

            fn div(self, rhs: R) -> Expr {
                combine(BinaryOp::Div, &self, rhs)
            }
        }

        impl Neg for $lhs {
            type Output = Expr;

            fn neg(self) -> Expr {
                negate(&self)
            }
        }
    )*};
}

impl_binary_ops!(Expr, &Expr, Symbol, &Symbol);

macro_rules! impl_literal_ops {
    ($lit:ty => $($rhs:ty),* $(,)?) => {$(
        impl Add<$rhs> for $lit {
            type Output = Expr;

            fn add(self, rhs: $rhs) -> Expr {
                combine_literal(BinaryOp::Add, self, &rhs)
            }
        }

        impl Sub<$rhs> for $lit {
            type Output = Expr;

            fn sub(self, rhs: $rhs) -> Expr {
                combine_literal(BinaryOp::Sub, self, &rhs)
            }
        }

        impl Mul<$rhs> for $lit {
            type Output = Expr;

            fn mul(self, rhs: $rhs) -> Expr {
                combine_literal(BinaryOp::Mul, self, &rhs)
            }
        }

        impl Div<$rhs> for $lit {
            type Output = Expr;

            fn div(self, rhs: $rhs) -> Expr {
                combine_literal(BinaryOp::Div, self, &rhs)
            }
        }
    )*};
}

impl_literal_ops!(f64 => Expr, &Expr, Symbol, &Symbol);
impl_literal_ops!(i32 => Expr, &Expr, Symbol, &Symbol);

/// Returns `exp(operand)`.
#[must_use]
pub fn exp(operand: impl ExprLike) -> Expr {
    unary(UnaryOp::Exp, &operand)
}

/// Returns `sqrt(operand)`.
#[must_use]
pub fn sqrt(operand: impl ExprLike) -> Expr {
    unary(UnaryOp::Sqrt, &operand)
}

fn unary(op: UnaryOp, operand: &impl ExprLike) -> Expr {
    let graph = operand.graph();
    let handle = graph.arena_mut().unary(op, operand.handle());
    graph.expr(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprNode;

    #[test]
    fn test_literal_on_either_side() {
        let g = Graph::new();
        let x = g.var();

        let right = &x + 3.0;
        let left = 3.0 + &x;

        match (right.node(), left.node()) {
            (
                ExprNode::Binary { lhs: a, rhs: b, .. },
                ExprNode::Binary { lhs: c, rhs: d, .. },
            ) => {
                assert_eq!(a, x.handle());
                assert_eq!(d, x.handle());
                assert!(matches!(g.node(b), ExprNode::Value(_)));
                assert!(matches!(g.node(c), ExprNode::Value(_)));
            }
            _ => panic!("expected binary nodes"),
        }
    }

    #[test]
    fn test_composition_allocates_fresh_nodes() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();

        let e1 = &x * &y;
        let e2 = &x * &y;
        assert_ne!(e1, e2);

        let e3 = e1.clone() + e2;
        assert!(e3.handle() > e1.handle());
    }

    #[test]
    fn test_negation_multiplies_by_minus_one() {
        let g = Graph::new();
        let x = g.var();
        let n = -&x;

        match n.node() {
            ExprNode::Binary { op, lhs, rhs } => {
                assert_eq!(op, BinaryOp::Mul);
                assert_eq!(g.node(lhs).as_constant(), Some(-1.0));
                assert_eq!(rhs, x.handle());
            }
            _ => panic!("expected a product"),
        }
    }

    #[test]
    fn test_functions() {
        let g = Graph::new();
        let x = g.var();

        let e = exp(&x);
        let s = sqrt(e.clone());
        assert!(matches!(e.node(), ExprNode::Unary { op: UnaryOp::Exp, .. }));
        assert!(matches!(s.node(), ExprNode::Unary { op: UnaryOp::Sqrt, .. }));
        assert!(matches!(
            x.exp().node(),
            ExprNode::Unary { op: UnaryOp::Exp, .. }
        ));
    }

    #[test]
    #[should_panic(expected = "different graphs")]
    fn test_mixing_graphs_panics() {
        let g = Graph::new();
        let h = Graph::new();
        let x = g.var();
        let y = h.var();
        let _ = &x + &y;
    }
}
