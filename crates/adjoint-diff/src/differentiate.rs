//! Symbolic differentiation.
//!
//! Differentiating an expression builds a new expression in the same graph.
//! The derivative of every reachable node is built once, operands first, so
//! shared sub-graphs stay shared in the result. The output can itself be
//! differentiated again for higher orders.

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use adjoint_core::{
    reachable, Bindings, Error, Expr, ExprHandle, ExprNode, Result, SymbolId, SymbolSet,
};

use crate::backprop::derivatives_of;
use crate::evaluate::evaluate_f64;
use crate::rules::Rule;

/// Returns the symbol `target` names.
///
/// # Errors
///
/// Returns [`Error::InvalidDifferentiationTarget`] unless `target` is a bare
/// variable or parameter.
pub fn target_symbol(target: &Expr) -> Result<SymbolId> {
    match target.node() {
        ExprNode::Symbol(id) => Ok(id),
        ExprNode::Constant(_) => Err(Error::InvalidDifferentiationTarget("a constant")),
        ExprNode::Value(_) => Err(Error::InvalidDifferentiationTarget("a runtime value")),
        ExprNode::Shared(_) => Err(Error::InvalidDifferentiationTarget("a shared value")),
        ExprNode::Unary { .. } | ExprNode::Binary { .. } => {
            Err(Error::InvalidDifferentiationTarget("a compound expression"))
        }
    }
}

/// Returns the derivative of `expr` with respect to the symbol `target`.
///
/// # Errors
///
/// Returns [`Error::ForeignGraph`] if `target` lives in another graph,
/// [`Error::InvalidDifferentiationTarget`] if it is not a variable or
/// parameter, and [`Error::StructuralZeroDivision`] if the derivative
/// would divide by the zero constant.
pub fn differentiate(expr: &Expr, target: &Expr) -> Result<Expr> {
    if !expr.graph().ptr_eq(target.graph()) {
        return Err(Error::ForeignGraph);
    }
    differentiate_wrt(expr, target_symbol(target)?)
}

/// Returns the derivative of `expr` with respect to the symbol `target`.
///
/// # Errors
///
/// Returns [`Error::ForeignGraph`] if `target` was declared in another
/// graph, [`Error::InvalidDifferentiationTarget`] if it was never declared,
/// and [`Error::StructuralZeroDivision`] if the derivative would divide by
/// the zero constant.
pub fn differentiate_wrt(expr: &Expr, target: SymbolId) -> Result<Expr> {
    let graph = expr.graph();
    if !graph.arena().owns(target) {
        return Err(Error::ForeignGraph);
    }
    if graph.symbol_record(target).is_none() {
        return Err(Error::InvalidDifferentiationTarget("an undeclared symbol"));
    }

    let order = reachable(&graph.arena(), expr.handle());
    let mut arena = graph.arena_mut();
    let zero = arena.constant(0.0);
    let one = arena.constant(1.0);

    let mut derived: FxHashMap<ExprHandle, ExprHandle> = FxHashMap::default();
    derived.reserve(order.len());
    for &handle in &order {
        let node = arena.get(handle);
        let derivative = match node {
            ExprNode::Symbol(id) if id == target => one,
            _ => match Rule::of(&node) {
                None => zero,
                Some(rule) => {
                    let operands = node.children();
                    let partials: SmallVec<[ExprHandle; 2]> =
                        operands.iter().map(|h| derived[h]).collect();
                    rule.differentiate(&mut arena, handle, &operands, &partials)?
                }
            },
        };
        derived.insert(handle, derivative);
    }
    drop(arena);

    debug!(
        "differentiated {} nodes with respect to {target}",
        order.len()
    );
    Ok(graph.expr(derived[&expr.handle()]))
}

/// Returns the `order`-th derivative of `expr` with respect to `target`,
/// evaluated at `bindings`.
///
/// Orders above one differentiate symbolically and back-propagate the last
/// step; order zero is the value itself.
///
/// # Errors
///
/// Returns the errors of [`differentiate`] and [`Error::UnboundSymbol`] if
/// a symbol is unbound.
pub fn derivative_of_order(
    expr: &Expr,
    target: &Expr,
    bindings: &Bindings,
    order: u32,
) -> Result<f64> {
    if order == 0 {
        return evaluate_f64(expr, bindings);
    }
    if !expr.graph().ptr_eq(target.graph()) {
        return Err(Error::ForeignGraph);
    }
    let id = target_symbol(target)?;

    let mut current = expr.clone();
    for _ in 1..order {
        current = differentiate_wrt(&current, id)?;
    }
    let targets = SymbolSet::try_from_ids([id])?;
    let derivatives = derivatives_of(&current, &targets, bindings)?;
    Ok(derivatives[&id])
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::{at, exp, shared, sqrt, Graph};

    #[test]
    fn test_symbol_wrt_itself_and_others() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let p = g.param();

        for (symbol, expected) in [(&x, 1.0), (&y, 0.0), (&p, 0.0)] {
            let d = differentiate(&x, symbol).unwrap();
            assert_eq!(d.node().as_constant(), Some(expected));
        }
        let dp = differentiate(&p, &p).unwrap();
        assert!(dp.node().is_one());
    }

    #[test]
    fn test_invalid_targets() {
        let g = Graph::new();
        let x = g.var();
        let c = g.constant(2.0);
        let e = &x * 2.0;

        assert_eq!(
            differentiate(&e, &c).unwrap_err(),
            Error::InvalidDifferentiationTarget("a constant")
        );
        assert_eq!(
            differentiate(&c, &c).unwrap_err(),
            Error::InvalidDifferentiationTarget("a constant")
        );
        assert!(differentiate(&e, &g.value(1.0)).is_err());
        assert!(differentiate(&e, &e).is_err());

        let other = Graph::new();
        let z = other.var();
        assert_eq!(differentiate(&e, &z).unwrap_err(), Error::ForeignGraph);
    }

    #[test]
    fn test_symbolic_agrees_with_back_propagation() {
        let g = Graph::new();
        let a = g.var();
        let b = g.var();
        let e = exp(&a + &b) * (&b - 1.0);
        let bindings = at([a.bind(1.0), b.bind(3.0)]).unwrap();

        let da = evaluate_f64(&differentiate(&e, &a).unwrap(), &bindings).unwrap();
        let db = evaluate_f64(&differentiate(&e, &b).unwrap(), &bindings).unwrap();

        let e4 = 4.0_f64.exp();
        assert!((da - e4 * 2.0).abs() < 1e-9);
        assert!((db - e4 * 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_higher_orders() {
        let g = Graph::new();
        let a = g.var();
        let b = g.var();
        let mu = g.param();
        let e = &a * &a * &a + 2.0 * &b * &b + &mu;

        let bindings = at([a.bind(1.0), b.bind(2.0), mu.bind(3.0)]).unwrap();
        let orders: Vec<f64> = (1..=3)
            .map(|n| derivative_of_order(&e, &a, &bindings, n).unwrap())
            .collect();
        assert_eq!(orders, vec![3.0, 6.0, 6.0]);

        let orders: Vec<f64> = (1..=3)
            .map(|n| derivative_of_order(&e, &b, &bindings, n).unwrap())
            .collect();
        assert_eq!(orders, vec![8.0, 4.0, 0.0]);

        assert_eq!(derivative_of_order(&e, &a, &bindings, 0).unwrap(), 12.0);
    }

    #[test]
    fn test_parameter_derivative_expression() {
        let g = Graph::new();
        let a = g.var();
        let b = g.var();
        let mu = g.param();
        let e = (&a + &b) * &b * &mu;
        let bindings = at([a.bind(1.0), b.bind(2.0), mu.bind(3.0)]).unwrap();

        let value = |target: &Expr| {
            evaluate_f64(&differentiate(&e, target).unwrap(), &bindings).unwrap()
        };
        assert_eq!(value(&a), 6.0);
        assert_eq!(value(&b), 15.0);
        assert_eq!(value(&mu), 6.0);
    }

    #[test]
    fn test_structural_zero_division() {
        let g = Graph::new();
        let x = g.var();
        let e = &x / g.constant(0.0);

        assert_eq!(
            differentiate(&e, &x).unwrap_err(),
            Error::StructuralZeroDivision
        );
        // A denominator that only evaluates to zero is not caught.
        let y = g.var();
        let f = &x / (&y - &y);
        assert!(differentiate(&f, &x).is_ok());
    }

    #[test]
    fn test_sqrt_derivative() {
        let g = Graph::new();
        let x = g.var();
        let d = differentiate(&sqrt(&x), &x).unwrap();

        let v = evaluate_f64(&d, &at([x.bind(4.0)]).unwrap()).unwrap();
        assert!((v - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_value_derivative_survives_mutation() {
        let g = Graph::new();
        let x = g.var();
        let cell = shared(2.0);
        let e = &x * g.shared(&cell);

        let d = differentiate(&e, &x).unwrap();
        let bindings = at([x.bind(7.0)]).unwrap();
        assert_eq!(evaluate_f64(&d, &bindings).unwrap(), 2.0);

        cell.set(adjoint_core::Scalar::F64(-4.0));
        assert_eq!(evaluate_f64(&d, &bindings).unwrap(), -4.0);

        let dv = differentiate(&g.shared(&cell), &x).unwrap();
        assert!(dv.is_zero());
    }

    #[test]
    fn test_repeated_squaring_stays_linear() {
        let g = Graph::new();
        let x = g.var();
        let mut e = x.expr();
        for _ in 0..20 {
            e = &e * &e;
        }
        let before = g.len();
        let d = differentiate(&e, &x).unwrap();
        assert!(g.len() - before < 20 * 4 + 4);

        let v = evaluate_f64(&d, &at([x.bind(1.0)]).unwrap()).unwrap();
        assert_eq!(v, 2.0_f64.powi(20));
    }
}
