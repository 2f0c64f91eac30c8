//! Reverse-mode accumulation.
//!
//! The value sweep of [`Sweep`] is followed by one pass over the same nodes
//! in reverse, pushing each node's adjoint onto its operands through the
//! local sensitivities of [`Rule::sensitivities`]. The adjoints that reach
//! the symbol leaves are the partial derivatives. The cost is linear in the
//! graph size, whatever the number of targets.

use log::debug;

use adjoint_core::{variables_of, Bindings, Error, Expr, ExprNode, Result, SymbolSet, Symbolic};

use crate::derivatives::Derivatives;
use crate::evaluate::Sweep;
use crate::rules::Rule;

/// Computes the value of `expr` and its derivatives with respect to
/// `targets`.
///
/// Targets `expr` does not depend on get a zero slot.
///
/// # Errors
///
/// Returns [`Error::ForeignGraph`] if a target was declared in another
/// graph, or [`Error::UnboundSymbol`] if a symbol `expr` depends on has no
/// binding.
pub fn back_propagate(
    expr: &Expr,
    bindings: &Bindings,
    targets: &SymbolSet,
) -> Result<(f64, Derivatives)> {
    let arena = expr.graph().arena();
    if targets.iter().any(|id| !arena.owns(id)) {
        return Err(Error::ForeignGraph);
    }
    let root = expr.handle();
    let sweep = Sweep::run(&arena, root, bindings)?;

    let mut adjoints = vec![0.0; root.slot() + 1];
    adjoints[root.slot()] = 1.0;

    let mut derivatives = Derivatives::zeros(targets.clone());
    for &handle in sweep.order.iter().rev() {
        let node = arena.get(handle);
        let adjoint = adjoints[handle.slot()];

        if let ExprNode::Symbol(id) = node {
            if let Some(slot) = derivatives.get_mut(&id) {
                *slot += adjoint;
            }
            continue;
        }
        let Some(rule) = Rule::of(&node) else {
            continue;
        };

        let operands = node.children();
        let operand_values: smallvec::SmallVec<[f64; 2]> =
            operands.iter().map(|&h| sweep.value(h)).collect();
        let sensitivities = rule.sensitivities(&operand_values, sweep.value(handle));
        for (operand, sensitivity) in operands.iter().zip(sensitivities) {
            adjoints[operand.slot()] += adjoint * sensitivity;
        }
    }

    debug!(
        "back-propagated through {} nodes onto {} targets",
        sweep.order.len(),
        targets.len()
    );
    Ok((sweep.value(root), derivatives))
}

/// Returns the derivatives of `expr` with respect to `targets`.
///
/// # Errors
///
/// Returns [`Error::ForeignGraph`] if a target was declared in another
/// graph, or [`Error::UnboundSymbol`] if a symbol `expr` depends on has no
/// binding.
pub fn derivatives_of(expr: &Expr, targets: &SymbolSet, bindings: &Bindings) -> Result<Derivatives> {
    back_propagate(expr, bindings, targets).map(|(_, derivatives)| derivatives)
}

/// Returns the derivative of `expr` with respect to a single symbol.
///
/// # Errors
///
/// Returns [`Error::UnboundSymbol`] if a symbol `expr` depends on has no
/// binding.
pub fn derivative_of(expr: &Expr, target: &impl Symbolic, bindings: &Bindings) -> Result<f64> {
    let id = target.symbol_id();
    let targets = SymbolSet::try_from_ids([id])?;
    let derivatives = derivatives_of(expr, &targets, bindings)?;
    derivatives.get(&id).ok_or(Error::UnboundSymbol(id))
}

/// Returns the gradient of `expr` with respect to the variables it depends
/// on, in declaration order. Parameters are not included.
///
/// # Errors
///
/// Returns [`Error::UnboundSymbol`] if a symbol `expr` depends on has no
/// binding.
pub fn grad(expr: &Expr, bindings: &Bindings) -> Result<Derivatives> {
    derivatives_of(expr, &variables_of(expr), bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::{at, exp, sqrt, wrt, Graph};

    #[test]
    fn test_grad_of_polynomial() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let e = 2.0 * (&x + &y) * &x;

        let d = grad(&e, &at([x.bind(3.0), y.bind(2.0)]).unwrap()).unwrap();
        assert_eq!(d.values(), &[16.0, 6.0]);
        assert_eq!(d[&x], 16.0);
        assert_eq!(d[&y], 6.0);
    }

    #[test]
    fn test_value_and_derivatives() {
        let g = Graph::new();
        let a = g.var();
        let b = g.var();
        let e = exp(&a + &b) * (&b - 1.0);

        let bindings = at([a.bind(1.0), b.bind(3.0)]).unwrap();
        let (value, d) = back_propagate(&e, &bindings, &wrt!(a, b).unwrap()).unwrap();

        let e4 = 4.0_f64.exp();
        assert!((value - e4 * 2.0).abs() < 1e-9);
        assert!((d[&a] - e4 * 2.0).abs() < 1e-9);
        assert!((d[&b] - e4 * 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_grad_skips_parameters() {
        let g = Graph::new();
        let a = g.var();
        let mu = g.param();
        let e = &a * &mu;

        let bindings = at([a.bind(2.0), mu.bind(5.0)]).unwrap();
        let d = grad(&e, &bindings).unwrap();
        assert_eq!(d.symbols().as_slice(), &[a.id()]);
        assert_eq!(d[&a], 5.0);

        // Explicitly requested parameters are differentiated too.
        assert_eq!(derivative_of(&e, &mu, &bindings).unwrap(), 2.0);
    }

    #[test]
    fn test_shared_subexpressions_accumulate() {
        let g = Graph::new();
        let x = g.var();
        let sq = &x * &x;
        let e = &sq * &sq;

        let d = derivative_of(&e, &x, &at([x.bind(2.0)]).unwrap()).unwrap();
        assert_eq!(d, 32.0);
    }

    #[test]
    fn test_quotient_and_sqrt() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let e = &x / &y + sqrt(&x);

        let bindings = at([x.bind(4.0), y.bind(2.0)]).unwrap();
        let d = derivatives_of(&e, &wrt!(x, y).unwrap(), &bindings).unwrap();
        assert!((d[&x] - (0.5 + 0.25)).abs() < 1e-12);
        assert!((d[&y] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unrelated_target_is_zero() {
        let g = Graph::new();
        let x = g.var();
        let z = g.var();
        let e = &x * 3.0;

        let d = derivatives_of(&e, &wrt!(x, z).unwrap(), &at([x.bind(1.0)]).unwrap()).unwrap();
        assert_eq!(d[&z], 0.0);
        assert_eq!(d[&x], 3.0);
    }

    #[test]
    fn test_values_have_zero_derivative() {
        let g = Graph::new();
        let x = g.var();
        let cell = adjoint_core::shared(3.0);
        let e = &x * g.shared(&cell);

        let bindings = at([x.bind(2.0)]).unwrap();
        let (value, d) = back_propagate(&e, &bindings, &wrt!(x).unwrap()).unwrap();
        assert_eq!(value, 6.0);
        assert_eq!(d[&x], 3.0);

        cell.set(adjoint_core::Scalar::F64(5.0));
        let (value, d) = back_propagate(&e, &bindings, &wrt!(x).unwrap()).unwrap();
        assert_eq!(value, 10.0);
        assert_eq!(d[&x], 5.0);
    }
}
