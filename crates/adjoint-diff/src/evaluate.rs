//! Numeric evaluation.
//!
//! Evaluation sweeps the nodes reachable from the root in arena order, so
//! every operand is computed before the operators that read it and shared
//! sub-graphs are computed once. Every symbol the root depends on must be
//! bound, and its current value must lie in the symbol's domain; this is
//! checked before any arithmetic happens.
//!
//! Two sweeps exist. [`Sweep`] computes every node in `f64`, the working
//! precision of differentiation. [`evaluate`] keeps each node's [`Scalar`]
//! kind: operands are promoted to a common kind and integers use integer
//! arithmetic, wrapping on overflow and truncating on division. Graph
//! constants are `f64`.

use log::trace;

use adjoint_core::{
    reachable, Bindings, Error, Expr, ExprArena, ExprHandle, ExprNode, Result, Scalar, ScalarKind,
};

/// Checks that every symbol in `order` is bound to a value its domain
/// accepts.
///
/// Shared cells may change kind after binding, so the domain is checked
/// against the value they hold now.
fn check_bindings(arena: &ExprArena, order: &[ExprHandle], bindings: &Bindings) -> Result<()> {
    for id in order.iter().filter_map(|&h| arena.get(h).as_symbol()) {
        let kind = bindings.value_of(&id)?.kind();
        if let Some(record) = arena.symbol(id) {
            if !record.domain.accepts(kind) {
                return Err(Error::DomainMismatch {
                    symbol: id,
                    domain: record.domain,
                    kind,
                });
            }
        }
    }
    Ok(())
}

/// Values of every node reachable from a root.
pub(crate) struct Sweep {
    /// Reachable handles, operands first.
    pub(crate) order: Vec<ExprHandle>,
    /// Node values indexed by slot; unreachable slots hold NaN.
    pub(crate) values: Vec<f64>,
}

impl Sweep {
    /// Evaluates every node reachable from `root`.
    pub(crate) fn run(arena: &ExprArena, root: ExprHandle, bindings: &Bindings) -> Result<Self> {
        let order = reachable(arena, root);
        check_bindings(arena, &order, bindings)?;

        let mut values = vec![f64::NAN; root.slot() + 1];
        for &handle in &order {
            values[handle.slot()] = match arena.get(handle) {
                ExprNode::Constant(c) => c.get(),
                ExprNode::Value(v) => v.get().to_f64(),
                ExprNode::Shared(id) => arena
                    .shared(id)
                    .map_or(f64::NAN, |cell| cell.get().to_f64()),
                ExprNode::Symbol(id) => bindings.value_of(&id)?.to_f64(),
                ExprNode::Unary { op, arg } => op.apply(values[arg.slot()]),
                ExprNode::Binary { op, lhs, rhs } => {
                    op.apply(values[lhs.slot()], values[rhs.slot()])
                }
            };
        }

        trace!("evaluated {} nodes", order.len());
        Ok(Self { order, values })
    }

    /// Returns the value computed for `handle`.
    pub(crate) fn value(&self, handle: ExprHandle) -> f64 {
        self.values[handle.slot()]
    }
}

/// Evaluates `expr` in the engine's working precision.
///
/// # Errors
///
/// Returns [`Error::UnboundSymbol`] if a symbol `expr` depends on has no
/// binding, or [`Error::DomainMismatch`] if a shared binding now holds a
/// value outside its symbol's domain.
pub fn evaluate_f64(expr: &Expr, bindings: &Bindings) -> Result<f64> {
    let arena = expr.graph().arena();
    let sweep = Sweep::run(&arena, expr.handle(), bindings)?;
    Ok(sweep.value(expr.handle()))
}

/// Evaluates `expr` with typed arithmetic.
///
/// The result kind is the promotion of the kinds flowing into the root:
/// `n * m` over two `i32` bindings is an `i32`, `n * m + 0.5` is an `f64`.
///
/// # Errors
///
/// Returns [`Error::UnboundSymbol`] if a symbol `expr` depends on has no
/// binding, [`Error::DomainMismatch`] if a shared binding now holds a value
/// outside its symbol's domain, or [`Error::IntegerDivisionByZero`] if an
/// integer division has a zero divisor.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<Scalar> {
    let arena = expr.graph().arena();
    let root = expr.handle();
    let order = reachable(&arena, root);
    check_bindings(&arena, &order, bindings)?;

    let mut values = vec![Scalar::F64(f64::NAN); root.slot() + 1];
    for &handle in &order {
        values[handle.slot()] = match arena.get(handle) {
            ExprNode::Constant(c) => Scalar::F64(c.get()),
            ExprNode::Value(v) => v.get(),
            ExprNode::Shared(id) => arena
                .shared(id)
                .map_or(Scalar::F64(f64::NAN), |cell| cell.get()),
            ExprNode::Symbol(id) => bindings.value_of(&id)?,
            ExprNode::Unary { op, arg } => op.apply_scalar(values[arg.slot()]),
            ExprNode::Binary { op, lhs, rhs } => {
                op.apply_scalar(values[lhs.slot()], values[rhs.slot()])?
            }
        };
    }

    trace!("evaluated {} typed nodes", order.len());
    Ok(values[root.slot()])
}

/// Evaluates `expr` with typed arithmetic, then converts to `kind`.
///
/// # Errors
///
/// As for [`evaluate`].
pub fn evaluate_as(expr: &Expr, bindings: &Bindings, kind: ScalarKind) -> Result<Scalar> {
    evaluate(expr, bindings).map(|value| value.convert(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::{at, exp, shared, Graph};

    #[test]
    fn test_exact_cancellation() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();

        let e = (&x + &y) * (&x - &y) / (&x + &y);
        let b = at([x.bind(3.0), y.bind(2.0)]).unwrap();

        assert_eq!(evaluate(&e, &b).unwrap(), Scalar::F64(1.0));
        let e1 = evaluate(&exp(&e), &b).unwrap().to_f64();
        assert!((e1 - std::f64::consts::E).abs() < 1e-15);
    }

    #[test]
    fn test_parameters_evaluate_like_variables() {
        let g = Graph::new();
        let a = g.var();
        let b = g.param();
        let formula = (&a + &b) * &a;

        let bindings = at([a.bind(2.0), b.bind(4.0)]).unwrap();
        assert_eq!(evaluate_f64(&formula, &bindings).unwrap(), 12.0);
    }

    #[test]
    fn test_result_kind_follows_operands() {
        let g = Graph::new();
        let n = g.var();
        let m = g.var();
        let product = &n * &m + 1;

        let ints = at([n.bind(2), m.bind(3)]).unwrap();
        assert_eq!(evaluate(&product, &ints).unwrap(), Scalar::I32(7));

        let mixed = at([n.bind(2), m.bind(3_i64)]).unwrap();
        assert_eq!(evaluate(&product, &mixed).unwrap(), Scalar::I64(7));

        let halves = &n * &m + 0.5;
        assert_eq!(evaluate(&halves, &ints).unwrap(), Scalar::F64(6.5));
        assert_eq!(
            evaluate_as(&halves, &ints, ScalarKind::I32).unwrap(),
            Scalar::I32(6)
        );
    }

    #[test]
    fn test_integer_division_truncates_per_operator() {
        let g = Graph::new();
        let n = g.var();
        let m = g.var();
        let e = &n / &m * &m;

        let b = at([n.bind(3), m.bind(2)]).unwrap();
        assert_eq!(evaluate(&e, &b).unwrap(), Scalar::I32(2));
        assert_eq!(evaluate_f64(&e, &b).unwrap(), 3.0);

        let zero = at([n.bind(3), m.bind(0)]).unwrap();
        assert_eq!(
            evaluate(&e, &zero).unwrap_err(),
            Error::IntegerDivisionByZero
        );
    }

    #[test]
    fn test_shared_binding_domain_is_checked_at_evaluation() {
        let g = Graph::new();
        let x = g.var_in(adjoint_core::Domain::Real);
        let e = &x * 2.0;

        let cell = shared(1.5);
        let b = at([x.bind(&cell)]).unwrap();
        assert_eq!(evaluate_f64(&e, &b).unwrap(), 3.0);

        cell.set(Scalar::I32(4));
        let mismatch = Error::DomainMismatch {
            symbol: x.id(),
            domain: adjoint_core::Domain::Real,
            kind: ScalarKind::I32,
        };
        assert_eq!(evaluate_f64(&e, &b).unwrap_err(), mismatch);
        assert_eq!(evaluate(&e, &b).unwrap_err(), mismatch);
    }

    #[test]
    fn test_unbound_symbol_is_reported() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let e = &x + &y;

        let b = at([x.bind(1.0)]).unwrap();
        assert_eq!(evaluate(&e, &b).unwrap_err(), Error::UnboundSymbol(y.id()));
    }

    #[test]
    fn test_extra_bindings_are_ignored() {
        let g = Graph::new();
        let a = g.var();
        let c = g.var();
        let e = exp(&a * 2.0);

        let b = at([a.bind(1.0), c.bind(10.0)]).unwrap();
        assert_eq!(evaluate_f64(&e, &b).unwrap(), 2.0_f64.exp());
    }

    #[test]
    fn test_values_and_shared_values() {
        let g = Graph::new();
        let x = g.var();
        let cell = shared(2.0);
        let e = &x * g.shared(&cell) + g.value(1.0);

        let b = at([x.bind(3.0)]).unwrap();
        assert_eq!(evaluate_f64(&e, &b).unwrap(), 7.0);

        cell.set(Scalar::F64(10.0));
        assert_eq!(evaluate_f64(&e, &b).unwrap(), 31.0);
    }

    #[test]
    fn test_runtime_zero_division_is_not_trapped() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let e = &x / &y;

        let b = at([x.bind(1.0), y.bind(0.0)]).unwrap();
        assert!(evaluate_f64(&e, &b).unwrap().is_infinite());
    }
}
