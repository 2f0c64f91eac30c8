//! Symbolic jacobians.
//!
//! A [`JacobianExpr`] holds one derivative expression per (component,
//! target) pair. Iterative solvers build it once and evaluate it at every
//! iterate instead of differentiating again.

use log::trace;

use adjoint_core::{Bindings, Expr, Result, SymbolSet};
use adjoint_diff::{evaluate_f64, Jacobian};

use crate::shape::Shape;
use crate::tensor::TensorExpr;

/// Partial-derivative expressions of a vector, row-major.
#[derive(Clone, Debug)]
pub struct JacobianExpr {
    symbols: SymbolSet,
    num_rows: usize,
    entries: Vec<Expr>,
}

impl JacobianExpr {
    pub(crate) fn new(symbols: SymbolSet, num_rows: usize, entries: Vec<Expr>) -> Self {
        debug_assert_eq!(entries.len(), num_rows * symbols.len());
        Self {
            symbols,
            num_rows,
            entries,
        }
    }

    /// Returns the column labels.
    #[must_use]
    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the entry at `(row, col)`.
    #[must_use]
    pub fn entry(&self, row: usize, col: usize) -> Option<&Expr> {
        if col >= self.symbols.len() {
            return None;
        }
        self.entries.get(row * self.symbols.len() + col)
    }

    /// Returns the entries as a matrix-shaped tensor.
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::ShapeMismatch`] if there are no
    /// targets.
    pub fn to_tensor(&self) -> Result<TensorExpr> {
        TensorExpr::new(
            Shape::matrix(self.num_rows, self.symbols.len()),
            self.entries.clone(),
        )
    }

    /// Evaluates every entry.
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if an entry depends on
    /// an unbound symbol.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<Jacobian> {
        let mut jacobian = Jacobian::zeros(self.num_rows, self.symbols.clone());
        let cols = self.symbols.len();
        for (flat, entry) in self.entries.iter().enumerate() {
            jacobian[(flat / cols, flat % cols)] = evaluate_f64(entry, bindings)?;
        }
        trace!(
            "evaluated {}x{} jacobian expression",
            self.num_rows,
            cols
        );
        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use adjoint_core::{at, wrt, Graph};

    use crate::tensor::TensorExpr;

    #[test]
    fn test_matches_numeric_jacobian() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let v = TensorExpr::vector(vec![&x * &x * &y, adjoint_core::exp(&x - &y)]).unwrap();
        let targets = wrt!(x, y).unwrap();

        let symbolic = v.jacobian_expression(&targets).unwrap();
        assert_eq!(symbolic.num_rows(), 2);
        assert_eq!(symbolic.to_tensor().unwrap().shape().dims(), &[2, 2]);

        for (vx, vy) in [(1.0, 2.0), (-0.5, 0.25), (3.0, 3.0)] {
            let b = at([x.bind(vx), y.bind(vy)]).unwrap();
            let numeric = v.jacobian_wrt(&targets, &b).unwrap();
            let evaluated = symbolic.evaluate(&b).unwrap();
            for (a, e) in numeric.row(0).iter().chain(numeric.row(1)).zip(
                evaluated.row(0).iter().chain(evaluated.row(1)),
            ) {
                assert!((a - e).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_entry_access() {
        let g = Graph::new();
        let x = g.var();
        let p = g.param();
        let v = TensorExpr::vector(vec![&x * &p]).unwrap();

        let symbolic = v.jacobian_expression(&wrt!(x, p).unwrap()).unwrap();
        let b = at([x.bind(2.0), p.bind(7.0)]).unwrap();
        let dx = symbolic.entry(0, 0).unwrap();
        assert_eq!(adjoint_diff::evaluate_f64(dx, &b).unwrap(), 7.0);
        assert!(symbolic.entry(0, 2).is_none());
        assert!(symbolic.entry(1, 0).is_none());
    }
}
