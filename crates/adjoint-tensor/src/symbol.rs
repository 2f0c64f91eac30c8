//! Tensors of fresh symbols.

use std::fmt;
use std::ops::Deref;

use adjoint_core::{Assignment, Bound, Domain, Error, Graph, Result, Shared, Symbol, SymbolSet};

use crate::shape::Shape;
use crate::tensor::TensorExpr;

/// A tensor whose elements are freshly declared symbols.
///
/// Dereferences to the [`TensorExpr`] of its elements, so the tensor
/// operations apply directly.
pub struct TensorSymbol {
    symbols: Vec<Symbol>,
    expr: TensorExpr,
}

impl TensorSymbol {
    /// Declares a tensor of variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shape holds no elements.
    pub fn var(graph: &Graph, shape: impl Into<Shape>) -> Result<Self> {
        Self::declare(graph, shape.into(), |g| g.var())
    }

    /// Declares a tensor of variables restricted to `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shape holds no elements.
    pub fn var_in(graph: &Graph, shape: impl Into<Shape>, domain: Domain) -> Result<Self> {
        Self::declare(graph, shape.into(), |g| g.var_in(domain))
    }

    /// Declares a tensor of parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shape holds no elements.
    pub fn param(graph: &Graph, shape: impl Into<Shape>) -> Result<Self> {
        Self::declare(graph, shape.into(), |g| g.param())
    }

    fn declare(graph: &Graph, shape: Shape, make: impl Fn(&Graph) -> Symbol) -> Result<Self> {
        let symbols: Vec<Symbol> = (0..shape.count()).map(|_| make(graph)).collect();
        let expr = TensorExpr::new(shape, symbols.iter().map(Symbol::expr).collect())?;
        Ok(Self { symbols, expr })
    }

    /// Returns the element symbols in row-major order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Returns the element symbol at a row-major position.
    #[must_use]
    pub fn symbol(&self, flat: usize) -> Option<&Symbol> {
        self.symbols.get(flat)
    }

    /// Returns the element ids as a differentiation target set.
    #[must_use]
    pub fn vars(&self) -> SymbolSet {
        self.symbols.iter().map(Symbol::id).collect()
    }

    /// Returns the tensor of element expressions.
    #[must_use]
    pub fn expr(&self) -> &TensorExpr {
        &self.expr
    }

    /// Binds one value per element, in row-major order.
    ///
    /// The result is a composite assignment that expands into one scalar
    /// binding per element when a store is built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the number of values differs from
    /// the element count, and [`Error::DomainMismatch`] if a value violates
    /// an element's domain.
    pub fn bind<I>(&self, values: I) -> Result<Assignment>
    where
        I: IntoIterator,
        I::Item: Into<Bound>,
    {
        let values: Vec<Bound> = values.into_iter().map(Into::into).collect();
        if values.len() != self.symbols.len() {
            return Err(Error::ShapeMismatch {
                expected: self.expr.shape().dims().to_vec(),
                got: vec![values.len()],
            });
        }
        self.symbols
            .iter()
            .zip(values)
            .map(|(symbol, value)| symbol.bind(value))
            .collect::<Result<Vec<_>>>()
            .map(Assignment::Composite)
    }

    /// Binds every element to a shared cell, so later writes to the cells
    /// are seen by evaluation.
    ///
    /// # Errors
    ///
    /// See [`TensorSymbol::bind`].
    pub fn bind_shared(&self, cells: &[Shared]) -> Result<Assignment> {
        self.bind(cells)
    }

    /// Associates one display name per element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the number of names differs from
    /// the element count.
    pub fn named<I>(&self, names: I) -> Result<Assignment<String>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.symbols.len() {
            return Err(Error::ShapeMismatch {
                expected: self.expr.shape().dims().to_vec(),
                got: vec![names.len()],
            });
        }
        Ok(Assignment::Composite(
            self.symbols
                .iter()
                .zip(names)
                .map(|(symbol, name)| symbol.named(name))
                .collect(),
        ))
    }
}

impl Deref for TensorSymbol {
    type Target = TensorExpr;

    fn deref(&self) -> &TensorExpr {
        &self.expr
    }
}

impl fmt::Debug for TensorSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorSymbol")
            .field("shape", self.expr.shape())
            .field("symbols", &self.vars())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::{at, shared, Bindings, Names, Scalar};

    #[test]
    fn test_binding_expands_per_element() {
        let g = Graph::new();
        let v = TensorSymbol::var(&g, [3]).unwrap();

        let assignment = v.bind([0.0, 1.0, 2.0]).unwrap();
        let flat = assignment.clone().flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[2].0, v.symbols()[2].id());

        let b = Bindings::try_from_assignments([Ok(assignment)]).unwrap();
        assert_eq!(b.len(), 3);
        assert_eq!(v.evaluate(&b).unwrap().values(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_binding_checks_count_and_duplicates() {
        let g = Graph::new();
        let v = TensorSymbol::var(&g, [2]).unwrap();
        assert!(matches!(
            v.bind([1.0]).unwrap_err(),
            Error::ShapeMismatch { .. }
        ));

        let err = at([v.bind([1.0, 2.0]), v.bind([3.0, 4.0])]).unwrap_err();
        assert_eq!(err, Error::DuplicateSymbol(v.symbols()[0].id()));
    }

    #[test]
    fn test_binding_by_reference() {
        let g = Graph::new();
        let v = TensorSymbol::var(&g, [3]).unwrap();
        let e = v.scaled_with(2.0);

        let cells: Vec<Shared> = [42.0, 43.0, 44.0].into_iter().map(shared).collect();
        let b = at([v.bind_shared(&cells)]).unwrap();
        assert_eq!(e.evaluate(&b).unwrap().values(), &[84.0, 86.0, 88.0]);

        cells[0].set(Scalar::F64(13.0));
        assert_eq!(e.evaluate(&b).unwrap().values(), &[26.0, 86.0, 88.0]);
    }

    #[test]
    fn test_elementwise_expression() {
        let g = Graph::new();
        let v = TensorSymbol::var(&g, [3]).unwrap();
        let e = TensorExpr::vector(vec![&v[0] * &v[1], &v[1] * &v[2], &v[2] * &v[0]]).unwrap();

        let result = e.evaluate(&at([v.bind([42.0, 2.0, 10.0])]).unwrap()).unwrap();
        assert_eq!(result.values(), &[84.0, 20.0, 420.0]);
    }

    #[test]
    fn test_tensor_contraction_of_symbols() {
        let g = Graph::new();
        let t0 = TensorSymbol::var(&g, [1, 2, 3]).unwrap();
        let t1 = TensorSymbol::var(&g, [3, 2]).unwrap();
        let e = t0.contract(&t1).unwrap();
        assert_eq!(e.shape(), &Shape::new(&[1, 2, 2]));

        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = at([t0.bind(values), t1.bind(values)]).unwrap();
        let r = e.evaluate(&b).unwrap();
        assert_eq!(r[[0, 0, 0]], 1.0 * 1.0 + 2.0 * 3.0 + 3.0 * 5.0);
        assert_eq!(r[[0, 0, 1]], 1.0 * 2.0 + 2.0 * 4.0 + 3.0 * 6.0);
        assert_eq!(r[[0, 1, 0]], 4.0 * 1.0 + 5.0 * 3.0 + 6.0 * 5.0);
        assert_eq!(r[[0, 1, 1]], 4.0 * 2.0 + 5.0 * 4.0 + 6.0 * 6.0);
    }

    #[test]
    fn test_dot_with_itself() {
        let g = Graph::new();
        let v = TensorSymbol::var(&g, [3]).unwrap();
        let w = TensorSymbol::var(&g, [3]).unwrap();
        let b = at([v.bind([1.0, 2.0, 3.0]), w.bind([1.0, 2.0, 3.0])]).unwrap();

        let vw = v.dot(&w).unwrap();
        assert_eq!(adjoint_diff::evaluate_f64(&vw, &b).unwrap(), 14.0);
        let vv = v.dot(&v).unwrap();
        assert_eq!(adjoint_diff::evaluate_f64(&vv, &b).unwrap(), 14.0);
    }

    #[test]
    fn test_named_rendering() {
        let g = Graph::new();
        let v = TensorSymbol::var(&g, [3]).unwrap();
        let t = TensorSymbol::var(&g, [2, 2]).unwrap();
        let names = Names::try_from_assignments([
            v.named(["vx", "vy", "vz"]),
            t.named(["t11", "t12", "t21", "t22"]),
        ])
        .unwrap();

        assert_eq!(v.formatted(&names).to_string(), "[vx, vy, vz]");
        assert_eq!(t.formatted(&names).to_string(), "[t11, t12 // t21, t22]");
        assert!(v.named(["a"]).is_err());
    }

    #[test]
    fn test_vars_follow_element_order() {
        let g = Graph::new();
        let v = TensorSymbol::param(&g, [2]).unwrap();
        let ids: Vec<_> = v.vars().iter().collect();
        assert_eq!(ids, vec![v.symbols()[0].id(), v.symbols()[1].id()]);
        assert!(!v.symbols()[0].is_variable());
    }
}
