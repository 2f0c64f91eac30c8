//! Tensor expressions.
//!
//! A [`TensorExpr`] is a fixed-shape array of scalar expressions stored in
//! row-major order. Products, contractions and the other operations build
//! new scalar expressions in the same graph; nothing is computed until the
//! tensor is evaluated.

use std::fmt;
use std::ops::Index;

use adjoint_core::{sqrt, Bindings, Error, Expr, Graph, IntoExpr, Names, Result, SymbolId, SymbolSet};
use adjoint_diff::{derivatives_of, differentiate_wrt, evaluate_f64, render, Derivatives, Jacobian};

use crate::jacobian::JacobianExpr;
use crate::shape::Shape;
use crate::value::TensorValue;

/// A fixed-shape array of scalar expressions from one graph.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorExpr {
    shape: Shape,
    elements: Vec<Expr>,
}

impl TensorExpr {
    /// Creates a tensor from its elements in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the element count differs from the
    /// shape's or is zero, and [`Error::ForeignGraph`] if the elements come
    /// from different graphs.
    pub fn new(shape: impl Into<Shape>, elements: Vec<Expr>) -> Result<Self> {
        let shape = shape.into();
        if elements.is_empty() || elements.len() != shape.count() {
            return Err(Error::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![elements.len()],
            });
        }
        let graph = elements[0].graph();
        if elements.iter().any(|e| !e.graph().ptr_eq(graph)) {
            return Err(Error::ForeignGraph);
        }
        Ok(Self { shape, elements })
    }

    /// Creates a one-axis tensor.
    ///
    /// # Errors
    ///
    /// See [`TensorExpr::new`].
    pub fn vector(elements: Vec<Expr>) -> Result<Self> {
        Self::new(Shape::vector(elements.len()), elements)
    }

    fn from_parts(shape: Shape, elements: Vec<Expr>) -> Self {
        debug_assert_eq!(shape.count(), elements.len());
        Self { shape, elements }
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false; tensors hold at least one element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the graph the elements live in.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        self.elements[0].graph()
    }

    /// Returns the elements in row-major order.
    #[must_use]
    pub fn elements(&self) -> &[Expr] {
        &self.elements
    }

    /// Returns the element at a multi-index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` lies outside the shape.
    pub fn get(&self, index: &[usize]) -> Result<&Expr> {
        let flat = self.shape.flat_index(index)?;
        Ok(&self.elements[flat])
    }

    /// Returns the element at a row-major position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `flat` is not below the element
    /// count.
    pub fn get_flat(&self, flat: usize) -> Result<&Expr> {
        self.elements.get(flat).ok_or_else(|| Error::IndexOutOfBounds {
            index: vec![flat],
            shape: self.shape.dims().to_vec(),
        })
    }

    /// Multiplies every element by a scalar expression or literal.
    #[must_use]
    pub fn scaled_with(&self, factor: impl IntoExpr) -> TensorExpr {
        let factor = factor.into_expr(self.graph());
        let elements = self.elements.iter().map(|e| e * &factor).collect();
        Self::from_parts(self.shape.clone(), elements)
    }

    /// Returns the sum of element-wise products with a same-shaped tensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ.
    pub fn dot(&self, other: &TensorExpr) -> Result<Expr> {
        if self.shape != other.shape {
            return Err(self.shape.mismatch(&other.shape));
        }
        Ok(sum_of_products(
            self.graph(),
            self.elements.iter().zip(&other.elements),
        ))
    }

    /// Contracts the last axis of `self` against the first axis of `other`.
    ///
    /// For matrices this is the matrix product; a matrix contracted with a
    /// vector is the matrix-vector product. The result has the leading axes
    /// of `self` followed by the trailing axes of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the contracted extents differ.
    pub fn contract(&self, other: &TensorExpr) -> Result<TensorExpr> {
        let inner = match (self.shape.dims().last(), other.shape.extent(0)) {
            (Some(&a), Some(b)) if a == b => a,
            _ => return Err(self.shape.mismatch(&other.shape)),
        };

        let outer = self.shape.without_last();
        let trailing = other.shape.without_first();
        let right = trailing.count();
        let shape = outer.concat(&trailing);

        let mut elements = Vec::with_capacity(shape.count());
        for i in 0..outer.count() {
            for j in 0..right {
                let terms = (0..inner).map(|k| {
                    (
                        &self.elements[i * inner + k],
                        &other.elements[k * right + j],
                    )
                });
                elements.push(sum_of_products(self.graph(), terms));
            }
        }
        Ok(Self::from_parts(shape, elements))
    }

    /// Returns the sum of the diagonal of a square matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] unless the tensor is a square matrix.
    pub fn trace(&self) -> Result<Expr> {
        let n = self.square_extent()?;
        let mut sum = self.elements[0].clone();
        for i in 1..n {
            sum = sum + &self.elements[i * n + i];
        }
        Ok(sum)
    }

    /// Returns the determinant of a 2x2 or 3x3 matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] for any other shape.
    pub fn det(&self) -> Result<Expr> {
        let m = |i: usize, j: usize| &self.elements[i * self.shape.dims()[1] + j];
        match self.square_extent()? {
            2 => Ok(m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1)),
            3 => {
                let positive = m(0, 0) * m(1, 1) * m(2, 2)
                    + m(0, 1) * m(1, 2) * m(2, 0)
                    + m(0, 2) * m(1, 0) * m(2, 1);
                let negative = m(2, 0) * m(1, 1) * m(0, 2)
                    + m(2, 1) * m(1, 2) * m(0, 0)
                    + m(2, 2) * m(1, 0) * m(0, 1);
                Ok(positive - negative)
            }
            _ => Err(self.shape.mismatch(&Shape::matrix(3, 3))),
        }
    }

    /// Returns the symbolic inverse of a 2x2 or 3x3 matrix, the adjugate
    /// divided by the determinant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] for any other shape.
    pub fn inverted(&self) -> Result<TensorExpr> {
        let det = self.det()?;
        let m = |i: usize, j: usize| &self.elements[i * self.shape.dims()[1] + j];
        let adjugate = match self.shape.dims()[0] {
            2 => vec![
                m(1, 1).clone(),
                -m(0, 1),
                -m(1, 0),
                m(0, 0).clone(),
            ],
            _ => vec![
                m(1, 1) * m(2, 2) - m(1, 2) * m(2, 1),
                m(0, 2) * m(2, 1) - m(0, 1) * m(2, 2),
                m(0, 1) * m(1, 2) - m(0, 2) * m(1, 1),
                m(1, 2) * m(2, 0) - m(1, 0) * m(2, 2),
                m(0, 0) * m(2, 2) - m(0, 2) * m(2, 0),
                m(0, 2) * m(1, 0) - m(0, 0) * m(1, 2),
                m(1, 0) * m(2, 1) - m(1, 1) * m(2, 0),
                m(0, 1) * m(2, 0) - m(0, 0) * m(2, 1),
                m(0, 0) * m(1, 1) - m(0, 1) * m(1, 0),
            ],
        };
        let elements = adjugate.into_iter().map(|e| e / &det).collect();
        Ok(Self::from_parts(self.shape.clone(), elements))
    }

    /// Returns the transpose of a matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] unless the tensor has two axes.
    pub fn transposed(&self) -> Result<TensorExpr> {
        let &[rows, cols] = self.shape.dims() else {
            return Err(self.shape.mismatch(&Shape::matrix(0, 0)));
        };
        let mut elements = Vec::with_capacity(self.len());
        for j in 0..cols {
            for i in 0..rows {
                elements.push(self.elements[i * cols + j].clone());
            }
        }
        Ok(Self::from_parts(Shape::matrix(cols, rows), elements))
    }

    /// Returns the only element of a one-element tensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the tensor has more elements.
    pub fn as_scalar(&self) -> Result<Expr> {
        match self.elements.as_slice() {
            [only] => Ok(only.clone()),
            _ => Err(self.shape.mismatch(&Shape::scalar())),
        }
    }

    /// Returns the sum of squared elements.
    #[must_use]
    pub fn l2_norm_squared(&self) -> Expr {
        sum_of_products(self.graph(), self.elements.iter().map(|e| (e, e)))
    }

    /// Returns the square root of [`TensorExpr::l2_norm_squared`].
    #[must_use]
    pub fn l2_norm(&self) -> Expr {
        sqrt(self.l2_norm_squared())
    }

    /// Evaluates every element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundSymbol`] if an element depends on an unbound
    /// symbol.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<TensorValue> {
        let values = self
            .elements
            .iter()
            .map(|e| evaluate_f64(e, bindings))
            .collect::<Result<Vec<_>>>()?;
        TensorValue::new(self.shape.clone(), values)
    }

    /// Returns the variables any element depends on, in declaration order.
    #[must_use]
    pub fn variables(&self) -> SymbolSet {
        let mut ids: Vec<SymbolId> = self
            .elements
            .iter()
            .flat_map(|e| adjoint_core::variables_of(e).iter().collect::<Vec<_>>())
            .collect();
        ids.sort_unstable();
        ids.into_iter().collect()
    }

    /// Returns the jacobian of a vector over its variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the tensor is not a vector and
    /// [`Error::UnboundSymbol`] if a symbol is unbound.
    pub fn jacobian(&self, bindings: &Bindings) -> Result<Jacobian> {
        self.jacobian_wrt(&self.variables(), bindings)
    }

    /// Returns the jacobian of a vector with respect to `targets`, one row
    /// per element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the tensor is not a vector and
    /// [`Error::UnboundSymbol`] if a symbol is unbound.
    pub fn jacobian_wrt(&self, targets: &SymbolSet, bindings: &Bindings) -> Result<Jacobian> {
        self.require_vector()?;
        let rows = self
            .elements
            .iter()
            .map(|e| derivatives_of(e, targets, bindings))
            .collect::<Result<Vec<Derivatives>>>()?;
        Jacobian::from_rows(&rows)
    }

    /// Builds the symbolic jacobian of a vector with respect to `targets`.
    ///
    /// The result is differentiated once and can be evaluated at many
    /// points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the tensor is not a vector, and
    /// the errors of [`differentiate_wrt`].
    pub fn jacobian_expression(&self, targets: &SymbolSet) -> Result<JacobianExpr> {
        self.require_vector()?;
        let mut entries = Vec::with_capacity(self.len() * targets.len());
        for element in &self.elements {
            for id in targets {
                entries.push(differentiate_wrt(element, id)?);
            }
        }
        Ok(JacobianExpr::new(targets.clone(), self.len(), entries))
    }

    /// Writes the tensor to `out`.
    ///
    /// Elements are separated by `", "`; matrices and higher tensors
    /// separate rows of the last axis by `" // "`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the writer.
    pub fn render<W: fmt::Write>(&self, out: &mut W, names: &Names) -> fmt::Result {
        let row = if self.shape.is_vector() {
            self.len()
        } else {
            self.shape.dims().last().copied().unwrap_or(1)
        };
        out.write_str("[")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                out.write_str(if i % row == 0 { " // " } else { ", " })?;
            }
            render(out, element, names)?;
        }
        out.write_str("]")
    }

    /// Pairs the tensor with display names, for use with `{}`.
    #[must_use]
    pub fn formatted<'a>(&'a self, names: &'a Names) -> FormattedTensor<'a> {
        FormattedTensor {
            tensor: self,
            names,
        }
    }

    fn square_extent(&self) -> Result<usize> {
        if self.shape.is_square() {
            Ok(self.shape.dims()[0])
        } else {
            let n = self.shape.extent(0).unwrap_or(0);
            Err(self.shape.mismatch(&Shape::matrix(n, n)))
        }
    }

    fn require_vector(&self) -> Result<()> {
        if self.shape.is_vector() {
            Ok(())
        } else {
            Err(self.shape.mismatch(&Shape::vector(self.len())))
        }
    }
}

fn sum_of_products<'a>(graph: &Graph, pairs: impl Iterator<Item = (&'a Expr, &'a Expr)>) -> Expr {
    pairs
        .map(|(a, b)| a * b)
        .reduce(|sum, term| sum + term)
        .unwrap_or_else(|| graph.constant(0.0))
}

impl Index<usize> for TensorExpr {
    type Output = Expr;

    fn index(&self, flat: usize) -> &Self::Output {
        &self.elements[flat]
    }
}

impl<const N: usize> Index<[usize; N]> for TensorExpr {
    type Output = Expr;

    fn index(&self, index: [usize; N]) -> &Self::Output {
        match self.shape.flat_index(&index) {
            Ok(flat) => &self.elements[flat],
            Err(e) => panic!("{e}"),
        }
    }
}

impl<'a> IntoIterator for &'a TensorExpr {
    type Item = &'a Expr;
    type IntoIter = std::slice::Iter<'a, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// A tensor paired with display names.
pub struct FormattedTensor<'a> {
    tensor: &'a TensorExpr,
    names: &'a Names,
}

impl fmt::Display for FormattedTensor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tensor.render(f, self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::{at, names, wrt};

    fn pair() -> (Graph, adjoint_core::Symbol, adjoint_core::Symbol) {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        (g, x, y)
    }

    #[test]
    fn test_new_checks_count() {
        let (_, x, y) = pair();
        assert!(TensorExpr::new([2, 2], vec![x.expr(), y.expr()]).is_err());
        assert!(TensorExpr::vector(vec![]).is_err());

        let other = Graph::new().var();
        assert_eq!(
            TensorExpr::vector(vec![x.expr(), other.expr()]).unwrap_err(),
            Error::ForeignGraph
        );
    }

    #[test]
    fn test_element_access() {
        let (_, x, y) = pair();
        let t = TensorExpr::new([2, 2], vec![x.expr(), &x * &y, &y * &x, y.expr()]).unwrap();

        assert_eq!(t.get(&[1, 1]).unwrap(), &y.expr());
        assert_eq!(t[[0, 0]], x.expr());
        assert_eq!(t[3], y.expr());
        assert!(t.get(&[2, 0]).is_err());
        assert!(t.get_flat(4).is_err());
    }

    #[test]
    fn test_scaling_and_evaluation() {
        let (_, x, y) = pair();
        let t = TensorExpr::new([2, 2], vec![x.expr(), &x * &y, &y * &x, y.expr()]).unwrap();
        let scaled = t.scaled_with(2.0);

        let v = scaled.evaluate(&at([x.bind(1.0), y.bind(2.0)]).unwrap()).unwrap();
        assert_eq!(v.values(), &[2.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_matrix_vector_and_matrix_products() {
        let (_, x, y) = pair();
        let t0 = TensorExpr::new([2, 2], vec![x.expr(), &x * &y, &y * &x, y.expr()]).unwrap();
        let t1 = TensorExpr::new([2, 2], vec![x.expr(), &x + &y, &y * &y, y.expr()]).unwrap();
        let v = TensorExpr::vector(vec![x.expr(), y.expr()]).unwrap();
        let b = at([x.bind(1.0), y.bind(2.0)]).unwrap();

        let mv = t0.contract(&v).unwrap();
        assert_eq!(mv.shape(), &Shape::vector(2));
        assert_eq!(mv.evaluate(&b).unwrap().values(), &[5.0, 6.0]);

        let mm = t0.contract(&t1).unwrap();
        assert_eq!(mm.shape(), &Shape::matrix(2, 2));
        assert_eq!(mm.evaluate(&b).unwrap().values(), &[9.0, 7.0, 10.0, 10.0]);

        assert_eq!(v.contract(&t0).unwrap().evaluate(&b).unwrap().values(), &[5.0, 6.0]);
        let three = TensorExpr::vector(vec![x.expr(), x.expr(), x.expr()]).unwrap();
        assert!(t0.contract(&three).is_err());
    }

    #[test]
    fn test_dot_and_norms() {
        let (_, x, y) = pair();
        let v = TensorExpr::vector(vec![x.expr(), y.expr(), &x + &y]).unwrap();
        let b = at([x.bind(1.0), y.bind(2.0)]).unwrap();

        assert_eq!(evaluate_f64(&v.dot(&v).unwrap(), &b).unwrap(), 14.0);
        assert_eq!(evaluate_f64(&v.l2_norm_squared(), &b).unwrap(), 14.0);
        assert_eq!(evaluate_f64(&v.l2_norm(), &b).unwrap(), 14.0_f64.sqrt());

        let w = TensorExpr::vector(vec![x.expr(), y.expr()]).unwrap();
        assert!(v.dot(&w).is_err());
    }

    #[test]
    fn test_matrix_helpers() {
        let (_, x, y) = pair();
        let m = TensorExpr::new([2, 2], vec![x.expr(), y.expr(), &x * 3.0, &y + 1.0]).unwrap();
        let b = at([x.bind(2.0), y.bind(5.0)]).unwrap();

        assert_eq!(evaluate_f64(&m.trace().unwrap(), &b).unwrap(), 8.0);
        assert_eq!(evaluate_f64(&m.det().unwrap(), &b).unwrap(), 2.0 * 6.0 - 6.0 * 5.0);

        let inv = m.inverted().unwrap().evaluate(&b).unwrap();
        let expected = [6.0 / -18.0, -5.0 / -18.0, -6.0 / -18.0, 2.0 / -18.0];
        for (got, want) in inv.values().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }

        let t = m.transposed().unwrap().evaluate(&b).unwrap();
        assert_eq!(t.values(), &[2.0, 6.0, 5.0, 6.0]);

        let v = TensorExpr::vector(vec![x.expr(), y.expr()]).unwrap();
        assert!(v.trace().is_err());
        assert!(v.det().is_err());
    }

    #[test]
    fn test_three_by_three_inverse() {
        let g = Graph::new();
        let entries = [2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 2.0];
        let m = TensorExpr::new(
            [3, 3],
            entries.iter().map(|&v| g.value(v)).collect(),
        )
        .unwrap();

        let product = m.contract(&m.inverted().unwrap()).unwrap();
        let value = product.evaluate(&Bindings::new()).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((value[[i, j]] - want).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_as_scalar() {
        let (_, x, y) = pair();
        let row = TensorExpr::new([1, 2], vec![x.expr(), y.expr()]).unwrap();
        let col = TensorExpr::new([2, 1], vec![y.expr(), x.expr()]).unwrap();

        let s = row.contract(&col).unwrap().as_scalar().unwrap();
        assert_eq!(evaluate_f64(&s, &at([x.bind(3.0), y.bind(4.0)]).unwrap()).unwrap(), 24.0);
        assert!(row.as_scalar().is_err());
    }

    #[test]
    fn test_jacobian() {
        let (g, x, y) = pair();
        let v = TensorExpr::vector(vec![&x + &y, &x * &y, &x + g.constant(2.0) * &y]).unwrap();
        let b = at([x.bind(1.0), y.bind(2.0)]).unwrap();

        let j = v.jacobian_wrt(&wrt!(x, y).unwrap(), &b).unwrap();
        assert_eq!(j.row(0), &[1.0, 1.0]);
        assert_eq!(j.row(1), &[2.0, 1.0]);
        assert_eq!(j.row(2), &[1.0, 2.0]);
        assert_eq!(j.get(1, &x), Some(2.0));
        assert_eq!(j.apply_to(&[1.0, 2.0]).unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_jacobian_discovers_variables() {
        let (_, x, y) = pair();
        let v = TensorExpr::vector(vec![&x * &x, &x * &y, &x + &y]).unwrap();

        let j = v.jacobian(&at([x.bind(1.0), y.bind(2.0)]).unwrap()).unwrap();
        assert_eq!(j.symbols().as_slice(), &[x.id(), y.id()]);
        assert_eq!(j.row(0), &[2.0, 0.0]);
        assert_eq!(j.row(1), &[2.0, 1.0]);
        assert_eq!(j.row(2), &[1.0, 1.0]);

        let m = TensorExpr::new([1, 2], vec![x.expr(), y.expr()]).unwrap();
        assert!(m.jacobian(&at([x.bind(1.0), y.bind(2.0)]).unwrap()).is_err());
    }

    #[test]
    fn test_render() {
        let (_, x, y) = pair();
        let names = names!(x, y).unwrap();

        let v = TensorExpr::vector(vec![x.expr(), &x * &y]).unwrap();
        assert_eq!(v.formatted(&names).to_string(), "[x, x*y]");

        let m = TensorExpr::new([2, 2], vec![x.expr(), y.expr(), &x + &y, y.expr()]).unwrap();
        assert_eq!(m.formatted(&names).to_string(), "[x, y // x + y, y]");
    }
}
