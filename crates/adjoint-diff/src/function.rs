//! Method-style access to evaluation and differentiation.

use adjoint_core::{Assignment, Bindings, Expr, Names, Result, Scalar, ScalarKind, SymbolSet};

use crate::backprop::{back_propagate, derivatives_of, grad};
use crate::derivatives::Derivatives;
use crate::differentiate::differentiate;
use crate::evaluate::{evaluate, evaluate_as};
use crate::format::Formatted;

/// Evaluation and differentiation as methods on expressions.
///
/// Symbols dereference to expressions, so `x.differentiate(&y)` works on
/// symbols as well.
pub trait ExprExt {
    /// See [`evaluate`].
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    fn evaluate(&self, bindings: &Bindings) -> Result<Scalar>;

    /// See [`evaluate_as`].
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    fn evaluate_as(&self, bindings: &Bindings, kind: ScalarKind) -> Result<Scalar>;

    /// See [`differentiate`].
    ///
    /// # Errors
    ///
    /// See [`differentiate`].
    fn differentiate(&self, target: &Expr) -> Result<Expr>;

    /// See [`back_propagate`].
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    fn back_propagate(&self, bindings: &Bindings, targets: &SymbolSet) -> Result<(f64, Derivatives)>;

    /// See [`grad`].
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    fn grad(&self, bindings: &Bindings) -> Result<Derivatives>;

    /// Pairs the expression with display names.
    fn formatted<'a>(&'a self, names: &'a Names) -> Formatted<'a>;
}

impl ExprExt for Expr {
    fn evaluate(&self, bindings: &Bindings) -> Result<Scalar> {
        evaluate(self, bindings)
    }

    fn evaluate_as(&self, bindings: &Bindings, kind: ScalarKind) -> Result<Scalar> {
        evaluate_as(self, bindings, kind)
    }

    fn differentiate(&self, target: &Expr) -> Result<Expr> {
        differentiate(self, target)
    }

    fn back_propagate(&self, bindings: &Bindings, targets: &SymbolSet) -> Result<(f64, Derivatives)> {
        back_propagate(self, bindings, targets)
    }

    fn grad(&self, bindings: &Bindings) -> Result<Derivatives> {
        grad(self, bindings)
    }

    fn formatted<'a>(&'a self, names: &'a Names) -> Formatted<'a> {
        Formatted::new(self, names)
    }
}

/// A named formula: an expression that is called with bindings.
#[derive(Clone, Debug)]
pub struct Function {
    expr: Expr,
}

impl Function {
    /// Wraps `expr`.
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// Returns the wrapped expression.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates the function at `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    pub fn call(&self, bindings: &Bindings) -> Result<Scalar> {
        evaluate(&self.expr, bindings)
    }

    /// Evaluates the function at freshly made assignments.
    ///
    /// # Errors
    ///
    /// Returns the assignment errors, [`adjoint_core::Error::DuplicateSymbol`],
    /// or [`adjoint_core::Error::UnboundSymbol`].
    pub fn call_with<I>(&self, assignments: I) -> Result<Scalar>
    where
        I: IntoIterator<Item = Result<Assignment>>,
    {
        self.call(&adjoint_core::at(assignments)?)
    }

    /// Returns the derivative function with respect to `target`.
    ///
    /// # Errors
    ///
    /// See [`differentiate`].
    pub fn derivative(&self, target: &Expr) -> Result<Function> {
        differentiate(&self.expr, target).map(Function::new)
    }

    /// Fixes the bindings, for repeated queries at one point.
    #[must_use]
    pub fn with(&self, bindings: Bindings) -> BoundFunction<'_> {
        BoundFunction {
            function: self,
            bindings,
        }
    }
}

impl From<Expr> for Function {
    fn from(expr: Expr) -> Self {
        Self::new(expr)
    }
}

/// A function together with the point it is evaluated at.
#[derive(Debug)]
pub struct BoundFunction<'a> {
    function: &'a Function,
    bindings: Bindings,
}

impl BoundFunction<'_> {
    /// Returns the bindings.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Returns the value.
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    pub fn value(&self) -> Result<Scalar> {
        self.function.call(&self.bindings)
    }

    /// Returns the gradient over the function's variables.
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    pub fn grad(&self) -> Result<Derivatives> {
        grad(&self.function.expr, &self.bindings)
    }

    /// Returns the derivatives with respect to `targets`.
    ///
    /// # Errors
    ///
    /// Returns [`adjoint_core::Error::UnboundSymbol`] if a symbol is unbound.
    pub fn derivatives(&self, targets: &SymbolSet) -> Result<Derivatives> {
        derivatives_of(&self.function.expr, targets, &self.bindings)
    }
}
