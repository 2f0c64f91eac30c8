//! Newton iteration for square systems of expressions.

use log::{debug, trace};

use adjoint_core::{Bindings, Error, Result};

use crate::symbol::TensorSymbol;
use crate::tensor::TensorExpr;

/// Configuration for [`NewtonSolver`].
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum number of Newton steps.
    pub max_iterations: usize,
    /// Stop once the squared residual norm drops below this.
    pub tolerance: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-12,
        }
    }
}

/// Outcome of a Newton solve.
#[derive(Clone, Debug, PartialEq)]
pub struct NewtonSolution {
    /// The last iterate.
    pub x: Vec<f64>,
    /// Squared residual norm at `x`.
    pub residual_norm_squared: f64,
    /// Number of steps taken.
    pub iterations: usize,
    /// Whether the tolerance was reached.
    pub converged: bool,
}

/// Solves `residual(x) = 0` by Newton's method.
///
/// The jacobian is differentiated symbolically once per solve and evaluated
/// at every iterate.
#[derive(Clone, Debug, Default)]
pub struct NewtonSolver {
    config: NewtonConfig,
}

impl NewtonSolver {
    /// Creates a solver with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solver with a custom configuration.
    #[must_use]
    pub fn with_config(config: NewtonConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Iterates from `x0` until the squared residual norm drops below the
    /// tolerance or the iteration limit is reached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `residual` is not a vector with
    /// one component per unknown or `x0` has the wrong length,
    /// [`Error::SingularMatrix`] if the jacobian becomes singular, and
    /// [`Error::UnboundSymbol`] if the residual depends on symbols other
    /// than the unknowns.
    pub fn solve(
        &self,
        residual: &TensorExpr,
        unknowns: &TensorSymbol,
        x0: &[f64],
    ) -> Result<NewtonSolution> {
        self.solve_with(residual, unknowns, x0, &Bindings::new())
    }

    /// Like [`NewtonSolver::solve`], with extra bindings for parameters the
    /// residual depends on.
    ///
    /// # Errors
    ///
    /// See [`NewtonSolver::solve`]; also [`Error::DuplicateSymbol`] if
    /// `fixed` binds one of the unknowns.
    pub fn solve_with(
        &self,
        residual: &TensorExpr,
        unknowns: &TensorSymbol,
        x0: &[f64],
        fixed: &Bindings,
    ) -> Result<NewtonSolution> {
        let n = unknowns.len();
        if residual.len() != n || !residual.shape().is_vector() {
            return Err(Error::ShapeMismatch {
                expected: vec![n],
                got: residual.shape().dims().to_vec(),
            });
        }
        if x0.len() != n {
            return Err(Error::ShapeMismatch {
                expected: vec![n],
                got: vec![x0.len()],
            });
        }

        let jacobian = residual.jacobian_expression(&unknowns.vars())?;
        let at = |x: &[f64]| -> Result<Bindings> {
            let mut bindings = fixed.clone();
            for (symbol, &value) in unknowns.symbols().iter().zip(x) {
                bindings.insert(symbol.id(), value.into())?;
            }
            Ok(bindings)
        };

        let mut x = x0.to_vec();
        let mut bindings = at(&x)?;
        let mut r = residual.evaluate(&bindings)?;
        let mut iterations = 0;
        while r.l2_norm_squared() >= self.config.tolerance && iterations < self.config.max_iterations {
            let step = jacobian.evaluate(&bindings)?.solve(r.values())?;
            for (xi, di) in x.iter_mut().zip(&step) {
                *xi -= di;
            }
            bindings = at(&x)?;
            r = residual.evaluate(&bindings)?;
            iterations += 1;
            trace!(
                "newton step {iterations}: residual norm squared {}",
                r.l2_norm_squared()
            );
        }

        let residual_norm_squared = r.l2_norm_squared();
        let converged = residual_norm_squared < self.config.tolerance;
        debug!(
            "newton solve finished after {iterations} steps, converged: {converged}"
        );
        Ok(NewtonSolution {
            x,
            residual_norm_squared,
            iterations,
            converged,
        })
    }
}
