//! # Adjoint
//!
//! Symbolic and reverse-mode automatic differentiation over expression
//! graphs.
//!
//! Expressions are built with ordinary operators from variables,
//! parameters and numbers. They can be evaluated against a binding store,
//! differentiated symbolically into new expressions, or back-propagated to
//! get every partial derivative in one sweep.
//!
//! ## Features
//!
//! - **Expression Graphs**: Arena-allocated DAG with an opt-in
//!   subexpression cache
//! - **Two Differentiators**: Symbolic derivatives and reverse-mode
//!   gradients that agree to rounding
//! - **Tensors**: Vectors and matrices of expressions, jacobians and a
//!   Newton solver
//! - **Smart Simplification**: Equality saturation via e-graphs
//!
//! ## Quick Start
//!
//! ```
//! use adjoint::prelude::*;
//!
//! let g = Graph::new();
//! let x = g.var();
//! let y = g.var();
//! let e = exp(&x * &y) + &x;
//!
//! let b = at([x.bind(0.0), y.bind(3.0)]).unwrap();
//! let d = grad(&e, &b).unwrap();
//! assert_eq!(d[&x], 4.0);
//!
//! let dx = differentiate(&e, &x).unwrap();
//! assert_eq!(evaluate_f64(&dx, &b).unwrap(), 4.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use adjoint_core as core;
pub use adjoint_diff as diff;
pub use adjoint_simplify as simplify;
pub use adjoint_tensor as tensor;


/// Prelude module for convenient imports.
pub mod prelude {
    pub use adjoint_core::{
        at, exp, names, shared, sqrt, variables_of, wrt, Bindings, Domain, Error, Expr, Graph,
        GraphConfig, Names, Scalar, Symbol, SymbolSet,
    };
    pub use adjoint_diff::{
        back_propagate, derivatives_of, differentiate, evaluate, evaluate_f64, grad, to_text,
        Derivatives, ExprExt, Function, Jacobian,
    };
    pub use adjoint_simplify::Simplifier;
    pub use adjoint_tensor::{NewtonSolver, Shape, TensorExpr, TensorSymbol, TensorValue};
}
