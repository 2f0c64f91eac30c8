//! # adjoint-diff
//!
//! Evaluation and differentiation of adjoint expression graphs.
//!
//! This crate provides:
//! - Numeric evaluation against a binding store
//! - Symbolic differentiation producing new expressions in the same graph
//! - Reverse-mode accumulation of every partial derivative in one sweep
//! - Derivative vectors and jacobians labelled by symbol
//! - Text rendering with user-chosen symbol names
//!
//! ## Example
//!
//! ```
//! use adjoint_core::{at, Graph};
//! use adjoint_diff::grad;
//!
//! let g = Graph::new();
//! let x = g.var();
//! let y = g.var();
//! let e = 2.0 * (&x + &y) * &x;
//!
//! let d = grad(&e, &at([x.bind(3.0), y.bind(2.0)]).unwrap()).unwrap();
//! assert_eq!(d[&x], 16.0);
//! assert_eq!(d[&y], 6.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backprop;
pub mod derivatives;
pub mod differentiate;
pub mod evaluate;
pub mod format;
pub mod function;
pub mod jacobian;
mod proptests;
pub mod rules;

pub use backprop::{back_propagate, derivative_of, derivatives_of, grad};
pub use derivatives::Derivatives;
pub use differentiate::{derivative_of_order, differentiate, differentiate_wrt, target_symbol};
pub use evaluate::{evaluate, evaluate_as, evaluate_f64};
pub use format::{render, to_text, Formatted};
pub use function::{BoundFunction, ExprExt, Function};
pub use jacobian::Jacobian;
pub use rules::Rule;
