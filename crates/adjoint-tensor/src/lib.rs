//! # adjoint-tensor
//!
//! Shape-aware arrays of scalar expressions.
//!
//! This crate provides:
//! - Shapes with row-major index arithmetic
//! - Tensor expressions with contraction, dot products and small-matrix
//!   helpers built symbolically in the owning graph
//! - Tensors of fresh symbols whose bindings expand per element
//! - Numeric and symbolic jacobians of vector expressions
//! - A Newton solver driven by a prebuilt symbolic jacobian

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod jacobian;
pub mod newton;
pub mod shape;
pub mod symbol;
pub mod tensor;
pub mod value;

pub use jacobian::JacobianExpr;
pub use newton::{NewtonConfig, NewtonSolution, NewtonSolver};
pub use shape::Shape;
pub use symbol::TensorSymbol;
pub use tensor::{FormattedTensor, TensorExpr};
pub use value::TensorValue;
