//! # adjoint-simplify
//!
//! Equality-saturation simplification of adjoint expressions.
//!
//! This crate uses the `egg` library to provide:
//! - Translation between graph expressions and e-graph terms
//! - Field identities and rules for `exp` and `sqrt`
//! - Cost functions for extraction
//!
//! Derivative expressions built by the differentiator only drop the
//! trivial zero and one cases; running them through a [`Simplifier`]
//! removes what is left, such as `x - x` or `exp(a) * exp(-a)`.
//!
//! ## Soundness
//!
//! Rules never cancel a factor that could be zero, so `x / x` is kept as
//! it is. A simplified expression evaluates to the same number as the
//! original wherever the original is finite.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod convert;
pub mod cost;
pub mod engine;
pub mod language;
pub mod rules;

pub use convert::{lower, raise, Lowered};
pub use cost::{AstSizeCost, CostModel, EvaluationCost};
pub use engine::{SimplificationStats, Simplifier, SimplifierConfig};
pub use language::{AdjointLang, Literal};
