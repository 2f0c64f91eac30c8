//! # adjoint-core
//!
//! Expression graph engine for the adjoint differentiation library.
//!
//! This crate provides:
//! - Arena-allocated expression storage with an opt-in subexpression cache
//! - Symbols with a declaration-time identity and a numeric domain
//! - Operator overloads composing expressions from symbols and literals
//! - The binding store mapping symbols to owned or shared values
//!
//! ## Design Principles
//!
//! - **Identity by declaration**: every `var`/`param` call allocates a fresh
//!   symbol id, no matter how many times the same code runs
//! - **Validate at construction**: binding stores reject duplicates and
//!   domain violations before any number is computed
//! - **Zero-Cost Handles**: 32-bit indices instead of pointers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod bindings;
pub mod error;
pub mod expr;
pub mod graph;
pub mod handle;
pub mod intern;
pub mod ops;
mod proptests;
pub mod scalar;
pub mod symbol;
pub mod traverse;

pub use arena::ExprArena;
pub use bindings::{at, bind, r#where, with, Assignment, Bindings, Bound, Names, SymbolMap};
pub use error::{Error, Result};
pub use expr::{BinaryOp, ExprNode, Number, Real, SharedId, UnaryOp};
pub use graph::{Expr, Graph, GraphConfig, Symbol};
pub use handle::ExprHandle;
pub use intern::SubexpressionCache;
pub use ops::{exp, sqrt, ExprLike, IntoExpr};
pub use scalar::{shared, Domain, Scalar, ScalarKind, Shared};
pub use symbol::{SymbolId, SymbolKind, SymbolRecord, SymbolSet, Symbolic};
pub use traverse::{reachable, symbols_of, variables_of};
