//! Error types shared by every adjoint crate.
//!
//! Almost all of these are raised when the offending object is constructed
//! (a binding store, a derivative vector, a jacobian, a derivative
//! expression). Integer division by zero is the one failure found while
//! evaluating.

use thiserror::Error;

use crate::scalar::{Domain, ScalarKind};
use crate::symbol::SymbolId;

/// Errors raised while building, binding or differentiating expressions.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A bound value's kind violates the symbol's declared domain.
    #[error("symbol {symbol} is declared {domain} but was bound to a {kind} value")]
    DomainMismatch {
        /// The symbol being bound.
        symbol: SymbolId,
        /// Its declared domain.
        domain: Domain,
        /// The kind of the offending value.
        kind: ScalarKind,
    },

    /// An expression references a symbol absent from the supplied bindings.
    #[error("no binding for symbol {0}")]
    UnboundSymbol(SymbolId),

    /// A binding set or symbol set names the same symbol twice.
    #[error("symbol {0} appears more than once")]
    DuplicateSymbol(SymbolId),

    /// Derivative vectors or jacobian rows are over different symbol sets.
    #[error("derivatives are taken with respect to different symbol sets")]
    VariableSetMismatch,

    /// The requested differentiation target is not a variable or parameter.
    #[error("cannot differentiate with respect to {0}")]
    InvalidDifferentiationTarget(&'static str),

    /// A derivative would be divided by the exact zero constant.
    #[error("derivative expression divides by the zero constant")]
    StructuralZeroDivision,

    /// An integral evaluation divided by zero.
    #[error("integer division by zero")]
    IntegerDivisionByZero,

    /// Operand shapes are incompatible.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// The shape that was required.
        expected: Vec<usize>,
        /// The shape that was supplied.
        got: Vec<usize>,
    },

    /// A multi-index lies outside a tensor's shape.
    #[error("index {index:?} is out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        /// The offending index.
        index: Vec<usize>,
        /// The shape that was indexed.
        shape: Vec<usize>,
    },

    /// A jacobian could not be inverted.
    #[error("matrix is singular")]
    SingularMatrix,

    /// Two expressions from different graphs were combined.
    #[error("expression belongs to a different graph")]
    ForeignGraph,

    /// The simplifier could not translate an expression.
    #[error("simplification failed: {0}")]
    SimplifyFailed(String),
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
