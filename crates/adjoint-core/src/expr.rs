//! Expression node types.
//!
//! This module defines the node types stored in the arena. Nodes are small
//! `Copy` values: leaves carry their payload inline and operators refer to
//! their operands by handle.

use std::fmt;
use std::hash::{Hash, Hasher};

use num_traits::{Float, PrimInt, WrappingAdd, WrappingMul, WrappingSub};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::handle::ExprHandle;
use crate::scalar::{Scalar, ScalarKind};
use crate::symbol::SymbolId;

/// Index of a shared (referenced) value in the arena's side table.
pub type SharedId = u32;

/// An `f64` with bitwise equality, so nodes can be hashed and interned.
///
/// `0.0` and `-0.0` are distinct and every NaN payload is its own value;
/// interning must never merge two literals that print differently.
#[derive(Clone, Copy, Debug, Default)]
pub struct Real(pub f64);

impl Real {
    /// Returns the wrapped value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A [`Scalar`] with bitwise equality, for runtime-value leaves.
///
/// Values of different kinds never compare equal, so interning cannot turn
/// the integer `2` into the float `2.0`.
#[derive(Clone, Copy, Debug)]
pub struct Number(pub Scalar);

impl Number {
    /// Returns the wrapped value.
    #[must_use]
    pub fn get(self) -> Scalar {
        self.0
    }

    fn key(self) -> (ScalarKind, u64) {
        let bits = match self.0 {
            Scalar::I32(v) => u64::from_ne_bytes(i64::from(v).to_ne_bytes()),
            Scalar::I64(v) => u64::from_ne_bytes(v.to_ne_bytes()),
            Scalar::F32(v) => u64::from(v.to_bits()),
            Scalar::F64(v) => v.to_bits(),
        };
        (self.0.kind(), bits)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Elementary functions of one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Natural exponential.
    Exp,
    /// Square root.
    Sqrt,
}

impl UnaryOp {
    /// Returns the function name used when rendering.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Exp => "exp",
            UnaryOp::Sqrt => "sqrt",
        }
    }

    /// Applies the function to a number.
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        self.apply_float(x)
    }

    /// Applies the function to a typed scalar.
    ///
    /// `f32` arguments stay `f32`; every other kind yields an `f64`.
    #[must_use]
    pub fn apply_scalar(self, x: Scalar) -> Scalar {
        match x {
            Scalar::F32(v) => Scalar::F32(self.apply_float(v)),
            other => Scalar::F64(self.apply_float(other.to_f64())),
        }
    }

    fn apply_float<T: Float>(self, x: T) -> T {
        match self {
            UnaryOp::Exp => x.exp(),
            UnaryOp::Sqrt => x.sqrt(),
        }
    }
}

/// Arithmetic operators of two arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl BinaryOp {
    /// Returns the infix symbol used when rendering.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// Applies the operator to two numbers.
    #[must_use]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        self.apply_float(a, b)
    }

    /// Applies the operator to two typed scalars.
    ///
    /// Both operands are promoted to their common kind first. Integer
    /// arithmetic wraps on overflow and divides toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IntegerDivisionByZero`] for an integral division by
    /// zero.
    pub fn apply_scalar(self, a: Scalar, b: Scalar) -> Result<Scalar> {
        let kind = a.kind().promote(b.kind());
        match (a.convert(kind), b.convert(kind)) {
            (Scalar::I32(x), Scalar::I32(y)) => self.apply_integer(x, y).map(Scalar::I32),
            (Scalar::I64(x), Scalar::I64(y)) => self.apply_integer(x, y).map(Scalar::I64),
            (Scalar::F32(x), Scalar::F32(y)) => Ok(Scalar::F32(self.apply_float(x, y))),
            (x, y) => Ok(Scalar::F64(self.apply_float(x.to_f64(), y.to_f64()))),
        }
    }

    fn apply_float<T: Float>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    fn apply_integer<T>(self, a: T, b: T) -> Result<T>
    where
        T: PrimInt + WrappingAdd + WrappingSub + WrappingMul,
    {
        match self {
            BinaryOp::Add => Ok(a.wrapping_add(&b)),
            BinaryOp::Sub => Ok(a.wrapping_sub(&b)),
            BinaryOp::Mul => Ok(a.wrapping_mul(&b)),
            BinaryOp::Div if b.is_zero() => Err(Error::IntegerDivisionByZero),
            // Only MIN / -1 overflows, and it wraps to MIN.
            BinaryOp::Div => Ok(a.checked_div(&b).unwrap_or(a)),
        }
    }

    /// Returns true for `*` and `/`, whose operands render parenthesised.
    #[must_use]
    pub fn is_multiplicative(self) -> bool {
        matches!(self, BinaryOp::Mul | BinaryOp::Div)
    }
}

/// An expression node stored in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Leaves ===
    /// A literal fixed when the graph was built.
    ///
    /// Zero and one constants take part in derivative simplification.
    Constant(Real),

    /// A runtime value snapshotted when the node was created.
    ///
    /// Literals mixed into arithmetic (`x + 3.0`) become values, so they
    /// never trigger simplification. The value keeps its kind.
    Value(Number),

    /// A runtime value read live from caller-owned storage.
    Shared(SharedId),

    /// A variable or parameter that must be bound before evaluation.
    Symbol(SymbolId),

    // === Operators ===
    /// A function of one argument.
    Unary {
        /// The function.
        op: UnaryOp,
        /// Its argument.
        arg: ExprHandle,
    },

    /// An arithmetic operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: ExprHandle,
        /// Right operand.
        rhs: ExprHandle,
    },
}

impl ExprNode {
    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, ExprNode::Unary { .. } | ExprNode::Binary { .. })
    }

    /// Returns the constant this node holds, if it is one.
    #[must_use]
    pub fn as_constant(&self) -> Option<f64> {
        match self {
            ExprNode::Constant(c) => Some(c.get()),
            _ => None,
        }
    }

    /// Returns true if this is the exact zero constant.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_constant() == Some(0.0)
    }

    /// Returns true if this is the exact one constant.
    #[must_use]
    pub fn is_one(&self) -> bool {
        self.as_constant() == Some(1.0)
    }

    /// Returns the symbol this node names, if it is one.
    #[must_use]
    pub fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            ExprNode::Symbol(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the children of this node, left to right.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 2]> {
        match *self {
            ExprNode::Constant(_)
            | ExprNode::Value(_)
            | ExprNode::Shared(_)
            | ExprNode::Symbol(_) => SmallVec::new(),
            ExprNode::Unary { arg, .. } => smallvec::smallvec![arg],
            ExprNode::Binary { lhs, rhs, .. } => smallvec::smallvec![lhs, rhs],
        }
    }
}
