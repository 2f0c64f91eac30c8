//! Runtime scalars, their kinds, and the numeric domains symbols declare.
//!
//! Differentiation runs in `f64`. Evaluation keeps kinds: every operator
//! promotes its operands to their common kind and computes in it, so two
//! integers divide as integers and an integer plus a float is a float. A
//! symbol's [`Domain`] decides which values may be bound to it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use num_traits::{Bounded, NumCast, ToPrimitive, Zero};

/// The numeric kind of a [`Scalar`].
///
/// Variants are ordered by promotion rank: combining two kinds yields the
/// larger one, with floating-point kinds dominating integral ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKind {
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl ScalarKind {
    /// Returns true for the integer kinds.
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(self, ScalarKind::I32 | ScalarKind::I64)
    }

    /// Returns true for the floating-point kinds.
    #[must_use]
    pub fn is_real(self) -> bool {
        !self.is_integral()
    }

    /// Returns the common kind of `self` and `other`.
    #[must_use]
    pub fn promote(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A runtime scalar value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
}

impl Scalar {
    /// Returns the kind of this scalar.
    #[must_use]
    pub fn kind(self) -> ScalarKind {
        match self {
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
        }
    }

    /// Converts to the engine's working precision.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::I32(v) => <f64 as From<i32>>::from(v),
            Scalar::I64(v) => v.to_f64().unwrap_or(f64::NAN),
            Scalar::F32(v) => <f64 as From<f32>>::from(v),
            Scalar::F64(v) => v,
        }
    }

    /// Converts a working-precision value into a scalar of the given kind.
    ///
    /// Integral kinds truncate toward zero and saturate at their bounds;
    /// NaN becomes zero.
    #[must_use]
    pub fn from_f64(kind: ScalarKind, value: f64) -> Self {
        match kind {
            ScalarKind::I32 => Scalar::I32(saturating_cast(value)),
            ScalarKind::I64 => Scalar::I64(saturating_cast(value)),
            ScalarKind::F32 => Scalar::F32(NumCast::from(value).unwrap_or(f32::NAN)),
            ScalarKind::F64 => Scalar::F64(value),
        }
    }

    /// Converts to another kind.
    ///
    /// Widening integer conversions are exact; everything else goes through
    /// [`Scalar::from_f64`].
    #[must_use]
    pub fn convert(self, kind: ScalarKind) -> Self {
        match (self, kind) {
            (value, kind) if value.kind() == kind => value,
            (Scalar::I32(v), ScalarKind::I64) => Scalar::I64(<i64 as From<i32>>::from(v)),
            (value, kind) => Scalar::from_f64(kind, value.to_f64()),
        }
    }

    /// Returns true if the value is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.to_f64().is_zero()
    }
}

fn saturating_cast<T: NumCast + Bounded + Zero>(value: f64) -> T {
    NumCast::from(value.trunc()).unwrap_or_else(|| {
        if value.is_nan() {
            T::zero()
        } else if value > 0.0 {
            T::max_value()
        } else {
            T::min_value()
        }
    })
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::I32(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::I64(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::F32(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::F64(value)
    }
}

/// Caller-owned storage that expressions and bindings can alias.
///
/// Writes through the cell are visible to every later evaluation.
pub type Shared = Rc<Cell<Scalar>>;

/// Creates a new [`Shared`] cell holding `value`.
#[must_use]
pub fn shared(value: impl Into<Scalar>) -> Shared {
    Rc::new(Cell::new(value.into()))
}

/// The numeric domain a symbol accepts when it is bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Any scalar kind.
    #[default]
    Any,
    /// Floating-point kinds only.
    Real,
    /// Integer kinds only.
    Integral,
    /// Exactly one kind.
    Exact(ScalarKind),
}

impl Domain {
    /// Returns true if values of `kind` may be bound under this domain.
    #[must_use]
    pub fn accepts(self, kind: ScalarKind) -> bool {
        match self {
            Domain::Any => true,
            Domain::Real => kind.is_real(),
            Domain::Integral => kind.is_integral(),
            Domain::Exact(expected) => expected == kind,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Any => f.write_str("unconstrained"),
            Domain::Real => f.write_str("real"),
            Domain::Integral => f.write_str("integral"),
            Domain::Exact(kind) => write!(f, "exactly {kind}"),
        }
    }
}
