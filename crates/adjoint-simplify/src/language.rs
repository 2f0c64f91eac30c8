//! The expression language for egg-based simplification.
//!
//! Constants become numeric literals. Every other leaf (symbols, runtime
//! values, shared values) becomes an opaque egg symbol, so rewrites can move
//! it around but never look inside it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use egg::{define_language, Id, Symbol};

/// A numeric literal with a total order, usable as an e-node payload.
#[derive(Clone, Copy, Debug)]
pub struct Literal(pub f64);

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Literal {}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl FromStr for Literal {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Literal)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

define_language! {
    /// The expression language seen by the e-graph.
    pub enum AdjointLang {
        // Constants
        Num(Literal),
        // Symbols and runtime values
        Leaf(Symbol),

        "+" = Add([Id; 2]),
        "-" = Sub([Id; 2]),
        "*" = Mul([Id; 2]),
        "/" = Div([Id; 2]),

        "exp" = Exp(Id),
        "sqrt" = Sqrt(Id),
    }
}

impl AdjointLang {
    /// Returns true if this node is a literal.
    #[must_use]
    pub fn is_num(&self) -> bool {
        matches!(self, AdjointLang::Num(_))
    }

    /// Returns true if this node is an opaque leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, AdjointLang::Leaf(_))
    }

    /// Extracts the literal value.
    #[must_use]
    pub fn as_num(&self) -> Option<f64> {
        match self {
            AdjointLang::Num(n) => Some(n.0),
            _ => None,
        }
    }
}
