//! Per-operator differentiation rules.
//!
//! Each [`Rule`] carries both forms of the chain rule for its operator: the
//! symbolic form, which builds a derivative expression from the operands'
//! derivative expressions, and the numeric form, which gives the local
//! sensitivities used when accumulating adjoints. Keeping them side by side
//! in one `match` per form keeps the two algorithms in step.

use smallvec::{smallvec, SmallVec};

use adjoint_core::{BinaryOp, Error, ExprArena, ExprHandle, ExprNode, Result, UnaryOp};

/// The differentiable operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
    /// `exp(a)`
    Exp,
    /// `sqrt(a)`
    Sqrt,
}

impl Rule {
    /// Returns the rule for an operator node, or `None` for a leaf.
    #[must_use]
    pub fn of(node: &ExprNode) -> Option<Rule> {
        match node {
            ExprNode::Binary { op, .. } => Some(match op {
                BinaryOp::Add => Rule::Add,
                BinaryOp::Sub => Rule::Subtract,
                BinaryOp::Mul => Rule::Multiply,
                BinaryOp::Div => Rule::Divide,
            }),
            ExprNode::Unary { op, .. } => Some(match op {
                UnaryOp::Exp => Rule::Exp,
                UnaryOp::Sqrt => Rule::Sqrt,
            }),
            _ => None,
        }
    }

    /// Builds the derivative of `node` from the derivatives of its operands.
    ///
    /// `operands` and `partials` are in operand order. Terms whose factor is
    /// the zero constant are dropped instead of being built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralZeroDivision`] if a quotient with the zero
    /// constant as denominator would be built.
    pub fn differentiate(
        self,
        arena: &mut ExprArena,
        node: ExprHandle,
        operands: &[ExprHandle],
        partials: &[ExprHandle],
    ) -> Result<ExprHandle> {
        let mut b = Builder { arena };
        match self {
            Rule::Add => Ok(b.plus(partials[0], partials[1])),
            Rule::Subtract => {
                let negated = b.negated(partials[1]);
                Ok(b.plus(partials[0], negated))
            }
            Rule::Multiply => {
                let (a, c) = (operands[0], operands[1]);
                let left = b.times(partials[0], c);
                let right = b.times(a, partials[1]);
                Ok(b.plus(left, right))
            }
            Rule::Divide => {
                let (a, c) = (operands[0], operands[1]);
                let (da, dc) = (partials[0], partials[1]);
                let first = b.quotient(da, c)?;
                if b.is_zero(dc) {
                    return Ok(first);
                }
                let minus_a = b.negated(a);
                let numerator = b.times(minus_a, dc);
                let denominator = b.times(c, c);
                let second = b.quotient(numerator, denominator)?;
                Ok(b.plus(first, second))
            }
            Rule::Exp => Ok(b.times(node, partials[0])),
            Rule::Sqrt => {
                if b.is_zero(partials[0]) {
                    return Ok(partials[0]);
                }
                let two = b.arena.constant(2.0);
                let denominator = b.times(two, node);
                b.quotient(partials[0], denominator)
            }
        }
    }

    /// Returns the partial derivatives of the node's value with respect to
    /// each operand, given the operand values and the node's own value.
    #[must_use]
    pub fn sensitivities(self, operands: &[f64], value: f64) -> SmallVec<[f64; 2]> {
        match self {
            Rule::Add => smallvec![1.0, 1.0],
            Rule::Subtract => smallvec![1.0, -1.0],
            Rule::Multiply => smallvec![operands[1], operands[0]],
            Rule::Divide => {
                let (a, b) = (operands[0], operands[1]);
                smallvec![1.0 / b, -a / (b * b)]
            }
            Rule::Exp => smallvec![value],
            Rule::Sqrt => smallvec![0.5 / value],
        }
    }
}

/// Node construction with zero elimination.
struct Builder<'a> {
    arena: &'a mut ExprArena,
}

impl Builder<'_> {
    fn is_zero(&self, handle: ExprHandle) -> bool {
        self.arena.get(handle).is_zero()
    }

    fn plus(&mut self, a: ExprHandle, b: ExprHandle) -> ExprHandle {
        if self.is_zero(a) {
            b
        } else if self.is_zero(b) {
            a
        } else {
            self.arena.add(a, b)
        }
    }

    fn times(&mut self, a: ExprHandle, b: ExprHandle) -> ExprHandle {
        if self.is_zero(a) {
            a
        } else if self.is_zero(b) {
            b
        } else {
            self.arena.mul(a, b)
        }
    }

    /// A zero numerator wins over a zero denominator.
    fn quotient(&mut self, a: ExprHandle, b: ExprHandle) -> Result<ExprHandle> {
        if self.is_zero(a) {
            Ok(a)
        } else if self.is_zero(b) {
            Err(Error::StructuralZeroDivision)
        } else {
            Ok(self.arena.div(a, b))
        }
    }

    fn negated(&mut self, a: ExprHandle) -> ExprHandle {
        if self.is_zero(a) {
            return a;
        }
        let minus_one = self.arena.constant(-1.0);
        self.times(minus_one, a)
    }
}
