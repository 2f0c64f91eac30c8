//! Text rendering of expressions.
//!
//! Symbols print under the names given in a [`Names`] store, falling back
//! to their identity (`s3`). `+` and `-` print infix without parentheses;
//! operands of `*` and `/` are parenthesised unless they are leaves.

use std::fmt;

use adjoint_core::{Expr, ExprArena, ExprHandle, ExprNode, Names};

/// Writes `expr` to `out`.
///
/// # Errors
///
/// Propagates errors from the writer.
pub fn render<W: fmt::Write>(out: &mut W, expr: &Expr, names: &Names) -> fmt::Result {
    let arena = expr.graph().arena();
    write_node(out, &arena, expr.handle(), names)
}

/// Renders `expr` into a new string.
#[must_use]
pub fn to_text(expr: &Expr, names: &Names) -> String {
    Formatted::new(expr, names).to_string()
}

/// An expression paired with display names, for use with `{}`.
pub struct Formatted<'a> {
    expr: &'a Expr,
    names: &'a Names,
}

impl<'a> Formatted<'a> {
    /// Pairs `expr` with `names`.
    #[must_use]
    pub fn new(expr: &'a Expr, names: &'a Names) -> Self {
        Self { expr, names }
    }
}

impl fmt::Display for Formatted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self.expr, self.names)
    }
}

fn write_node<W: fmt::Write>(
    out: &mut W,
    arena: &ExprArena,
    handle: ExprHandle,
    names: &Names,
) -> fmt::Result {
    match arena.get(handle) {
        ExprNode::Constant(c) => write!(out, "{c}"),
        ExprNode::Value(v) => write!(out, "{v}"),
        ExprNode::Shared(id) => match arena.shared(id) {
            Some(cell) => write!(out, "{}", cell.get()),
            None => write!(out, "?"),
        },
        ExprNode::Symbol(id) => match names.name_of(&id) {
            Some(name) => out.write_str(name),
            None => write!(out, "{id}"),
        },
        ExprNode::Unary { op, arg } => {
            write!(out, "{}(", op.name())?;
            write_node(out, arena, arg, names)?;
            out.write_str(")")
        }
        ExprNode::Binary { op, lhs, rhs } if op.is_multiplicative() => {
            write_operand(out, arena, lhs, names)?;
            out.write_str(op.symbol())?;
            write_operand(out, arena, rhs, names)
        }
        ExprNode::Binary { op, lhs, rhs } => {
            write_node(out, arena, lhs, names)?;
            write!(out, " {} ", op.symbol())?;
            write_node(out, arena, rhs, names)
        }
    }
}

fn write_operand<W: fmt::Write>(
    out: &mut W,
    arena: &ExprArena,
    handle: ExprHandle,
    names: &Names,
) -> fmt::Result {
    if arena.get(handle).is_leaf() {
        write_node(out, arena, handle, names)
    } else {
        out.write_str("(")?;
        write_node(out, arena, handle, names)?;
        out.write_str(")")
    }
}
