//! Graph traversal.
//!
//! Operands are always allocated before the operators that use them, so a
//! single descending sweep marks everything reachable from a root and the
//! marked handles, read back in ascending order, form an evaluation order in
//! which every node is visited once, however often it is shared.

use crate::arena::ExprArena;
use crate::graph::Expr;
use crate::handle::ExprHandle;
use crate::symbol::{SymbolKind, SymbolSet};

/// Returns every handle reachable from `root`, operands first.
#[must_use]
pub fn reachable(arena: &ExprArena, root: ExprHandle) -> Vec<ExprHandle> {
    let mut marked = vec![false; root.slot() + 1];
    marked[root.slot()] = true;

    for slot in (0..=root.slot()).rev() {
        if !marked[slot] {
            continue;
        }
        for child in arena.nodes()[slot].children() {
            marked[child.slot()] = true;
        }
    }

    (0..=root.index())
        .filter(|&index| marked[index as usize])
        .map(ExprHandle::new)
        .collect()
}

/// Returns the variables and parameters `expr` depends on, in declaration
/// order.
#[must_use]
pub fn symbols_of(expr: &Expr) -> SymbolSet {
    collect_symbols(expr, |_| true)
}

/// Returns the variables `expr` depends on, in declaration order.
///
/// Parameters are left out; this is the set gradients are taken over when
/// no explicit targets are given.
#[must_use]
pub fn variables_of(expr: &Expr) -> SymbolSet {
    collect_symbols(expr, |kind| kind == SymbolKind::Variable)
}

fn collect_symbols(expr: &Expr, keep: impl Fn(SymbolKind) -> bool) -> SymbolSet {
    let arena = expr.graph().arena();
    reachable(&arena, expr.handle())
        .into_iter()
        .filter_map(|handle| arena.get(handle).as_symbol())
        .filter(|&id| arena.symbol(id).is_some_and(|record| keep(record.kind)))
        .collect()
}
