//! Simplification rules organized by category.
//!
//! Every rule holds for all finite operand values where both sides are
//! defined; none of them cancels a factor that could be zero.

pub mod arithmetic;
pub mod exp_sqrt;

use egg::Rewrite;

use crate::language::AdjointLang;

/// Collects all simplification rules.
#[must_use]
pub fn all_rules() -> Vec<Rewrite<AdjointLang, ()>> {
    let mut rules = Vec::new();
    rules.extend(arithmetic::rules());
    rules.extend(exp_sqrt::rules());
    rules
}
