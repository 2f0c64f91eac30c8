//! Cost functions for expression extraction.
//!
//! After saturation each e-class holds many equivalent forms; the cost
//! function decides which one is rebuilt into the graph.

use egg::{CostFunction, Id, Language};

use crate::language::AdjointLang;

/// Which cost function extraction uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CostModel {
    /// Fewest nodes.
    #[default]
    Size,
    /// Cheapest to evaluate.
    Evaluation,
}

/// Prefers smaller expressions.
#[derive(Default)]
pub struct AstSizeCost;

impl CostFunction<AdjointLang> for AstSizeCost {
    type Cost = usize;

    fn cost<C>(&mut self, enode: &AdjointLang, mut costs: C) -> Self::Cost
    where
        C: FnMut(Id) -> Self::Cost,
    {
        enode.fold(1, |sum, id| sum + costs(id))
    }
}

/// Prefers expressions that are cheap to evaluate.
///
/// Leaves are free, `+ - *` cost one, a division four, a square root five
/// and an exponential ten.
#[derive(Default)]
pub struct EvaluationCost;

impl CostFunction<AdjointLang> for EvaluationCost {
    type Cost = usize;

    fn cost<C>(&mut self, enode: &AdjointLang, mut costs: C) -> Self::Cost
    where
        C: FnMut(Id) -> Self::Cost,
    {
        let base_cost = match enode {
            AdjointLang::Num(_) | AdjointLang::Leaf(_) => 0,
            AdjointLang::Add(_) | AdjointLang::Sub(_) | AdjointLang::Mul(_) => 1,
            AdjointLang::Div(_) => 4,
            AdjointLang::Sqrt(_) => 5,
            AdjointLang::Exp(_) => 10,
        };

        enode.fold(base_cost, |sum, id| sum + costs(id))
    }
}
