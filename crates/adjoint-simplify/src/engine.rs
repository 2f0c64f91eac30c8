//! The simplification engine.
//!
//! Expressions are lowered into an e-graph, saturated with the rewrite
//! rules, and the cheapest equivalent form is rebuilt in the original graph.

use std::time::Duration;

use egg::{EGraph, Extractor, Id, RecExpr, Rewrite, Runner};
use log::debug;

use adjoint_core::{Error, Expr, Result};

use crate::convert::{lower, raise};
use crate::cost::{AstSizeCost, CostModel, EvaluationCost};
use crate::language::AdjointLang;
use crate::rules;

/// Configuration for the simplification engine.
#[derive(Clone, Debug)]
pub struct SimplifierConfig {
    /// Maximum number of iterations.
    pub iter_limit: usize,
    /// Maximum number of nodes in the e-graph.
    pub node_limit: usize,
    /// Time limit in seconds.
    pub time_limit_secs: u64,
    /// How the result is chosen among equivalent forms.
    pub cost: CostModel,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            iter_limit: 30,
            node_limit: 100_000,
            time_limit_secs: 10,
            cost: CostModel::Size,
        }
    }
}

/// Statistics about one simplification.
#[derive(Clone, Debug)]
pub struct SimplificationStats {
    /// Number of iterations run.
    pub iterations: usize,
    /// Total nodes in the e-graph.
    pub egraph_nodes: usize,
    /// Number of equivalence classes.
    pub egraph_classes: usize,
    /// Reason the runner stopped.
    pub stop_reason: String,
}

/// Rewrites expressions into cheaper equivalent forms.
#[derive(Clone)]
pub struct Simplifier {
    config: SimplifierConfig,
    rules: Vec<Rewrite<AdjointLang, ()>>,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    /// Creates a simplifier with the default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimplifierConfig::default())
    }

    /// Creates a simplifier with a custom configuration.
    #[must_use]
    pub fn with_config(config: SimplifierConfig) -> Self {
        Self {
            config,
            rules: rules::all_rules(),
        }
    }

    /// Replaces the rule set.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Rewrite<AdjointLang, ()>>) -> Self {
        self.rules = rules;
        self
    }

    /// Adds rules to the existing set.
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rewrite<AdjointLang, ()>>) {
        self.rules.extend(rules);
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimplifierConfig {
        &self.config
    }

    /// Simplifies `expr`, adding the result to the same graph.
    ///
    /// The original nodes are left untouched; the result shares every leaf
    /// with `expr`, so bindings for one apply to the other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SimplifyFailed`] if the extracted form cannot be
    /// rebuilt.
    pub fn simplify(&self, expr: &Expr) -> Result<Expr> {
        self.simplify_with_stats(expr).map(|(simplified, _)| simplified)
    }

    /// Like [`Simplifier::simplify`], also returning saturation statistics.
    ///
    /// # Errors
    ///
    /// See [`Simplifier::simplify`].
    pub fn simplify_with_stats(&self, expr: &Expr) -> Result<(Expr, SimplificationStats)> {
        let lowered = lower(expr);
        let (best, stats) = self.saturate(&lowered.term);
        debug!(
            "simplified {} term nodes to {} in {} iterations ({})",
            lowered.term.as_ref().len(),
            best.as_ref().len(),
            stats.iterations,
            stats.stop_reason
        );
        let simplified = raise(expr.graph(), &best, &lowered.leaves)?;
        Ok((simplified, stats))
    }

    /// Simplifies a term directly.
    #[must_use]
    pub fn simplify_rec(&self, expr: &RecExpr<AdjointLang>) -> RecExpr<AdjointLang> {
        self.saturate(expr).0
    }

    /// Simplifies a term given in s-expression syntax, such as `(+ x 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SimplifyFailed`] if the text does not parse.
    pub fn simplify_str(&self, expr: &str) -> Result<String> {
        let parsed: RecExpr<AdjointLang> = expr
            .parse()
            .map_err(|e| Error::SimplifyFailed(format!("parse error: {e}")))?;
        Ok(self.simplify_rec(&parsed).to_string())
    }

    fn saturate(&self, expr: &RecExpr<AdjointLang>) -> (RecExpr<AdjointLang>, SimplificationStats) {
        let runner = Runner::default()
            .with_expr(expr)
            .with_iter_limit(self.config.iter_limit)
            .with_node_limit(self.config.node_limit)
            .with_time_limit(Duration::from_secs(self.config.time_limit_secs))
            .run(&self.rules);

        let stats = SimplificationStats {
            iterations: runner.iterations.len(),
            egraph_nodes: runner.egraph.total_number_of_nodes(),
            egraph_classes: runner.egraph.number_of_classes(),
            stop_reason: format!("{:?}", runner.stop_reason),
        };

        let best = extract(&runner.egraph, runner.roots[0], self.config.cost);
        (best, stats)
    }
}

fn extract(egraph: &EGraph<AdjointLang, ()>, root: Id, cost: CostModel) -> RecExpr<AdjointLang> {
    match cost {
        CostModel::Size => Extractor::new(egraph, AstSizeCost).find_best(root).1,
        CostModel::Evaluation => Extractor::new(egraph, EvaluationCost).find_best(root).1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::{at, Graph};
    use adjoint_diff::{differentiate, evaluate_f64, to_text};

    #[test]
    fn test_simplify_basic() {
        let simplifier = Simplifier::new();

        // x + 0 = x
        assert_eq!(simplifier.simplify_str("(+ x 0)").unwrap(), "x");

        // x * 1 = x
        assert_eq!(simplifier.simplify_str("(* x 1)").unwrap(), "x");

        // x * 0 = 0
        assert_eq!(simplifier.simplify_str("(* x 0)").unwrap(), "0");

        // x - x = 0
        assert_eq!(simplifier.simplify_str("(- x x)").unwrap(), "0");
    }

    #[test]
    fn test_simplify_exp_sqrt() {
        let simplifier = Simplifier::new();
        assert_eq!(simplifier.simplify_str("(exp 0)").unwrap(), "1");
        assert_eq!(simplifier.simplify_str("(* (sqrt x) (sqrt x))").unwrap(), "x");
    }

    #[test]
    fn test_division_by_self_is_kept() {
        let simplifier = Simplifier::new();
        assert_eq!(simplifier.simplify_str("(/ x x)").unwrap(), "(/ x x)");
    }

    #[test]
    fn test_parse_error() {
        let err = Simplifier::new().simplify_str("(+ x").unwrap_err();
        assert!(matches!(err, Error::SimplifyFailed(_)));
    }

    #[test]
    fn test_simplify_graph_expression() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let e = (&x + g.constant(0.0)) * g.constant(1.0) + &y - &y;

        let simplified = Simplifier::new().simplify(&e).unwrap();
        assert_eq!(simplified, x.expr());
    }

    #[test]
    fn test_simplify_derivative() {
        let _ = env_logger::builder().is_test(true).try_init();
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let e = &x * &y + adjoint_core::exp(&y);

        let dx = differentiate(&e, &x).unwrap();
        let simplified = Simplifier::new().simplify(&dx).unwrap();
        assert_eq!(to_text(&simplified, &Default::default()), y.id().to_string());

        let dy = differentiate(&e, &y).unwrap();
        let (simplified, stats) = Simplifier::new().simplify_with_stats(&dy).unwrap();
        assert!(stats.iterations > 0);
        let b = at([x.bind(2.0), y.bind(0.5)]).unwrap();
        assert!(
            (evaluate_f64(&simplified, &b).unwrap() - evaluate_f64(&dy, &b).unwrap()).abs() < 1e-12
        );
    }

    #[test]
    fn test_evaluation_cost_model() {
        let simplifier = Simplifier::with_config(SimplifierConfig {
            cost: CostModel::Evaluation,
            ..SimplifierConfig::default()
        });
        let result = simplifier.simplify_str("(* (exp x) (exp y))").unwrap();
        assert!(result == "(exp (+ x y))" || result == "(exp (+ y x))", "{result}");
    }
}
