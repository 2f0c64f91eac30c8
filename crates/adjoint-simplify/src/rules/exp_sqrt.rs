//! Identities for `exp` and `sqrt`.

use egg::{rewrite, Rewrite};

use crate::language::AdjointLang;

/// Returns the exponential and square-root rewrite rules.
#[must_use]
pub fn rules() -> Vec<Rewrite<AdjointLang, ()>> {
    vec![
        // exp(0) = 1
        rewrite!("exp-zero"; "(exp 0)" => "1"),

        // exp(a + b) = exp(a) * exp(b)
        rewrite!("exp-add"; "(exp (+ ?a ?b))" => "(* (exp ?a) (exp ?b))"),
        rewrite!("exp-add-fold"; "(* (exp ?a) (exp ?b))" => "(exp (+ ?a ?b))"),

        // exp(a - b) = exp(a) / exp(b); exp never vanishes
        rewrite!("exp-sub"; "(exp (- ?a ?b))" => "(/ (exp ?a) (exp ?b))"),
        rewrite!("exp-sub-fold"; "(/ (exp ?a) (exp ?b))" => "(exp (- ?a ?b))"),

        // sqrt(0) = 0, sqrt(1) = 1
        rewrite!("sqrt-zero"; "(sqrt 0)" => "0"),
        rewrite!("sqrt-one"; "(sqrt 1)" => "1"),

        // sqrt(x) * sqrt(x) = x, where sqrt(x) is real
        rewrite!("sqrt-sq"; "(* (sqrt ?x) (sqrt ?x))" => "?x"),
    ]
}
