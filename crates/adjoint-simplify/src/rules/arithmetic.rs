//! Field identities for `+ - * /`.

use egg::{rewrite, Rewrite};

use crate::language::AdjointLang;

/// Returns the arithmetic rewrite rules.
#[must_use]
pub fn rules() -> Vec<Rewrite<AdjointLang, ()>> {
    vec![
        // Additive identity
        rewrite!("add-zero-l"; "(+ 0 ?a)" => "?a"),
        rewrite!("add-zero-r"; "(+ ?a 0)" => "?a"),
        rewrite!("sub-zero"; "(- ?a 0)" => "?a"),
        rewrite!("zero-sub"; "(- 0 ?a)" => "(* -1 ?a)"),
        rewrite!("sub-self"; "(- ?a ?a)" => "0"),

        // Multiplicative identity
        rewrite!("mul-one-l"; "(* 1 ?a)" => "?a"),
        rewrite!("mul-one-r"; "(* ?a 1)" => "?a"),
        rewrite!("div-one"; "(/ ?a 1)" => "?a"),

        // Multiplicative zero
        rewrite!("mul-zero-l"; "(* 0 ?a)" => "0"),
        rewrite!("mul-zero-r"; "(* ?a 0)" => "0"),

        // Negation is multiplication by -1
        rewrite!("neg-neg"; "(* -1 (* -1 ?a))" => "?a"),
        rewrite!("add-neg"; "(+ ?a (* -1 ?b))" => "(- ?a ?b)"),
        rewrite!("sub-to-add"; "(- ?a ?b)" => "(+ ?a (* -1 ?b))"),
        rewrite!("div-neg"; "(/ (* -1 ?a) ?b)" => "(* -1 (/ ?a ?b))"),

        // Commutativity
        rewrite!("add-comm"; "(+ ?a ?b)" => "(+ ?b ?a)"),
        rewrite!("mul-comm"; "(* ?a ?b)" => "(* ?b ?a)"),

        // Associativity
        rewrite!("add-assoc-l"; "(+ (+ ?a ?b) ?c)" => "(+ ?a (+ ?b ?c))"),
        rewrite!("add-assoc-r"; "(+ ?a (+ ?b ?c))" => "(+ (+ ?a ?b) ?c)"),
        rewrite!("mul-assoc-l"; "(* (* ?a ?b) ?c)" => "(* ?a (* ?b ?c))"),
        rewrite!("mul-assoc-r"; "(* ?a (* ?b ?c))" => "(* (* ?a ?b) ?c)"),

        // Distributivity
        rewrite!("dist-l"; "(* ?a (+ ?b ?c))" => "(+ (* ?a ?b) (* ?a ?c))"),
        rewrite!("factor-l"; "(+ (* ?a ?b) (* ?a ?c))" => "(* ?a (+ ?b ?c))"),

        // a + a = 2a
        rewrite!("add-same"; "(+ ?a ?a)" => "(* 2 ?a)"),

        // Quotients
        rewrite!("mul-div"; "(* ?a (/ ?b ?c))" => "(/ (* ?a ?b) ?c)"),
        rewrite!("div-mul"; "(/ (* ?a ?b) ?c)" => "(* ?a (/ ?b ?c))"),
    ]
}
