//! Property-based tests comparing the two differentiation algorithms, and
//! typed evaluation against the order of the bindings.
