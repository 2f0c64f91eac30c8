//! Property-based tests for symbol sets and binding stores.
