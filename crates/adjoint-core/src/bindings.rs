//! The binding store.
//!
//! A binding store maps symbol identities to the values they take during an
//! evaluation. Stores are built from assignments produced by
//! [`Symbol::bind`], which checks the symbol's domain; building the store
//! then rejects repeated symbols. Both checks happen before any number is
//! computed.
//!
//! The same machinery maps symbols to display names for rendering, see
//! [`Names`].

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use log::trace;
use rustc_hash::FxHasher;

use crate::error::{Error, Result};
use crate::graph::Symbol;
use crate::scalar::{Scalar, ScalarKind, Shared};
use crate::symbol::{SymbolId, SymbolSet, Symbolic};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// A value bound to a symbol.
#[derive(Clone, Debug)]
pub enum Bound {
    /// A copy taken when the binding was made.
    Owned(Scalar),
    /// A live reference to caller-owned storage.
    Shared(Shared),
}

impl Bound {
    /// Returns the current value.
    ///
    /// Shared bindings are read at every call.
    #[must_use]
    pub fn get(&self) -> Scalar {
        match self {
            Bound::Owned(value) => *value,
            Bound::Shared(cell) => cell.get(),
        }
    }

    /// Returns the kind of the current value.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        self.get().kind()
    }

    /// Returns true if this binding aliases caller-owned storage.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self, Bound::Shared(_))
    }
}

impl PartialEq for Bound {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Bound::Owned(a), Bound::Owned(b)) => a == b,
            (Bound::Shared(a), Bound::Shared(b)) => std::rc::Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Scalar> for Bound {
    fn from(value: Scalar) -> Self {
        Bound::Owned(value)
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Bound::Owned(value.into())
    }
}

impl From<f32> for Bound {
    fn from(value: f32) -> Self {
        Bound::Owned(value.into())
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::Owned(value.into())
    }
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Bound::Owned(value.into())
    }
}

impl From<Shared> for Bound {
    fn from(cell: Shared) -> Self {
        Bound::Shared(cell)
    }
}

impl From<&Shared> for Bound {
    fn from(cell: &Shared) -> Self {
        Bound::Shared(std::rc::Rc::clone(cell))
    }
}

/// One symbol assignment, or a group of them.
///
/// Tensor symbols bind as a composite that flattens into one scalar
/// assignment per element when a store is built.
#[derive(Clone, Debug, PartialEq)]
pub enum Assignment<V = Bound> {
    /// A single symbol and its value.
    Single {
        /// The bound symbol.
        symbol: SymbolId,
        /// Its value.
        value: V,
    },
    /// Assignments built together, such as the elements of a tensor.
    Composite(Vec<Assignment<V>>),
}

impl<V> Assignment<V> {
    /// Expands nested composites into scalar assignments, in order.
    #[must_use]
    pub fn flatten(self) -> Vec<(SymbolId, V)> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<(SymbolId, V)>) {
        match self {
            Assignment::Single { symbol, value } => out.push((symbol, value)),
            Assignment::Composite(parts) => {
                for part in parts {
                    part.flatten_into(out);
                }
            }
        }
    }
}

impl Symbol {
    /// Binds a value to this symbol.
    ///
    /// Shared cells are checked against the domain by their current kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DomainMismatch`] if the value's kind is outside the
    /// declared domain.
    pub fn bind(&self, value: impl Into<Bound>) -> Result<Assignment> {
        let value = value.into();
        let kind = value.kind();
        if !self.domain().accepts(kind) {
            return Err(Error::DomainMismatch {
                symbol: self.id(),
                domain: self.domain(),
                kind,
            });
        }
        Ok(Assignment::Single {
            symbol: self.id(),
            value,
        })
    }

    /// Associates a display name with this symbol.
    #[must_use]
    pub fn named(&self, name: impl Into<String>) -> Assignment<String> {
        Assignment::Single {
            symbol: self.id(),
            value: name.into(),
        }
    }
}

/// An ordered, duplicate-free map keyed by symbol identity.
#[derive(Clone, Debug)]
pub struct SymbolMap<V> {
    entries: FxIndexMap<SymbolId, V>,
}

/// Values bound to symbols for evaluation.
pub type Bindings = SymbolMap<Bound>;

/// Display names bound to symbols for rendering.
pub type Names = SymbolMap<String>;

impl<V> Default for SymbolMap<V> {
    fn default() -> Self {
        Self {
            entries: FxIndexMap::default(),
        }
    }
}

impl<V> SymbolMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from assignments, flattening composites.
    ///
    /// # Errors
    ///
    /// Returns the first error among the assignments, or
    /// [`Error::DuplicateSymbol`] if a symbol is assigned twice.
    pub fn try_from_assignments<I>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Assignment<V>>>,
    {
        let mut map = Self::new();
        for assignment in assignments {
            for (symbol, value) in assignment?.flatten() {
                map.insert(symbol, value)?;
            }
        }
        trace!("built binding store with {} entries", map.len());
        Ok(map)
    }

    /// Adds one entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSymbol`] if `symbol` is already present.
    pub fn insert(&mut self, symbol: SymbolId, value: V) -> Result<()> {
        if self.entries.contains_key(&symbol) {
            return Err(Error::DuplicateSymbol(symbol));
        }
        self.entries.insert(symbol, value);
        Ok(())
    }

    /// Returns the entry for `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &impl Symbolic) -> Option<&V> {
        self.entries.get(&symbol.symbol_id())
    }

    /// Returns true if `symbol` has an entry.
    #[must_use]
    pub fn contains(&self, symbol: &impl Symbolic) -> bool {
        self.entries.contains_key(&symbol.symbol_id())
    }

    /// Returns true if every member of `symbols` has an entry.
    #[must_use]
    pub fn contains_bindings_for(&self, symbols: &SymbolSet) -> bool {
        symbols.iter().all(|id| self.entries.contains_key(&id))
    }

    /// Returns the first member of `symbols` without an entry.
    #[must_use]
    pub fn first_missing(&self, symbols: &SymbolSet) -> Option<SymbolId> {
        symbols.iter().find(|id| !self.entries.contains_key(id))
    }

    /// Returns the bound symbols in insertion order.
    #[must_use]
    pub fn symbols(&self) -> SymbolSet {
        self.entries.keys().copied().collect()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &V)> + '_ {
        self.entries.iter().map(|(&id, value)| (id, value))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Bindings {
    /// Returns the current value of `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundSymbol`] if `symbol` has no entry.
    pub fn value_of(&self, symbol: &impl Symbolic) -> Result<Scalar> {
        let id = symbol.symbol_id();
        self.entries
            .get(&id)
            .map(Bound::get)
            .ok_or(Error::UnboundSymbol(id))
    }

    /// Builds a store of owned values from `(symbol, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSymbol`] if a symbol repeats.
    pub fn from_values<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Symbolic,
    {
        let mut map = Self::new();
        for (symbol, value) in values {
            map.insert(symbol.symbol_id(), Bound::Owned(Scalar::F64(value)))?;
        }
        Ok(map)
    }
}

impl Names {
    /// Returns the name of `symbol`, if one was given.
    #[must_use]
    pub fn name_of(&self, symbol: &impl Symbolic) -> Option<&str> {
        self.get(symbol).map(String::as_str)
    }
}

/// Builds a binding store.
///
/// # Errors
///
/// Returns the first failed assignment, or [`Error::DuplicateSymbol`].
pub fn bind<I>(assignments: I) -> Result<Bindings>
where
    I: IntoIterator<Item = Result<Assignment>>,
{
    Bindings::try_from_assignments(assignments)
}

/// Builds a binding store; reads as "evaluate at".
///
/// # Errors
///
/// See [`bind`].
pub fn at<I>(assignments: I) -> Result<Bindings>
where
    I: IntoIterator<Item = Result<Assignment>>,
{
    bind(assignments)
}

/// Builds a binding store; reads as "evaluate with".
///
/// # Errors
///
/// See [`bind`].
pub fn with<I>(assignments: I) -> Result<Bindings>
where
    I: IntoIterator<Item = Result<Assignment>>,
{
    bind(assignments)
}

/// Builds a binding store; reads as "evaluate where".
///
/// # Errors
///
/// See [`bind`].
pub fn r#where<I>(assignments: I) -> Result<Bindings>
where
    I: IntoIterator<Item = Result<Assignment>>,
{
    bind(assignments)
}

/// Builds a [`Bindings`] store from `symbol = value` pairs.
///
/// ```ignore
/// let b = at!(x = 3.0, y = 2.0)?;
/// ```
#[macro_export]
macro_rules! at {
    ($($symbol:ident = $value:expr),* $(,)?) => {
        $crate::bindings::at([$($symbol.bind($value)),*])
    };
}

/// Builds a [`Names`] store from the identifiers of the given symbols.
///
/// ```ignore
/// let names = names!(x, y)?;
/// ```
#[macro_export]
macro_rules! names {
    ($($symbol:ident),* $(,)?) => {
        $crate::Names::try_from_assignments([$(Ok($symbol.named(stringify!($symbol)))),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::scalar::{shared, Domain};

    #[test]
    fn test_bind_checks_domain() {
        let g = Graph::new();
        let n = g.var_in(Domain::Integral);
        let r = g.var_in(Domain::Real);

        assert!(n.bind(3).is_ok());
        assert!(n.bind(3_i64).is_ok());
        assert_eq!(
            n.bind(3.0).unwrap_err(),
            Error::DomainMismatch {
                symbol: n.id(),
                domain: Domain::Integral,
                kind: ScalarKind::F64,
            }
        );
        assert!(r.bind(1.5_f32).is_ok());
        assert!(r.bind(2).is_err());
        assert!(r.bind(&shared(2)).is_err());
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();

        assert!(at([x.bind(1.0), y.bind(2.0)]).is_ok());
        assert_eq!(
            at([x.bind(1.0), y.bind(2.0), x.bind(3.0)]).unwrap_err(),
            Error::DuplicateSymbol(x.id())
        );
    }

    #[test]
    fn test_first_error_wins() {
        let g = Graph::new();
        let x = g.var_in(Domain::Integral);
        let y = g.var();

        let err = bind([y.bind(1.0), x.bind(0.5)]).unwrap_err();
        assert!(matches!(err, Error::DomainMismatch { .. }));
    }

    #[test]
    fn test_lookup_and_completeness() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();
        let z = g.param();

        let b = crate::at!(x = 3.0, y = 2).unwrap();
        assert_eq!(b.value_of(&x).unwrap(), Scalar::F64(3.0));
        assert_eq!(b.value_of(&y).unwrap(), Scalar::I32(2));
        assert_eq!(b.value_of(&z).unwrap_err(), Error::UnboundSymbol(z.id()));

        let xy = crate::wrt!(x, y).unwrap();
        let xz = crate::wrt!(x, z).unwrap();
        assert!(b.contains_bindings_for(&xy));
        assert!(!b.contains_bindings_for(&xz));
        assert_eq!(b.first_missing(&xz), Some(z.id()));
    }

    #[test]
    fn test_shared_binding_reads_live() {
        let g = Graph::new();
        let x = g.var();
        let cell = shared(1.0);

        let b = with([x.bind(&cell)]).unwrap();
        assert!(b.get(&x).is_some_and(Bound::is_shared));
        cell.set(Scalar::F64(4.0));
        assert_eq!(b.value_of(&x).unwrap(), Scalar::F64(4.0));
    }

    #[test]
    fn test_composite_flattens() {
        let g = Graph::new();
        let a = g.var();
        let b = g.var();
        let c = g.var();

        let composite = Assignment::Composite(vec![
            a.bind(1.0).unwrap(),
            Assignment::Composite(vec![b.bind(2.0).unwrap()]),
        ]);
        let store = r#where([Ok(composite), c.bind(3.0)]).unwrap();

        let order: Vec<SymbolId> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a.id(), b.id(), c.id()]);
    }

    #[test]
    fn test_names() {
        let g = Graph::new();
        let x = g.var();
        let y = g.var();

        let names = crate::names!(x, y).unwrap();
        assert_eq!(names.name_of(&x), Some("x"));
        assert_eq!(names.name_of(&y), Some("y"));
    }
}
