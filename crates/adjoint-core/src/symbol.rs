//! Symbol identities and symbol sets.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::scalar::Domain;

/// Unique identifier for a declared symbol.
///
/// An id pairs the identity of the declaring arena with the symbol's index
/// in it, so ids from different graphs never compare equal. Within one
/// arena ids are handed out in declaration order and never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId {
    arena: u32,
    index: u32,
}

impl SymbolId {
    /// Creates an id from an arena identity and an index within it.
    #[must_use]
    pub const fn new(arena: u32, index: u32) -> Self {
        Self { arena, index }
    }

    /// Returns the identity of the declaring arena.
    #[must_use]
    pub const fn arena(self) -> u32 {
        self.arena
    }

    /// Returns the index within the declaring arena.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sym({}:{})", self.arena, self.index)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.index)
    }
}

/// The role a symbol plays in differentiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Included in automatic gradients and jacobians.
    Variable,
    /// Excluded from automatic gradients unless requested explicitly.
    Parameter,
}

/// What the arena remembers about a declared symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolRecord {
    /// Variable or parameter.
    pub kind: SymbolKind,
    /// The values the symbol accepts.
    pub domain: Domain,
}

/// Anything that names a symbol.
pub trait Symbolic {
    /// Returns the identity of the named symbol.
    fn symbol_id(&self) -> SymbolId;
}

impl Symbolic for SymbolId {
    fn symbol_id(&self) -> SymbolId {
        *self
    }
}

impl<T: Symbolic + ?Sized> Symbolic for &T {
    fn symbol_id(&self) -> SymbolId {
        (**self).symbol_id()
    }
}

/// An ordered, duplicate-free set of symbols.
///
/// Derivative vectors and jacobians are laid out along a symbol set; two
/// sets are interchangeable when they have the same members, whatever
/// their order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolSet {
    ids: SmallVec<[SymbolId; 8]>,
}

impl SymbolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from ids, rejecting repeats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSymbol`] if an id occurs twice.
    pub fn try_from_ids(ids: impl IntoIterator<Item = SymbolId>) -> Result<Self> {
        let mut set = Self::new();
        for id in ids {
            if !set.insert(id) {
                return Err(Error::DuplicateSymbol(id));
            }
        }
        Ok(set)
    }

    /// Appends `id` unless already present. Returns true if it was added.
    pub fn insert(&mut self, id: SymbolId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Returns true if `id` is a member.
    #[must_use]
    pub fn contains(&self, id: SymbolId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the slot of `id`, if it is a member.
    #[must_use]
    pub fn position(&self, id: SymbolId) -> Option<usize> {
        self.ids.iter().position(|&member| member == id)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the members in order.
    #[must_use]
    pub fn as_slice(&self) -> &[SymbolId] {
        &self.ids
    }

    /// Iterates over the members in order.
    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.ids.iter().copied()
    }

    /// Returns true if both sets have the same members, in any order.
    #[must_use]
    pub fn same_members(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }

    /// Returns the members of `self` followed by the new members of `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for id in other.iter() {
            result.insert(id);
        }
        result
    }
}

impl FromIterator<SymbolId> for SymbolSet {
    /// Collects ids, silently dropping repeats.
    fn from_iter<I: IntoIterator<Item = SymbolId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = SymbolId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, SymbolId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter().copied()
    }
}

/// Builds a [`SymbolSet`] of differentiation targets.
///
/// ```ignore
/// let targets = wrt!(x, y)?;
/// ```
#[macro_export]
macro_rules! wrt {
    ($($symbol:expr),* $(,)?) => {
        $crate::SymbolSet::try_from_ids([$($crate::Symbolic::symbol_id(&$symbol)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<SymbolId> {
        raw.iter().map(|&index| SymbolId::new(0, index)).collect()
    }

    #[test]
    fn test_try_from_ids_rejects_duplicates() {
        let err = SymbolSet::try_from_ids(ids(&[0, 1, 0])).unwrap_err();
        assert_eq!(err, Error::DuplicateSymbol(SymbolId::new(0, 0)));
    }

    #[test]
    fn test_same_members_ignores_order() {
        let a = SymbolSet::try_from_ids(ids(&[0, 1, 2])).unwrap();
        let b = SymbolSet::try_from_ids(ids(&[2, 0, 1])).unwrap();
        let c = SymbolSet::try_from_ids(ids(&[0, 1])).unwrap();
        assert!(a.same_members(&b));
        assert_ne!(a, b);
        assert!(!a.same_members(&c));
    }

    #[test]
    fn test_union_keeps_order() {
        let a = SymbolSet::try_from_ids(ids(&[3, 1])).unwrap();
        let b = SymbolSet::try_from_ids(ids(&[1, 2])).unwrap();
        assert_eq!(a.union(&b).as_slice(), ids(&[3, 1, 2]).as_slice());
        assert_eq!(a.position(SymbolId::new(0, 1)), Some(1));
    }

    #[test]
    fn test_wrt_macro() {
        let x = SymbolId::new(0, 4);
        let y = SymbolId::new(0, 5);
        let set = crate::wrt!(x, y).unwrap();
        assert_eq!(set.len(), 2);
        assert!(crate::wrt!(x, x).is_err());
    }

    #[test]
    fn test_same_index_in_other_arena_is_distinct() {
        let a = SymbolId::new(1, 0);
        let b = SymbolId::new(2, 0);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), b.to_string());
        assert!(crate::wrt!(a, b).is_ok());
        assert!(a < SymbolId::new(1, 1));
    }
}
