//! Derivative vectors keyed by symbol identity.

use std::fmt;
use std::ops::{Add, Index, IndexMut};

use adjoint_core::{Error, Result, SymbolId, SymbolSet, Symbolic};

/// Partial derivatives with respect to a fixed set of symbols.
///
/// One slot per symbol, zero on construction. Two vectors combine only
/// when they are over the same symbols; the order of the symbols does not
/// matter.
#[derive(Clone, Debug, PartialEq)]
pub struct Derivatives {
    symbols: SymbolSet,
    values: Vec<f64>,
}

impl Derivatives {
    /// Creates a zero vector over `symbols`.
    #[must_use]
    pub fn zeros(symbols: SymbolSet) -> Self {
        let values = vec![0.0; symbols.len()];
        Self { symbols, values }
    }

    /// Creates a vector from values in the order of `symbols`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the lengths differ.
    pub fn from_values(symbols: SymbolSet, values: Vec<f64>) -> Result<Self> {
        if symbols.len() != values.len() {
            return Err(Error::ShapeMismatch {
                expected: vec![symbols.len()],
                got: vec![values.len()],
            });
        }
        Ok(Self { symbols, values })
    }

    /// Returns the symbols, in slot order.
    #[must_use]
    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Returns the values, in slot order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the values mutably, in slot order.
    #[must_use]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the derivative with respect to `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &impl Symbolic) -> Option<f64> {
        self.symbols
            .position(symbol.symbol_id())
            .map(|slot| self.values[slot])
    }

    /// Returns the slot for `symbol` mutably.
    #[must_use]
    pub fn get_mut(&mut self, symbol: &impl Symbolic) -> Option<&mut f64> {
        self.symbols
            .position(symbol.symbol_id())
            .map(|slot| &mut self.values[slot])
    }

    /// Iterates over `(symbol, derivative)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, f64)> + '_ {
        self.symbols.iter().zip(self.values.iter().copied())
    }

    /// Multiplies every slot by `factor` in place.
    pub fn scale_with(&mut self, factor: f64) -> &mut Self {
        for v in &mut self.values {
            *v *= factor;
        }
        self
    }

    /// Returns a copy with every slot multiplied by `factor`.
    #[must_use]
    pub fn scaled_with(mut self, factor: f64) -> Self {
        self.scale_with(factor);
        self
    }

    /// Adds `other` slot by slot, matching slots by symbol.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VariableSetMismatch`] if the symbol sets differ;
    /// `self` is left untouched in that case.
    pub fn try_add_assign(&mut self, other: &Derivatives) -> Result<()> {
        if !self.symbols.same_members(&other.symbols) {
            return Err(Error::VariableSetMismatch);
        }
        for (id, value) in other.iter() {
            if let Some(slot) = self.get_mut(&id) {
                *slot += value;
            }
        }
        Ok(())
    }

    /// Returns the slot-wise sum, laid out like `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VariableSetMismatch`] if the symbol sets differ.
    pub fn try_add(&self, other: &Derivatives) -> Result<Derivatives> {
        let mut sum = self.clone();
        sum.try_add_assign(other)?;
        Ok(sum)
    }

    /// Returns the same derivatives laid out along `symbols`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VariableSetMismatch`] if `symbols` has different
    /// members.
    pub fn reordered(&self, symbols: &SymbolSet) -> Result<Derivatives> {
        if !self.symbols.same_members(symbols) {
            return Err(Error::VariableSetMismatch);
        }
        let values = symbols
            .iter()
            .map(|id| self.get(&id).unwrap_or_default())
            .collect();
        Ok(Self {
            symbols: symbols.clone(),
            values,
        })
    }

    /// Returns the inner product with `x`, taken in slot order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `x` has the wrong length.
    pub fn dot(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.len() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.len()],
                got: vec![x.len()],
            });
        }
        Ok(self.values.iter().zip(x).map(|(a, b)| a * b).sum())
    }
}

impl Add for &Derivatives {
    type Output = Result<Derivatives>;

    fn add(self, other: &Derivatives) -> Result<Derivatives> {
        self.try_add(other)
    }
}

impl Add for Derivatives {
    type Output = Result<Derivatives>;

    fn add(mut self, other: Derivatives) -> Result<Derivatives> {
        self.try_add_assign(&other)?;
        Ok(self)
    }
}

impl<S: Symbolic + ?Sized> Index<&S> for Derivatives {
    type Output = f64;

    fn index(&self, symbol: &S) -> &f64 {
        let id = symbol.symbol_id();
        match self.symbols.position(id) {
            Some(slot) => &self.values[slot],
            None => panic!("symbol {id} is not among the differentiation targets"),
        }
    }
}

impl<S: Symbolic + ?Sized> IndexMut<&S> for Derivatives {
    fn index_mut(&mut self, symbol: &S) -> &mut f64 {
        let id = symbol.symbol_id();
        match self.symbols.position(id) {
            Some(slot) => &mut self.values[slot],
            None => panic!("symbol {id} is not among the differentiation targets"),
        }
    }
}

impl fmt::Display for Derivatives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (id, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "d/d{id} = {value}")?;
        }
        write!(f, "]")
    }
}
