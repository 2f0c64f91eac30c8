//! Shapes and row-major index arithmetic.

use std::fmt;

use smallvec::SmallVec;

use adjoint_core::{Error, Result};

/// Extents of a tensor, outermost axis first.
///
/// The empty shape holds exactly one element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Creates a shape from its extents.
    #[must_use]
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// The shape of a single element.
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    /// A one-axis shape of length `n`.
    #[must_use]
    pub fn vector(n: usize) -> Self {
        Self::new(&[n])
    }

    /// A two-axis shape.
    #[must_use]
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self::new(&[rows, cols])
    }

    /// Returns the extents.
    #[inline]
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the number of axes.
    #[inline]
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the extent along `axis`.
    #[must_use]
    pub fn extent(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Returns true for one-axis shapes and single-column matrices.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        match self.dims.as_slice() {
            [_] | [_, 1] => true,
            _ => false,
        }
    }

    /// Returns true for two-axis shapes with equal extents.
    #[must_use]
    pub fn is_square(&self) -> bool {
        matches!(self.dims.as_slice(), [r, c] if r == c)
    }

    /// Returns the row-major flat position of `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` has the wrong number of
    /// axes or exceeds an extent.
    pub fn flat_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() || index.iter().zip(&self.dims).any(|(i, d)| i >= d) {
            return Err(Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.dims.to_vec(),
            });
        }
        Ok(index
            .iter()
            .zip(&self.dims)
            .fold(0, |flat, (&i, &d)| flat * d + i))
    }

    /// Returns the multi-index at row-major position `flat`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `flat` is not below the element
    /// count.
    pub fn multi_index(&self, flat: usize) -> Result<SmallVec<[usize; 4]>> {
        if flat >= self.count() {
            return Err(Error::IndexOutOfBounds {
                index: vec![flat],
                shape: self.dims.to_vec(),
            });
        }
        let mut index: SmallVec<[usize; 4]> = SmallVec::from_elem(0, self.rank());
        let mut rest = flat;
        for (slot, &d) in index.iter_mut().zip(&self.dims).rev() {
            *slot = rest % d;
            rest /= d;
        }
        Ok(index)
    }

    /// Returns the shape with the last axis removed.
    #[must_use]
    pub fn without_last(&self) -> Shape {
        Self::new(&self.dims[..self.rank().saturating_sub(1)])
    }

    /// Returns the shape with the first axis removed.
    #[must_use]
    pub fn without_first(&self) -> Shape {
        Self::new(self.dims.get(1..).unwrap_or_default())
    }

    /// Returns `self` followed by the axes of `other`.
    #[must_use]
    pub fn concat(&self, other: &Shape) -> Shape {
        let mut dims = self.dims.clone();
        dims.extend_from_slice(&other.dims);
        Self { dims }
    }

    pub(crate) fn mismatch(&self, other: &Shape) -> Error {
        Error::ShapeMismatch {
            expected: self.dims.to_vec(),
            got: other.dims.to_vec(),
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(&dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}
