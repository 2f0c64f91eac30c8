//! Evaluated tensors.

use std::fmt;
use std::ops::Index;

use adjoint_core::{Error, Result};

use crate::shape::Shape;

/// A fixed-shape array of numbers, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorValue {
    shape: Shape,
    values: Vec<f64>,
}

impl TensorValue {
    /// Creates a value from its entries in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the entry count differs from the
    /// shape's.
    pub fn new(shape: impl Into<Shape>, values: Vec<f64>) -> Result<Self> {
        let shape = shape.into();
        if values.len() != shape.count() {
            return Err(Error::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![values.len()],
            });
        }
        Ok(Self { shape, values })
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the entries in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the entry at a multi-index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` lies outside the shape.
    pub fn get(&self, index: &[usize]) -> Result<f64> {
        self.shape.flat_index(index).map(|flat| self.values[flat])
    }

    /// Returns the sum of squared entries.
    #[must_use]
    pub fn l2_norm_squared(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Returns the euclidean norm.
    #[must_use]
    pub fn l2_norm(&self) -> f64 {
        self.l2_norm_squared().sqrt()
    }

    /// Consumes the value, returning its entries.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl Index<usize> for TensorValue {
    type Output = f64;

    fn index(&self, flat: usize) -> &f64 {
        &self.values[flat]
    }
}

impl<const N: usize> Index<[usize; N]> for TensorValue {
    type Output = f64;

    fn index(&self, index: [usize; N]) -> &f64 {
        match self.shape.flat_index(&index) {
            Ok(flat) => &self.values[flat],
            Err(e) => panic!("{e}"),
        }
    }
}

impl fmt::Display for TensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = self.shape.dims().last().copied().unwrap_or(1).max(1);
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", if !self.shape.is_vector() && i % row == 0 { " // " } else { ", " })?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}
