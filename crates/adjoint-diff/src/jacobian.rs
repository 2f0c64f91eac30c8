//! Jacobian matrices.
//!
//! A jacobian stacks one derivative vector per output component. All rows
//! share one symbol set, which labels the columns. Storage is row-major.

use std::ops::{Index, IndexMut};

use log::debug;

use adjoint_core::{Error, Result, SymbolSet, Symbolic};

use crate::derivatives::Derivatives;

/// A dense jacobian over a fixed symbol set.
#[derive(Clone, Debug, PartialEq)]
pub struct Jacobian {
    symbols: SymbolSet,
    num_rows: usize,
    data: Vec<f64>,
}

impl Jacobian {
    /// Creates a zero jacobian with `num_rows` rows over `symbols`.
    #[must_use]
    pub fn zeros(num_rows: usize, symbols: SymbolSet) -> Self {
        let data = vec![0.0; num_rows * symbols.len()];
        Self {
            symbols,
            num_rows,
            data,
        }
    }

    /// Stacks derivative vectors as rows.
    ///
    /// Rows may list their symbols in any order; they are laid out along the
    /// first row's order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VariableSetMismatch`] if two rows are over different
    /// symbol sets.
    pub fn from_rows(rows: &[Derivatives]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::zeros(0, SymbolSet::new()));
        };
        let symbols = first.symbols().clone();

        let mut data = Vec::with_capacity(rows.len() * symbols.len());
        for row in rows {
            data.extend_from_slice(row.reordered(&symbols)?.values());
        }

        debug!(
            "assembled {}x{} jacobian",
            rows.len(),
            symbols.len()
        );
        Ok(Self {
            symbols,
            num_rows: rows.len(),
            data,
        })
    }

    /// Returns the column labels.
    #[must_use]
    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn num_cols(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true for square jacobians.
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.num_rows == self.num_cols()
    }

    /// Returns a row as a slice, in column order.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.num_cols();
        &self.data[row * n..(row + 1) * n]
    }

    /// Returns a row as a derivative vector.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn derivatives(&self, row: usize) -> Derivatives {
        let mut d = Derivatives::zeros(self.symbols.clone());
        d.values_mut().copy_from_slice(self.row(row));
        d
    }

    /// Returns the entry at `row` for `symbol`.
    #[must_use]
    pub fn get(&self, row: usize, symbol: &impl Symbolic) -> Option<f64> {
        if row >= self.num_rows {
            return None;
        }
        self.symbols
            .position(symbol.symbol_id())
            .map(|col| self[(row, col)])
    }

    /// Returns `J x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `x` does not have one entry per
    /// column.
    pub fn apply_to(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.num_rows];
        self.add_apply_to(x, &mut out)?;
        Ok(out)
    }

    /// Adds `J x` to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `x` does not have one entry per
    /// column or `out` one entry per row.
    pub fn add_apply_to(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
        if x.len() != self.num_cols() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.num_cols()],
                got: vec![x.len()],
            });
        }
        if out.len() != self.num_rows {
            return Err(Error::ShapeMismatch {
                expected: vec![self.num_rows],
                got: vec![out.len()],
            });
        }
        for (i, o) in out.iter_mut().enumerate() {
            *o += self.row(i).iter().zip(x).map(|(a, b)| a * b).sum::<f64>();
        }
        Ok(())
    }

    /// Multiplies every entry by `factor` in place.
    pub fn scale_with(&mut self, factor: f64) -> &mut Self {
        for v in &mut self.data {
            *v *= factor;
        }
        self
    }

    /// Returns a copy with every entry multiplied by `factor`.
    #[must_use]
    pub fn scaled_with(mut self, factor: f64) -> Self {
        self.scale_with(factor);
        self
    }

    fn swap_rows(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let n = self.num_cols();
        for k in 0..n {
            self.data.swap(i * n + k, j * n + k);
        }
    }

    /// Reduces `[J | rhs]` in place by Gauss–Jordan elimination with partial
    /// pivoting. `rhs` is row-major with `width` columns.
    fn eliminate(&mut self, rhs: &mut [f64], width: usize) -> Result<()> {
        if !self.is_square() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.num_cols(), self.num_cols()],
                got: vec![self.num_rows, self.num_cols()],
            });
        }
        let n = self.num_rows;
        let scale = self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let tolerance = scale * f64::EPSILON * n as f64;

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&a, &b| self[(a, col)].abs().total_cmp(&self[(b, col)].abs()))
                .unwrap_or(col);
            let pivot = self[(pivot_row, col)];
            if !pivot.is_finite() || pivot.abs() <= tolerance {
                return Err(Error::SingularMatrix);
            }

            self.swap_rows(col, pivot_row);
            for k in 0..width {
                rhs.swap(col * width + k, pivot_row * width + k);
            }

            let inv = 1.0 / pivot;
            for k in 0..n {
                self[(col, k)] *= inv;
            }
            for k in 0..width {
                rhs[col * width + k] *= inv;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = self[(row, col)];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    let v = self[(col, k)];
                    self[(row, k)] -= factor * v;
                }
                for k in 0..width {
                    let v = rhs[col * width + k];
                    rhs[row * width + k] -= factor * v;
                }
            }
        }
        Ok(())
    }

    /// Solves `J x = rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `J` is not square or `rhs` has the
    /// wrong length, and [`Error::SingularMatrix`] if `J` is singular.
    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>> {
        if rhs.len() != self.num_rows {
            return Err(Error::ShapeMismatch {
                expected: vec![self.num_rows],
                got: vec![rhs.len()],
            });
        }
        let mut work = self.clone();
        let mut x = rhs.to_vec();
        work.eliminate(&mut x, 1)?;
        Ok(x)
    }

    /// Returns the inverse. Columns keep the symbol labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `J` is not square and
    /// [`Error::SingularMatrix`] if it is singular.
    pub fn inverted(&self) -> Result<Jacobian> {
        let n = self.num_rows;
        let mut work = self.clone();
        let mut inverse = Self::zeros(n, self.symbols.clone());
        for i in 0..n.min(self.num_cols()) {
            inverse[(i, i)] = 1.0;
        }
        work.eliminate(&mut inverse.data, n)?;
        Ok(inverse)
    }
}

impl Index<(usize, usize)> for Jacobian {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.data[row * self.num_cols() + col]
    }
}

impl IndexMut<(usize, usize)> for Jacobian {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        let n = self.num_cols();
        &mut self.data[row * n + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjoint_core::SymbolId;

    fn set(raw: &[u32]) -> SymbolSet {
        SymbolSet::try_from_ids(raw.iter().map(|&index| SymbolId::new(0, index))).unwrap()
    }

    fn row(raw: &[u32], values: &[f64]) -> Derivatives {
        Derivatives::from_values(set(raw), values.to_vec()).unwrap()
    }

    #[test]
    fn test_from_rows_aligns_columns() {
        let j = Jacobian::from_rows(&[row(&[0, 1], &[1.0, 2.0]), row(&[1, 0], &[4.0, 3.0])]).unwrap();

        assert_eq!(j.row(1), &[3.0, 4.0]);
        assert_eq!(j[(1, 0)], 3.0);
        assert_eq!(j.get(1, &SymbolId::new(0, 1)), Some(4.0));
        assert_eq!(j.get(2, &SymbolId::new(0, 1)), None);
    }

    #[test]
    fn test_from_rows_rejects_mismatch() {
        let err = Jacobian::from_rows(&[row(&[0, 1], &[1.0, 2.0]), row(&[0, 2], &[3.0, 4.0])])
            .unwrap_err();
        assert_eq!(err, Error::VariableSetMismatch);
    }

    #[test]
    fn test_apply_to() {
        let j = Jacobian::from_rows(&[row(&[0, 1], &[1.0, 2.0]), row(&[0, 1], &[3.0, 4.0])]).unwrap();

        assert_eq!(j.apply_to(&[1.0, 1.0]).unwrap(), vec![3.0, 7.0]);

        let mut acc = vec![1.0, 1.0];
        j.add_apply_to(&[1.0, 0.0], &mut acc).unwrap();
        assert_eq!(acc, vec![2.0, 4.0]);

        assert!(j.apply_to(&[1.0]).is_err());
    }

    #[test]
    fn test_solve_and_invert() {
        let j = Jacobian::from_rows(&[row(&[0, 1], &[2.0, 1.0]), row(&[0, 1], &[1.0, 3.0])]).unwrap();

        let x = j.solve(&[3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);

        let inv = j.inverted().unwrap();
        let y = inv.apply_to(&[3.0, 5.0]).unwrap();
        assert!((y[0] - 0.8).abs() < 1e-12);
        assert!((y[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_pivoting_handles_zero_diagonal() {
        let j = Jacobian::from_rows(&[row(&[0, 1], &[0.0, 1.0]), row(&[0, 1], &[1.0, 0.0])]).unwrap();
        assert_eq!(j.solve(&[2.0, 3.0]).unwrap(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_singular() {
        let j = Jacobian::from_rows(&[row(&[0, 1], &[1.0, 2.0]), row(&[0, 1], &[2.0, 4.0])]).unwrap();
        assert_eq!(j.solve(&[1.0, 1.0]).unwrap_err(), Error::SingularMatrix);
        assert_eq!(j.inverted().unwrap_err(), Error::SingularMatrix);
    }

    #[test]
    fn test_scaled_with() {
        let j = Jacobian::from_rows(&[row(&[0], &[2.0])]).unwrap().scaled_with(-1.0);
        assert_eq!(j[(0, 0)], -2.0);
    }
}
