//! Dense row-major feature matrix.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::similarity::l2_norm;

/// A dense `n_rows x n_cols` matrix stored row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// An empty matrix of the given width.
    #[must_use]
    pub fn with_columns(n_cols: usize) -> Self {
        Self {
            n_cols,
            data: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if the row has the wrong width.
    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.n_cols {
            return Err(Error::DimensionMismatch {
                expected: self.n_cols,
                found: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        if self.n_cols == 0 {
            0
        } else {
            self.data.len() / self.n_cols
        }
    }

    #[must_use]
    pub const fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row `i`, if present.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.n_cols)?;
        self.data.get(start..start + self.n_cols)
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_cols.max(1))
    }

    /// L2 norm of every row.
    #[must_use]
    pub fn row_norms(&self) -> Vec<f64> {
        self.rows().map(l2_norm).collect()
    }

    /// Matrix-vector product: the dot product of every row with `v`.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if `v` has the wrong width.
    pub fn dot(&self, v: &[f64]) -> Result<Vec<f64>> {
        self.check_width(v)?;
        Ok(self.rows().map(|row| dot(row, v)).collect())
    }

    /// Dot products for a subset of rows, in the order given.
    ///
    /// # Errors
    /// Returns [`Error::RowOutOfRange`] for a missing row, or
    /// [`Error::DimensionMismatch`] if `v` has the wrong width.
    pub fn dot_rows(&self, rows: &[usize], v: &[f64]) -> Result<Vec<f64>> {
        self.check_width(v)?;
        rows.iter()
            .map(|&i| {
                self.row(i)
                    .map(|row| dot(row, v))
                    .ok_or(Error::RowOutOfRange(i))
            })
            .collect()
    }

    fn check_width(&self, v: &[f64]) -> Result<()> {
        if v.len() == self.n_cols {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.n_cols,
                found: v.len(),
            })
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureMatrix {
        let mut m = FeatureMatrix::with_columns(2);
        m.push_row(&[1.0, 0.0]).unwrap();
        m.push_row(&[3.0, 4.0]).unwrap();
        m
    }

    #[test]
    fn test_shape_and_rows() {
        let m = sample();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(m.row(2), None);
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut m = sample();
        assert!(m.push_row(&[1.0]).is_err());
        assert_eq!(m.n_rows(), 2);
    }

    #[test]
    fn test_row_norms() {
        assert_eq!(sample().row_norms(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_dot() {
        assert_eq!(sample().dot(&[2.0, 1.0]).unwrap(), vec![2.0, 10.0]);
        assert!(sample().dot(&[1.0]).is_err());
    }

    #[test]
    fn test_dot_rows_subset() {
        let m = sample();
        assert_eq!(m.dot_rows(&[1], &[1.0, 1.0]).unwrap(), vec![7.0]);
        assert!(matches!(
            m.dot_rows(&[0, 5], &[1.0, 1.0]),
            Err(Error::RowOutOfRange(5))
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let m = FeatureMatrix::with_columns(3);
        assert_eq!(m.n_rows(), 0);
        assert!(m.dot(&[1.0, 2.0, 3.0]).unwrap().is_empty());
        assert!(m.row_norms().is_empty());
    }
}
