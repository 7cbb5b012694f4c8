//! Per-column standardization to zero mean and unit variance.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A standardization transform fitted once on the corpus.
///
/// Uses the population variance. Columns with zero variance keep a scale of
/// 1 so constant columns map to 0 instead of dividing by zero. The fitted
/// transform is persisted with the corpus and reused verbatim for queries;
/// refitting per query would make scores incomparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics over `rows`, each of width `n_cols`.
    ///
    /// With no rows the transform is the identity.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if any row is not `n_cols` wide.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R], n_cols: usize) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self {
                mean: vec![0.0; n_cols],
                scale: vec![1.0; n_cols],
            });
        }
        let n = rows.len() as f64;
        let mut mean = vec![0.0; n_cols];
        for row in rows {
            let row = check_width(row.as_ref(), n_cols)?;
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; n_cols];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row.as_ref()).zip(&mean) {
                let d = v - m;
                *acc += d * d;
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let sd = (v / n).sqrt();
                if sd > 0.0 && sd.is_finite() {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Standardize one vector with the fitted statistics.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if `values` has the wrong width.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let values = check_width(values, self.n_features())?;
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

fn check_width(values: &[f64], expected: usize) -> Result<&[f64]> {
    if values.len() == expected {
        Ok(values)
    } else {
        Err(Error::DimensionMismatch {
            expected,
            found: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_mean_and_scale() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 30.0]];
        let scaler = StandardScaler::fit(&rows, 2).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 20.0]);
        assert_eq!(scaler.scale(), &[1.0, 10.0]);
    }

    #[test]
    fn test_transform_standardizes() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 30.0]];
        let scaler = StandardScaler::fit(&rows, 2).unwrap();
        assert_eq!(scaler.transform(&[3.0, 10.0]).unwrap(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let scaler = StandardScaler::fit(&rows, 1).unwrap();
        assert_eq!(scaler.scale(), &[1.0]);
        assert_eq!(scaler.transform(&[5.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_empty_fit_is_identity() {
        let rows: Vec<Vec<f64>> = Vec::new();
        let scaler = StandardScaler::fit(&rows, 3).unwrap();
        assert_eq!(scaler.transform(&[1.0, 2.0, 3.0]).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let rows = vec![vec![1.0, 2.0]];
        assert!(StandardScaler::fit(&rows, 3).is_err());

        let scaler = StandardScaler::fit(&rows, 2).unwrap();
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        ));
    }
}
