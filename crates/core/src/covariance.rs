use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// An error covariance specification.
///
/// The three forms are mutually exclusive: a case supplies exactly one of a
/// full matrix, a diagonal of variances, or a single variance applied
/// uniformly to every component. All values are variances, not standard
/// deviations.
#[derive(Debug, Clone, PartialEq)]
pub enum Covariance {
    /// A full symmetric positive definite matrix.
    Matrix(DMatrix<f64>),

    /// A diagonal matrix given by its variances.
    Diagonal(DVector<f64>),

    /// A uniform variance times the identity.
    Scalar(f64),
}

/// Errors that can occur when validating or applying a covariance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CovarianceError {
    #[error("variance must be finite and positive, got {0}")]
    NonPositiveVariance(f64),

    #[error("covariance matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("covariance matrix is not symmetric positive definite")]
    NotPositiveDefinite,

    #[error("covariance has dimension {actual}, expected {expected}")]
    Dimension { expected: usize, actual: usize },
}

impl Covariance {
    /// Creates a full-matrix covariance from rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows are ragged or the matrix is not square.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, CovarianceError> {
        let n = rows.len();
        if let Some(row) = rows.iter().find(|row| row.len() != n) {
            return Err(CovarianceError::NotSquare {
                rows: n,
                cols: row.len(),
            });
        }
        Ok(Self::Matrix(DMatrix::from_fn(n, n, |i, j| rows[i][j])))
    }

    /// Creates a diagonal covariance from variances.
    #[must_use]
    pub fn diagonal(variances: &[f64]) -> Self {
        Self::Diagonal(DVector::from_column_slice(variances))
    }

    /// Returns the name of this form as used in case sections.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Matrix(_) => "Matrix",
            Self::Diagonal(_) => "DiagonalSparseMatrix",
            Self::Scalar(_) => "ScalarSparseMatrix",
        }
    }

    /// Returns the dimension fixed by this covariance, if any.
    ///
    /// A scalar covariance adapts to any dimension.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        match self {
            Self::Matrix(m) => Some(m.nrows()),
            Self::Diagonal(d) => Some(d.len()),
            Self::Scalar(_) => None,
        }
    }

    /// Checks that the covariance is well formed for vectors of length `n`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variance is not finite and positive, the matrix
    /// is not square, the dimension differs from `n`, or a full matrix is not
    /// symmetric positive definite.
    pub fn validate(&self, n: usize) -> Result<(), CovarianceError> {
        match self {
            Self::Scalar(v) => check_variance(*v),
            Self::Diagonal(d) => {
                check_dimension(n, d.len())?;
                d.iter().try_for_each(|v| check_variance(*v))
            }
            Self::Matrix(m) => {
                if !m.is_square() {
                    return Err(CovarianceError::NotSquare {
                        rows: m.nrows(),
                        cols: m.ncols(),
                    });
                }
                check_dimension(n, m.nrows())?;
                self.inverse(n).map(|_| ())
            }
        }
    }

    /// Returns the dense `n x n` matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the covariance dimension differs from `n`.
    pub fn to_matrix(&self, n: usize) -> Result<DMatrix<f64>, CovarianceError> {
        match self {
            Self::Scalar(v) => Ok(DMatrix::from_diagonal_element(n, n, *v)),
            Self::Diagonal(d) => {
                check_dimension(n, d.len())?;
                Ok(DMatrix::from_diagonal(d))
            }
            Self::Matrix(m) => {
                check_dimension(n, m.nrows())?;
                Ok(m.clone())
            }
        }
    }

    /// Returns the dense inverse `n x n` matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension differs from `n`, a variance is not
    /// positive, or a full matrix is not symmetric positive definite.
    pub fn inverse(&self, n: usize) -> Result<DMatrix<f64>, CovarianceError> {
        match self {
            Self::Scalar(v) => {
                check_variance(*v)?;
                Ok(DMatrix::from_diagonal_element(n, n, v.recip()))
            }
            Self::Diagonal(d) => {
                check_dimension(n, d.len())?;
                d.iter().try_for_each(|v| check_variance(*v))?;
                Ok(DMatrix::from_diagonal(&d.map(f64::recip)))
            }
            Self::Matrix(m) => {
                check_dimension(n, m.nrows())?;
                if !is_symmetric(m) {
                    return Err(CovarianceError::NotPositiveDefinite);
                }
                m.clone()
                    .cholesky()
                    .map(|chol| chol.inverse())
                    .ok_or(CovarianceError::NotPositiveDefinite)
            }
        }
    }

    /// Computes the weighted squared norm `vᵀ C⁻¹ v`.
    ///
    /// # Errors
    ///
    /// Returns an error if the covariance cannot be inverted for `v.len()`.
    pub fn weighted_norm_squared(&self, v: &DVector<f64>) -> Result<f64, CovarianceError> {
        match self {
            Self::Scalar(s) => {
                check_variance(*s)?;
                Ok(v.norm_squared() / s)
            }
            Self::Diagonal(d) => {
                check_dimension(v.len(), d.len())?;
                d.iter().try_for_each(|s| check_variance(*s))?;
                Ok(v.iter().zip(d.iter()).map(|(x, s)| x * x / s).sum())
            }
            Self::Matrix(_) => {
                let inv = self.inverse(v.len())?;
                Ok(v.dot(&(inv * v)))
            }
        }
    }
}

fn check_variance(v: f64) -> Result<(), CovarianceError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(CovarianceError::NonPositiveVariance(v))
    }
}

fn check_dimension(expected: usize, actual: usize) -> Result<(), CovarianceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CovarianceError::Dimension { expected, actual })
    }
}

fn is_symmetric(m: &DMatrix<f64>) -> bool {
    let scale = m.amax().max(f64::MIN_POSITIVE);
    (0..m.nrows()).all(|i| (0..i).all(|j| (m[(i, j)] - m[(j, i)]).abs() <= 1e-12 * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn scalar_adapts_to_any_dimension() {
        let cov = Covariance::Scalar(0.5);

        assert_eq!(cov.dimension(), None);
        assert!(cov.validate(4).is_ok());

        let inv = cov.inverse(3).unwrap();
        assert_eq!(inv.shape(), (3, 3));
        assert_relative_eq!(inv[(1, 1)], 2.0);
        assert_relative_eq!(inv[(0, 1)], 0.0);
    }

    #[test]
    fn diagonal_weights_each_component() {
        let cov = Covariance::diagonal(&[1.0, 4.0]);
        let v = DVector::from_vec(vec![2.0, 2.0]);

        assert_relative_eq!(cov.weighted_norm_squared(&v).unwrap(), 4.0 + 1.0);
    }

    #[test]
    fn matrix_norm_matches_explicit_inverse() {
        let cov = Covariance::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let v = DVector::from_vec(vec![1.0, -1.0]);

        // inverse = [[2, -1], [-1, 2]] / 3, so vᵀ C⁻¹ v = 6 / 3.
        assert_relative_eq!(cov.weighted_norm_squared(&v).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_positive_variances() {
        assert_eq!(
            Covariance::Scalar(0.0).validate(1),
            Err(CovarianceError::NonPositiveVariance(0.0))
        );
        assert!(matches!(
            Covariance::diagonal(&[1.0, f64::NAN]).validate(2),
            Err(CovarianceError::NonPositiveVariance(_))
        ));
    }

    #[test]
    fn rejects_dimension_mismatch() {
        assert_eq!(
            Covariance::diagonal(&[1.0, 2.0]).validate(3),
            Err(CovarianceError::Dimension {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn rejects_ragged_and_indefinite_matrices() {
        assert_eq!(
            Covariance::from_rows(&[vec![1.0, 0.0], vec![0.0]]),
            Err(CovarianceError::NotSquare { rows: 2, cols: 1 })
        );

        let indefinite = Covariance::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        assert_eq!(
            indefinite.validate(2),
            Err(CovarianceError::NotPositiveDefinite)
        );

        let asymmetric = Covariance::from_rows(&[vec![2.0, 1.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(
            asymmetric.validate(2),
            Err(CovarianceError::NotPositiveDefinite)
        );
    }

    #[test]
    fn dense_forms_agree() {
        let scalar = Covariance::Scalar(3.0).to_matrix(2).unwrap();
        let diagonal = Covariance::diagonal(&[3.0, 3.0]).to_matrix(2).unwrap();

        assert_eq!(scalar, diagonal);
    }
}
