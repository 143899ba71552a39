use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An optional lower and upper bound on one component.
///
/// `None` on either side leaves that side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bound {
    /// Creates a bound closed on both sides.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Returns `value` moved onto the bound interval.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.lower.map_or(value, |lower| value.max(lower));
        self.upper.map_or(value, |upper| value.min(upper))
    }

    /// Returns true if `value` lies within the bound interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower.is_none_or(|lower| value >= lower)
            && self.upper.is_none_or(|upper| value <= upper)
    }
}

impl From<(f64, f64)> for Bound {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self::new(lower, upper)
    }
}

impl From<(Option<f64>, Option<f64>)> for Bound {
    fn from((lower, upper): (Option<f64>, Option<f64>)) -> Self {
        Self { lower, upper }
    }
}

/// Per-component bound constraints on a state vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounds(Vec<Bound>);

/// Errors that can occur when validating bounds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundsError {
    #[error("bound {index} has a NaN limit")]
    NaN { index: usize },

    #[error("bound {index} has lower limit {lower} above upper limit {upper}")]
    Inverted { index: usize, lower: f64, upper: f64 },

    #[error("{actual} bounds given for a state of length {expected}")]
    Dimension { expected: usize, actual: usize },
}

impl Bounds {
    /// Creates validated bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is NaN or a lower limit exceeds its upper limit.
    pub fn new<B: Into<Bound>>(bounds: impl IntoIterator<Item = B>) -> Result<Self, BoundsError> {
        let bounds: Vec<Bound> = bounds.into_iter().map(Into::into).collect();

        for (index, bound) in bounds.iter().enumerate() {
            if bound.lower.is_some_and(f64::is_nan) || bound.upper.is_some_and(f64::is_nan) {
                return Err(BoundsError::NaN { index });
            }
            if let (Some(lower), Some(upper)) = (bound.lower, bound.upper)
                && lower > upper
            {
                return Err(BoundsError::Inverted {
                    index,
                    lower,
                    upper,
                });
            }
        }

        Ok(Self(bounds))
    }

    /// Returns the number of bounded components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no bound is given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the per-component bounds.
    #[must_use]
    pub fn as_slice(&self) -> &[Bound] {
        &self.0
    }

    /// Checks that the bounds apply to states of length `n`.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of bounds differs from `n`.
    pub fn check_dimension(&self, n: usize) -> Result<(), BoundsError> {
        if self.0.len() == n {
            Ok(())
        } else {
            Err(BoundsError::Dimension {
                expected: n,
                actual: self.0.len(),
            })
        }
    }

    /// Projects `state` onto the feasible box, component by component.
    ///
    /// Components beyond the number of bounds are left untouched.
    pub fn project(&self, state: &mut DVector<f64>) {
        for (value, bound) in state.iter_mut().zip(&self.0) {
            *value = bound.clamp(*value);
        }
    }

    /// Returns true if every component lies within its bound.
    #[must_use]
    pub fn contains(&self, state: &DVector<f64>) -> bool {
        state
            .iter()
            .zip(&self.0)
            .all(|(value, bound)| bound.contains(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_onto_box() {
        let bounds = Bounds::new([(0.0, 10.0), (3.0, 13.0)]).unwrap();
        let mut state = DVector::from_vec(vec![-1.0, 20.0]);

        bounds.project(&mut state);

        assert_eq!(state, DVector::from_vec(vec![0.0, 13.0]));
        assert!(bounds.contains(&state));
    }

    #[test]
    fn open_sides_leave_values_free() {
        let bounds = Bounds::new([(Some(1.0), None), (None, None)]).unwrap();
        let mut state = DVector::from_vec(vec![1e9, -1e9]);

        bounds.project(&mut state);

        assert_eq!(state, DVector::from_vec(vec![1e9, -1e9]));
    }

    #[test]
    fn rejects_inverted_and_nan_limits() {
        assert_eq!(
            Bounds::new([(2.0, 1.0)]),
            Err(BoundsError::Inverted {
                index: 0,
                lower: 2.0,
                upper: 1.0
            })
        );
        assert_eq!(
            Bounds::new([(0.0, 1.0), (f64::NAN, 1.0)]),
            Err(BoundsError::NaN { index: 1 })
        );
    }

    #[test]
    fn checks_dimension() {
        let bounds = Bounds::new([(20.0, 40.0)]).unwrap();

        assert!(bounds.check_dimension(1).is_ok());
        assert_eq!(
            bounds.check_dimension(3),
            Err(BoundsError::Dimension {
                expected: 3,
                actual: 1
            })
        );
    }
}
