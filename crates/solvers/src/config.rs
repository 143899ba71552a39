use thiserror::Error;

/// Configuration for the iterative solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_steps: usize,
    cost_decrement_tolerance: f64,
    differences: Differences,
}

/// Finite-difference settings for Jacobian approximation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Differences {
    increment: f64,
    centered: bool,
}

/// Errors that can occur when validating a solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("cost decrement tolerance must be finite and positive, got {0}")]
    CostDecrementTolerance(f64),

    #[error("differential increment must be finite and positive, got {0}")]
    DifferentialIncrement(f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_steps: 100,
            cost_decrement_tolerance: 1e-7,
            differences: Differences::default(),
        }
    }
}

impl Config {
    /// Creates a new config with a validated tolerance.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not finite and positive.
    pub fn new(max_steps: usize, cost_decrement_tolerance: f64) -> Result<Self, ConfigError> {
        if !cost_decrement_tolerance.is_finite() || cost_decrement_tolerance <= 0.0 {
            return Err(ConfigError::CostDecrementTolerance(cost_decrement_tolerance));
        }

        Ok(Self {
            max_steps,
            cost_decrement_tolerance,
            differences: Differences::default(),
        })
    }

    /// Replaces the finite-difference settings.
    #[must_use]
    pub fn with_differences(mut self, differences: Differences) -> Self {
        self.differences = differences;
        self
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Returns the relative cost decrement below which iteration stops.
    #[must_use]
    pub fn cost_decrement_tolerance(&self) -> f64 {
        self.cost_decrement_tolerance
    }

    /// Returns the finite-difference settings.
    #[must_use]
    pub fn differences(&self) -> &Differences {
        &self.differences
    }
}

impl Default for Differences {
    fn default() -> Self {
        Self {
            increment: 1e-4,
            centered: false,
        }
    }
}

impl Differences {
    /// Creates validated finite-difference settings.
    ///
    /// `increment` is relative to each component's magnitude, and used as an
    /// absolute step for components equal to zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the increment is not finite and positive.
    pub fn new(increment: f64, centered: bool) -> Result<Self, ConfigError> {
        if !increment.is_finite() || increment <= 0.0 {
            return Err(ConfigError::DifferentialIncrement(increment));
        }
        Ok(Self {
            increment,
            centered,
        })
    }

    /// Returns the relative differential increment.
    #[must_use]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Returns true if centered differences are used.
    #[must_use]
    pub fn centered(&self) -> bool {
        self.centered
    }

    /// Returns the perturbation size for a component with value `x`.
    #[must_use]
    pub fn step(&self, x: f64) -> f64 {
        if x == 0.0 {
            self.increment
        } else {
            self.increment * x.abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();

        assert_eq!(config.max_steps(), 100);
        assert_eq!(config.cost_decrement_tolerance(), 1e-7);
        assert_eq!(config.differences().increment(), 1e-4);
        assert!(!config.differences().centered());
    }

    #[test]
    fn rejects_bad_tolerances() {
        assert_eq!(
            Config::new(10, 0.0),
            Err(ConfigError::CostDecrementTolerance(0.0))
        );
        assert!(Config::new(10, f64::INFINITY).is_err());
        assert!(Differences::new(-1e-3, false).is_err());
    }

    #[test]
    fn step_is_relative_except_at_zero() {
        let differences = Differences::new(1e-3, false).unwrap();

        assert_eq!(differences.step(0.0), 1e-3);
        assert_eq!(differences.step(-20.0), 2e-2);
    }
}
