//! Finite-difference approximation of the observation operator's Jacobian.

use nalgebra::DMatrix;
use varda_core::{ObservationOperator, State};

use crate::{Differences, Error, evaluate::simulate};

/// Approximates the Jacobian `H = ∂h/∂x` at `state`.
///
/// `simulated` must be `h(state)`; it is reused by forward differences and
/// fixes the number of rows. All perturbed states are sent to the operator in
/// a single batch: `n` states for forward differences, `2n` for centered ones
/// (ordered `x + δ₀e₀, x − δ₀e₀, x + δ₁e₁, …`).
///
/// The perturbation of component `i` is `increment · |xᵢ|`, or `increment`
/// itself when `xᵢ` is zero.
///
/// # Errors
///
/// Returns an error if the operator fails or returns output of the wrong shape.
pub fn finite_difference<Op>(
    operator: &Op,
    state: &State,
    simulated: &State,
    differences: &Differences,
) -> Result<DMatrix<f64>, Error>
where
    Op: ObservationOperator + ?Sized,
{
    let n = state.len();
    let m = simulated.len();
    let steps: Vec<f64> = state.iter().map(|&x| differences.step(x)).collect();

    let perturbed = |i: usize, sign: f64| {
        let mut x = state.clone();
        x[i] += sign * steps[i];
        x
    };

    let mut jacobian = DMatrix::zeros(m, n);

    if differences.centered() {
        let batch: Vec<State> = (0..n)
            .flat_map(|i| [perturbed(i, 1.0), perturbed(i, -1.0)])
            .collect();
        let outputs = simulate(operator, &batch, m)?;

        for (i, pair) in outputs.chunks_exact(2).enumerate() {
            let column = (&pair[0] - &pair[1]) / (2.0 * steps[i]);
            jacobian.set_column(i, &column);
        }
    } else {
        let batch: Vec<State> = (0..n).map(|i| perturbed(i, 1.0)).collect();
        let outputs = simulate(operator, &batch, m)?;

        for (i, output) in outputs.iter().enumerate() {
            let column = (output - simulated) / steps[i];
            jacobian.set_column(i, &column);
        }
    }

    Ok(jacobian)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{cell::Cell, convert::Infallible};

    use approx::assert_relative_eq;
    use varda_core::MultiFunction;

    fn linear(x: &State) -> State {
        State::from_vec(vec![
            x[0],
            2.0 * x[1],
            3.0 * x[2],
            x[0] + 2.0 * x[1] + 3.0 * x[2],
        ])
    }

    fn expected() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 0.0, 0.0, //
                0.0, 2.0, 0.0, //
                0.0, 0.0, 3.0, //
                1.0, 2.0, 3.0,
            ],
        )
    }

    #[test]
    fn forward_differences_use_one_batch() {
        let calls = Cell::new(0);
        let operator = MultiFunction(|states: &[State]| {
            calls.set(calls.get() + 1);
            assert_eq!(states.len(), 3);
            Ok::<_, Infallible>(states.iter().map(linear).collect())
        });
        let x = State::from_vec(vec![5.0, 0.0, 9.0]);

        let jacobian =
            finite_difference(&operator, &x, &linear(&x), &Differences::default()).unwrap();

        assert_eq!(calls.get(), 1);
        assert_relative_eq!(jacobian, expected(), epsilon = 1e-8);
    }

    #[test]
    fn centered_differences_match_a_quadratic_exactly() {
        let operator = MultiFunction(|states: &[State]| {
            Ok::<_, Infallible>(states.iter().map(|x| x.map(|v| v * v)).collect())
        });
        let x = State::from_vec(vec![2.0, -3.0]);
        let differences = Differences::new(1e-3, true).unwrap();

        let jacobian =
            finite_difference(&operator, &x, &x.map(|v| v * v), &differences).unwrap();

        assert_relative_eq!(jacobian[(0, 0)], 4.0, epsilon = 1e-9);
        assert_relative_eq!(jacobian[(1, 1)], -6.0, epsilon = 1e-9);
        assert_relative_eq!(jacobian[(0, 1)], 0.0);
    }
}
