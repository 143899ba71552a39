use std::{error::Error as StdError, fmt, sync::Arc};

use varda_core::{ObservationOperator, State};

type BoxError = Box<dyn StdError + Send + Sync>;
type BatchFn = dyn Fn(&[State]) -> Result<Vec<State>, OperatorError> + Send + Sync;

/// An error raised by a user-supplied observation function.
#[derive(Debug)]
pub struct OperatorError(BoxError);

impl OperatorError {
    /// Wraps any error.
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }
}

impl fmt::Display for OperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl StdError for OperatorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// The observation function of a case.
///
/// However the function is supplied, the case calls it through the batch
/// convention of [`ObservationOperator`]. [`input_function_as_multi`] reports
/// whether it natively took a batch.
///
/// [`input_function_as_multi`]: ObservationOperator::input_function_as_multi
#[derive(Clone)]
pub struct OneFunction {
    function: Arc<BatchFn>,
    multi: bool,
}

impl OneFunction {
    /// Wraps a function over a batch of states.
    pub fn multi<F, E>(function: F) -> Self
    where
        F: Fn(&[State]) -> Result<Vec<State>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            function: Arc::new(move |states: &[State]| {
                function(states).map_err(OperatorError::new)
            }),
            multi: true,
        }
    }

    /// Wraps a function over one state, mapped over each batch in order.
    pub fn single<F, E>(function: F) -> Self
    where
        F: Fn(&State) -> Result<State, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            function: Arc::new(move |states: &[State]| {
                states
                    .iter()
                    .map(|state| function(state).map_err(OperatorError::new))
                    .collect()
            }),
            multi: false,
        }
    }

    /// Wraps an existing observation operator.
    pub fn operator<Op>(operator: Op) -> Self
    where
        Op: ObservationOperator + Send + Sync + 'static,
    {
        let multi = operator.input_function_as_multi();
        Self {
            function: Arc::new(move |states: &[State]| {
                operator.evaluate(states).map_err(OperatorError::new)
            }),
            multi,
        }
    }
}

impl fmt::Debug for OneFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneFunction")
            .field("multi", &self.multi)
            .finish_non_exhaustive()
    }
}

impl ObservationOperator for OneFunction {
    type Error = OperatorError;

    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, OperatorError> {
        (self.function)(states)
    }

    fn input_function_as_multi(&self) -> bool {
        self.multi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<State> {
        vec![State::from_vec(vec![1.0]), State::from_vec(vec![-2.0])]
    }

    #[test]
    fn single_function_is_mapped_in_order() {
        let function = OneFunction::single(|x: &State| Ok::<_, OperatorError>(x * 10.0));

        let outputs = function.evaluate(&batch()).unwrap();

        assert_eq!(outputs, vec![State::from_vec(vec![10.0]), State::from_vec(vec![-20.0])]);
        assert!(!function.input_function_as_multi());
    }

    #[test]
    fn errors_keep_their_message() {
        let function = OneFunction::multi(|_: &[State]| Err::<Vec<State>, _>("model diverged"));

        let error = function.evaluate(&batch()).unwrap_err();

        assert_eq!(error.to_string(), "model diverged");
        assert!(function.input_function_as_multi());
    }
}
