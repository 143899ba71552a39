/// Actions an observer can take while a solver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver early and return the last accepted estimate.
    StopEarly,

    /// Treat the current trial as worse than the last accepted estimate.
    ///
    /// The line search shrinks its step instead of accepting the trial.
    /// On a failed trial this recovers from the operator error rather than
    /// propagating it.
    AssumeWorse,
}
