use std::{
    sync::{
        Mutex,
        mpsc::{Receiver, SyncSender, sync_channel},
    },
    thread::{self, JoinHandle},
};

use varda_core::State;

use crate::{Case, CaseError, ObservationOperator, OneFunction, OperatorError};

type Reply = Result<Vec<State>, OperatorError>;

/// Runs a case on a worker thread and hands its operator evaluations out.
///
/// The case's observation function is replaced by requests that the caller
/// answers, one batch at a time:
///
/// ```no_run
/// # use varda_case::{Case, Exchange};
/// # fn model(state: &varda_core::State) -> varda_core::State { state.clone() }
/// # fn run(case: Case) -> Result<(), varda_case::CaseError> {
/// let mut exchange = Exchange::launch(case);
/// while let Some(batch) = exchange.next()? {
///     exchange.set_result(batch.iter().map(model).collect())?;
/// }
/// let case = exchange.finish()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Exchange {
    requests: Receiver<Vec<State>>,
    replies: SyncSender<Reply>,
    pending: bool,
    worker: JoinHandle<Result<Case, CaseError>>,
}

impl Exchange {
    /// Starts executing `case` on a worker thread.
    ///
    /// Evaluations go through [`Exchange::next`] instead of any observation
    /// function already set. The case's own operator section is restored
    /// once execution ends.
    #[must_use]
    pub fn launch(mut case: Case) -> Self {
        let (request_tx, requests) = sync_channel::<Vec<State>>(0);
        let (replies, reply_rx) = sync_channel::<Reply>(0);
        let reply_rx = Mutex::new(reply_rx);

        let proxy = OneFunction::multi(move |states: &[State]| -> Reply {
            request_tx
                .send(states.to_vec())
                .map_err(|_| OperatorError::new("exchange closed before the request"))?;
            let receiver = reply_rx
                .lock()
                .map_err(|_| OperatorError::new("exchange reply channel poisoned"))?;
            receiver
                .recv()
                .map_err(|_| OperatorError::new("exchange closed before the reply"))?
        });

        let original = case.observation_operator().clone();
        case.set(
            ObservationOperator::new(proxy)
                .with_differential_increment(original.differential_increment)
                .with_centered_finite_difference(original.centered_finite_difference),
        );

        let worker = thread::spawn(move || {
            let executed = case.execute().map(|_| ());
            // Dropping the proxy closes the request channel.
            case.set(original);
            executed.map(|()| case)
        });
        log::debug!("exchange launched");

        Self {
            requests,
            replies,
            pending: false,
            worker,
        }
    }

    /// Blocks until the solver requests a batch of evaluations.
    ///
    /// Returns `None` once the assimilation has finished.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Exchange`] if the previous request is unanswered.
    pub fn next(&mut self) -> Result<Option<Vec<State>>, CaseError> {
        if self.pending {
            return Err(CaseError::Exchange("the previous request is unanswered"));
        }
        match self.requests.recv() {
            Ok(batch) => {
                log::trace!("exchange request for {} states", batch.len());
                self.pending = true;
                Ok(Some(batch))
            }
            Err(_) => Ok(None),
        }
    }

    /// Answers the pending request with one output per requested state.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Exchange`] if no request is pending or the
    /// worker has stopped.
    pub fn set_result(&mut self, outputs: Vec<State>) -> Result<(), CaseError> {
        self.reply(Ok(outputs))
    }

    /// Answers the pending request with a failure, which fails the trial.
    ///
    /// # Errors
    ///
    /// See [`Exchange::set_result`].
    pub fn set_error(&mut self, message: impl Into<String>) -> Result<(), CaseError> {
        self.reply(Err(OperatorError::new(message.into())))
    }

    fn reply(&mut self, reply: Reply) -> Result<(), CaseError> {
        if !self.pending {
            return Err(CaseError::Exchange("no request is pending"));
        }
        self.pending = false;
        self.replies
            .send(reply)
            .map_err(|_| CaseError::Exchange("the worker has stopped"))
    }

    /// Waits for the worker and returns the executed case.
    ///
    /// Finishing with a request still open abandons the assimilation.
    ///
    /// # Errors
    ///
    /// Returns the execution error, or [`CaseError::Exchange`] if the worker
    /// panicked.
    pub fn finish(self) -> Result<Case, CaseError> {
        let Self {
            requests,
            replies,
            worker,
            ..
        } = self;
        drop(requests);
        drop(replies);

        worker
            .join()
            .map_err(|_| CaseError::Exchange("the worker panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Background, Observation};

    fn case() -> Case {
        let mut case = Case::new();
        case.set(Background::new([0.0, 0.0]))
            .set(Observation::new([1.0, -2.0]));
        case
    }

    #[test]
    fn answers_requests_until_done() {
        let mut exchange = Exchange::launch(case());

        let mut requests = 0;
        while let Some(batch) = exchange.next().unwrap() {
            requests += 1;
            exchange.set_result(batch).unwrap();
        }
        let case = exchange.finish().unwrap();

        assert!(requests > 1);
        let analysis = case.results().unwrap().analysis().unwrap();
        assert!((analysis[0] - 1.0).abs() < 1e-6);
        assert!((analysis[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn protocol_misuse_is_reported() {
        let mut exchange = Exchange::launch(case());

        assert!(matches!(
            exchange.set_result(Vec::new()),
            Err(CaseError::Exchange(_))
        ));

        let batch = exchange.next().unwrap();
        assert!(batch.is_some());
        assert!(matches!(exchange.next(), Err(CaseError::Exchange(_))));

        exchange.set_error("model diverged").unwrap();
        assert!(matches!(exchange.next(), Ok(None)));
        assert!(matches!(exchange.finish(), Err(CaseError::Solver(_))));
    }

    #[test]
    fn finishing_with_an_open_request_abandons_the_case() {
        let mut exchange = Exchange::launch(case());

        assert!(exchange.next().unwrap().is_some());
        assert!(matches!(exchange.finish(), Err(CaseError::Solver(_))));
    }

    #[test]
    fn missing_keys_surface_on_finish() {
        let mut exchange = Exchange::launch(Case::new());

        assert!(matches!(exchange.next(), Ok(None)));
        assert!(matches!(
            exchange.finish(),
            Err(CaseError::Missing("Background/Vector"))
        ));
    }
}
