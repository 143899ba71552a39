use approx::assert_relative_eq;
use integration_tests::{init_logging, linear_case};
use varda_case::{CaseError, Variable};
use varda_core::State;
use varda_solvers::Algorithm;

fn truth() -> State {
    State::from_vec(vec![2.0, 3.0, 4.0])
}

#[test]
fn every_algorithm_recovers_the_truth() {
    init_logging();

    for algorithm in Algorithm::ALL {
        let mut case = linear_case(algorithm);

        let analysis = case.execute().unwrap().analysis().unwrap();

        assert_relative_eq!(*analysis, truth(), epsilon = 1e-7);
    }
}

#[test]
fn iterative_algorithms_start_from_the_background() {
    for algorithm in [Algorithm::ThreeDVar, Algorithm::NonLinearLeastSquares] {
        let mut case = linear_case(algorithm);
        case.execute().unwrap();

        let analyses = case.get("Analysis").unwrap();
        assert!(analyses.len() > 1);
        assert_eq!(analyses.as_slice()[0], State::from_vec(vec![5.0, 7.0, 9.0]));
    }
}

#[test]
fn one_shot_algorithms_store_background_and_analysis() {
    for algorithm in [Algorithm::Blue, Algorithm::LinearLeastSquares] {
        let mut case = linear_case(algorithm);
        let results = case.execute().unwrap();

        let analyses = results.get(Variable::Analysis).unwrap();
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses.as_slice()[0], State::from_vec(vec![5.0, 7.0, 9.0]));

        let oma = results.get(Variable::OMA);
        assert!(oma.is_none());
        let simulated = results
            .get(Variable::SimulatedObservationAtOptimum)
            .unwrap()
            .last()
            .unwrap();
        assert_relative_eq!(
            *simulated,
            State::from_vec(vec![2.0, 6.0, 12.0, 20.0]),
            epsilon = 1e-6
        );
    }
}

#[test]
fn failing_operator_aborts_the_case() {
    use std::io;

    use varda_case::{ObservationOperator, OneFunction};

    let mut case = linear_case(Algorithm::ThreeDVar);
    case.set(ObservationOperator::new(OneFunction::single(|_: &State| {
        Err::<State, _>(io::Error::other("model crashed"))
    })));

    let error = case.execute().unwrap_err();

    assert!(matches!(error, CaseError::Solver(_)));
    assert!(case.results().is_none());
}
