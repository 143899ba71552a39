use approx::assert_relative_eq;
use integration_tests::init_logging;
use varda_case::{CaseFile, OneFunction, Variable};
use varda_flood::scenario;

const FLOOD: &str = r#"
[AlgorithmParameters]
Algorithm = "3DVAR"

[AlgorithmParameters.Parameters]
Bounds = [{ lower = 20.0, upper = 40.0 }]
MaximumNumberOfSteps = 100
CostDecrementTolerance = 1e-7
StoreSupplementaryCalculations = ["CurrentOptimum", "CostFunctionJAtCurrentOptimum"]

[Background]
Vector = [20.0]

[BackgroundError]
DiagonalSparseMatrix = [5e10]

[Observation]
Vector = [0.19694513, 0.298513, 0.38073079, 0.45246109]

[ObservationError]
ScalarSparseMatrix = 0.5

[[Observer]]
Variable = "Analysis"
Template = "ValueSeriePrinter"
Info = "Ks series:"

[[Observer]]
Variable = "CostFunctionJAtCurrentOptimum"
Template = "ValueNorm"
"#;

#[test]
fn flood_case_file_calibrates() {
    init_logging();

    let model = scenario::reference().model;
    let mut case = CaseFile::from_toml_str(FLOOD)
        .unwrap()
        .into_case(OneFunction::operator(model))
        .unwrap();

    let results = case.execute().unwrap();

    assert_relative_eq!(results.analysis().unwrap()[0], 25.0, epsilon = 5e-7);
    let costs = results.get(Variable::CostFunctionJAtCurrentOptimum).unwrap();
    assert!(costs.last().unwrap()[0] < costs.as_slice()[0][0]);
    assert!(case.get("SimulatedObservationAtOptimum").is_none());
}

/// Only some parameters given; the rest take their defaults.
const PARTIAL: &str = r#"
[AlgorithmParameters]
Algorithm = "3DVAR"

[AlgorithmParameters.Parameters]
Bounds = [{ lower = 20.0, upper = 40.0 }]
MaximumNumberOfSteps = 100

[Background]
Vector = [20.0]

[BackgroundError]
DiagonalSparseMatrix = [5e10]

[Observation]
Vector = [0.19694513, 0.298513, 0.38073079, 0.45246109]

[ObservationError]
ScalarSparseMatrix = 0.5

[[Observer]]
Variable = "Analysis"
Template = "ValueSeriePrinter"
"#;

#[test]
fn partial_parameters_calibrate_with_defaults() {
    let model = scenario::reference().model;
    let mut case = CaseFile::from_toml_str(PARTIAL)
        .unwrap()
        .into_case(OneFunction::operator(model))
        .unwrap();

    let results = case.execute().unwrap();

    assert_relative_eq!(results.analysis().unwrap()[0], 25.0, epsilon = 5e-7);
    assert_relative_eq!(case.algorithm_parameters().cost_decrement_tolerance, 1e-7);
}

#[test]
fn case_file_renders_back_to_the_same_keys() {
    let model = scenario::reference().model;
    let case = CaseFile::from_toml_str(FLOOD)
        .unwrap()
        .into_case(OneFunction::operator(model))
        .unwrap();

    assert_eq!(
        case.find("AlgorithmParameters/Parameters/Bounds").as_deref(),
        Some("[[20, 40]]")
    );
    assert_eq!(case.find("BackgroundError/DiagonalSparseMatrix").as_deref(), Some("[50000000000]"));
    assert_eq!(case.find("ObservationError/ScalarSparseMatrix").as_deref(), Some("0.5"));
    assert_eq!(
        case.to_string().lines().filter(|line| line.starts_with("case.set('Observer'")).count(),
        2
    );
}
