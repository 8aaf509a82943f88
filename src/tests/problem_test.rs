use std::sync::Arc;

use assert_fs::prelude::*;
use indoc::indoc;

use crate::problem::Problem;
use crate::prover::{Outcome, Prover, ProverMode};

const PROBLEM: &str = indoc! {r#"
    {
        "theorems": [
            {"name": "plus_zero", "assertion": "?x + 0 = ?x"},
            {"name": "lt_trans", "assertion": "?a < ?b and ?b < ?c implies ?a < ?c"}
        ],
        "obligations": [
            {
                "name": "zero",
                "antecedents": ["p(a)"],
                "consequents": ["p(a + 0)"]
            },
            {
                "name": "chain",
                "antecedents": ["x < y", "y < z + 0"],
                "consequents": ["x < z"]
            },
            {
                "name": "stuck",
                "antecedents": ["p(a)"],
                "consequents": ["q(a)"]
            }
        ]
    }
"#};

fn prove_file(text: &str) -> Vec<(String, Outcome)> {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("problem.json");
    file.write_str(text).unwrap();

    let problem = Problem::load(file.path()).unwrap();
    let library = Arc::new(problem.library().unwrap());
    let mut answer = vec![];
    for obligation in &problem.obligations {
        let state = Problem::proof_state(obligation, library.clone()).unwrap();
        let mut prover = Prover::new(state, ProverMode::Test.config(), vec![]);
        let outcome = prover.search().unwrap();
        let report = prover.report(outcome);
        assert!(report.to_json().is_ok());
        answer.push((report.name, outcome));
    }
    temp.close().unwrap();
    answer
}

#[test]
fn test_proving_a_problem_file() {
    let outcomes = prove_file(PROBLEM);
    assert_eq!(
        outcomes,
        vec![
            ("zero".to_string(), Outcome::Proved),
            ("chain".to_string(), Outcome::Proved),
            ("stuck".to_string(), Outcome::Exhausted),
        ]
    );
}

#[test]
fn test_inconsistent_arity_is_rejected() {
    let problem = Problem::from_json(indoc! {r#"
        {
            "theorems": [
                {"name": "one", "assertion": "f(?x) = g(?x)"},
                {"name": "two", "assertion": "f(?x, ?y) = ?y"}
            ],
            "obligations": []
        }
    "#})
    .unwrap();
    let error = problem.library().err().unwrap();
    assert!(error.contains("two"));
}

#[test]
fn test_report_of_a_failed_search() {
    let problem = Problem::from_json(PROBLEM).unwrap();
    let library = Arc::new(problem.library().unwrap());
    let obligation = problem.obligation("stuck").unwrap();
    let state = Problem::proof_state(obligation, library).unwrap();
    let mut prover = Prover::new(state, ProverMode::Test.config(), vec![]);
    let outcome = prover.search().unwrap();
    let text = prover.report(outcome).to_string();
    assert!(text.starts_with("stuck: Exhausted"));
    assert!(text.contains("q(a)"));
    assert!(text.contains("--- Done Developing Antecedent ---"));
}
