use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::expression::Expression;
use crate::proof_state::ProofState;
use crate::prover::{Prover, ProverConfig};
use crate::report::ProofReport;
use crate::syntax::parse_expression;
use crate::theorem::{Theorem, TheoremLibrary};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoremEntry {
    pub name: String,
    pub assertion: String,
}

/// Something to prove: the antecedents imply the consequents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub name: String,

    #[serde(default)]
    pub antecedents: Vec<String>,

    pub consequents: Vec<String>,
}

/// A problem file: theorems shared by a list of obligations.
/// Expressions are written in the text notation of the syntax module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub theorems: Vec<TheoremEntry>,

    pub obligations: Vec<Obligation>,
}

fn parse_all(obligation: &str, texts: &[String]) -> Result<Vec<Expression>, String> {
    texts
        .iter()
        .map(|text| {
            parse_expression(text)
                .map_err(|e| format!("in obligation {}, could not parse '{}': {}", obligation, text, e))
        })
        .collect()
}

impl Problem {
    pub fn from_json(text: &str) -> Result<Problem, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid problem file: {}", e))
    }

    pub fn load(path: &Path) -> Result<Problem, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
        Problem::from_json(&text)
    }

    pub fn library(&self) -> Result<TheoremLibrary, String> {
        let theorems = self
            .theorems
            .iter()
            .map(|entry| Theorem::parse(&entry.name, &entry.assertion))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
        TheoremLibrary::new(theorems).map_err(|e| e.to_string())
    }

    /// The obligation with the given name, if there is one.
    pub fn obligation(&self, name: &str) -> Option<&Obligation> {
        self.obligations.iter().find(|o| o.name == name)
    }

    pub fn proof_state(
        obligation: &Obligation,
        library: Arc<TheoremLibrary>,
    ) -> Result<ProofState, String> {
        let antecedents = parse_all(&obligation.name, &obligation.antecedents)?;
        let consequents = parse_all(&obligation.name, &obligation.consequents)?;
        if consequents.is_empty() {
            return Err(format!("obligation {} has no consequents", obligation.name));
        }
        Ok(ProofState::new(
            &obligation.name,
            antecedents,
            consequents,
            library,
        ))
    }

    /// Searches for a proof of each obligation in turn, passing each report to the callback
    /// as it's made. Once the token is canceled, the remaining obligations are skipped.
    pub fn prove_obligations(
        obligations: &[Obligation],
        library: Arc<TheoremLibrary>,
        config: &ProverConfig,
        token: &CancellationToken,
        mut on_report: impl FnMut(&ProofReport),
    ) -> Result<Vec<ProofReport>, String> {
        let mut reports = vec![];
        for obligation in obligations {
            let state = Problem::proof_state(obligation, library.clone())?;
            let mut prover = Prover::new(state, config.clone(), vec![token.clone()]);
            let outcome = prover.search().map_err(|e| e.to_string())?;
            let report = prover.report(outcome);
            on_report(&report);
            reports.push(report);
            if token.is_cancelled() {
                break;
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::{Outcome, ProverMode};
    use assert_fs::prelude::*;
    use indoc::indoc;

    const PROBLEM: &str = indoc! {r#"
        {
            "theorems": [
                {"name": "plus_zero", "assertion": "?x + 0 = ?x"}
            ],
            "obligations": [
                {"name": "simple", "antecedents": ["p(a)"], "consequents": ["p(a + 0)"]},
                {"name": "no_givens", "consequents": ["b = b"]}
            ]
        }
    "#};

    #[test]
    fn test_problem_from_json() {
        let problem = Problem::from_json(PROBLEM).unwrap();
        assert_eq!(problem.theorems.len(), 1);
        assert_eq!(problem.obligations.len(), 2);
        assert!(problem.obligation("no_givens").unwrap().antecedents.is_empty());
        let library = Arc::new(problem.library().unwrap());
        assert!(!library.transformations().is_empty());
        let state = Problem::proof_state(&problem.obligations[0], library).unwrap();
        assert_eq!(state.name(), "simple");
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("p(a + 0)")]);
    }

    #[test]
    fn test_problem_load() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("problem.json");
        file.write_str(PROBLEM).unwrap();
        let problem = Problem::load(file.path()).unwrap();
        assert_eq!(problem.obligations[1].name, "no_givens");
        temp.close().unwrap();
    }

    #[test]
    fn test_problem_errors() {
        assert!(Problem::from_json("{\"theorems\": []}").is_err());
        let problem = Problem::from_json(indoc! {r#"
            {"obligations": [{"name": "bad", "consequents": ["f(a"]}]}
        "#})
        .unwrap();
        let library = Arc::new(problem.library().unwrap());
        match Problem::proof_state(&problem.obligations[0], library) {
            Ok(_) => panic!("expected a parse error"),
            Err(e) => assert!(e.contains("bad")),
        }
    }

    #[test]
    fn test_prove_obligations() {
        let problem = Problem::from_json(PROBLEM).unwrap();
        let library = Arc::new(problem.library().unwrap());
        let mut names = vec![];
        let reports = Problem::prove_obligations(
            &problem.obligations,
            library,
            &ProverMode::Test.config(),
            &CancellationToken::new(),
            |report| names.push(report.name.clone()),
        )
        .unwrap();
        assert_eq!(names, vec!["simple".to_string(), "no_givens".to_string()]);
        assert!(reports.iter().all(|r| r.outcome == Outcome::Proved));
    }

    #[test]
    fn test_cancellation_skips_remaining_obligations() {
        let problem = Problem::from_json(PROBLEM).unwrap();
        let library = Arc::new(problem.library().unwrap());
        let token = CancellationToken::new();
        token.cancel();
        let reports = Problem::prove_obligations(
            &problem.obligations,
            library,
            &ProverMode::Test.config(),
            &token,
            |_| {},
        )
        .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "simple");
        assert_eq!(reports[0].outcome, Outcome::Interrupted);
        assert_eq!(reports[0].heartbeats, 0);
    }
}
