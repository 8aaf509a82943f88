use std::sync::Arc;

use crate::proof_state::ProofState;
use crate::prover::{Outcome, Prover, ProverConfig, ProverMode};
use crate::theorem::TheoremLibrary;
use crate::transformation::{Source, TransformationKind};

pub fn library(theorems: &[(&str, &str)]) -> Arc<TheoremLibrary> {
    match TheoremLibrary::parse(theorems) {
        Ok(library) => Arc::new(library),
        Err(e) => panic!("bad theorems: {}", e),
    }
}

pub fn state(theorems: &[(&str, &str)], antecedents: &[&str], consequents: &[&str]) -> ProofState {
    ProofState::parse(antecedents, consequents, library(theorems))
}

// Runs the default pipeline with the given config, returning the prover for inspection.
pub fn prove_with(
    config: ProverConfig,
    theorems: &[(&str, &str)],
    antecedents: &[&str],
    consequents: &[&str],
) -> (Outcome, Prover) {
    let mut prover = Prover::new(state(theorems, antecedents, consequents), config, vec![]);
    let outcome = match prover.search() {
        Ok(outcome) => outcome,
        Err(e) => panic!("search failed: {}", e),
    };
    (outcome, prover)
}

// Does one proof with the test configuration.
pub fn prove_text(theorems: &[(&str, &str)], antecedents: &[&str], consequents: &[&str]) -> Outcome {
    prove_with(ProverMode::Test.config(), theorems, antecedents, consequents).0
}

/// How many recorded steps came from this kind of builtin transformation.
pub fn count_builtin(prover: &Prover, kind: &TransformationKind) -> usize {
    prover
        .state()
        .steps()
        .iter()
        .filter(|step| step.transformation.source == Source::Builtin)
        .filter(|step| std::mem::discriminant(&step.transformation.kind) == std::mem::discriminant(kind))
        .count()
}

/// How many recorded steps came from a theorem or an antecedent.
pub fn count_rewrites(prover: &Prover) -> usize {
    prover
        .state()
        .steps()
        .iter()
        .filter(|step| step.transformation.source != Source::Builtin)
        .count()
}
