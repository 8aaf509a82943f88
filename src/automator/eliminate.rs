use std::sync::Arc;

use crate::automator::{apply_first, Automator, Heartbeat, Status};
use crate::error::ProverError;
use crate::transformation::{Transformation, TransformationKind};

/// Removes one obviously true antecedent per heartbeat.
pub struct EliminateObviousAntecedents {
    rule: Arc<Transformation>,
}

impl EliminateObviousAntecedents {
    pub fn new() -> EliminateObviousAntecedents {
        EliminateObviousAntecedents {
            rule: Arc::new(Transformation::builtin(
                TransformationKind::EliminateObviousAntecedent,
            )),
        }
    }
}

impl Default for EliminateObviousAntecedents {
    fn default() -> EliminateObviousAntecedents {
        EliminateObviousAntecedents::new()
    }
}

impl Automator for EliminateObviousAntecedents {
    fn name(&self) -> String {
        "EliminateObviousAntecedents".to_string()
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        if apply_first(&self.rule, beat.state)? {
            Ok(Status::Continue)
        } else {
            Ok(Status::Pop)
        }
    }
}

/// Removes one duplicated antecedent per heartbeat. The first copy stays.
pub struct EliminateRedundantAntecedents {
    rule: Arc<Transformation>,
}

impl EliminateRedundantAntecedents {
    pub fn new() -> EliminateRedundantAntecedents {
        EliminateRedundantAntecedents {
            rule: Arc::new(Transformation::builtin(
                TransformationKind::EliminateRedundantAntecedent,
            )),
        }
    }
}

impl Default for EliminateRedundantAntecedents {
    fn default() -> EliminateRedundantAntecedents {
        EliminateRedundantAntecedents::new()
    }
}

impl Automator for EliminateRedundantAntecedents {
    fn name(&self) -> String {
        "EliminateRedundantAntecedents".to_string()
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        if apply_first(&self.rule, beat.state)? {
            Ok(Status::Continue)
        } else {
            Ok(Status::Pop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::proof_state::ProofState;
    use crate::theorem::TheoremLibrary;

    fn run(automator: &mut dyn Automator, state: &mut ProofState) {
        loop {
            let mut beat = Heartbeat::new(state);
            if automator.step(&mut beat).unwrap() == Status::Pop {
                return;
            }
        }
    }

    #[test]
    fn test_eliminate_obvious_antecedents() {
        let mut state = ProofState::parse(
            &["true", "f(a) = f(a)", "p", "a = b"],
            &["q"],
            Arc::new(TheoremLibrary::empty()),
        );
        run(&mut EliminateObviousAntecedents::new(), &mut state);
        assert_eq!(
            state.antecedent_expressions(),
            vec![Expression::parse("p"), Expression::parse("a = b")]
        );
        assert_eq!(state.step_count(), 2);
    }

    #[test]
    fn test_eliminate_redundant_antecedents() {
        let mut state = ProofState::parse(
            &["p", "q", "p", "r", "q", "p"],
            &["s"],
            Arc::new(TheoremLibrary::empty()),
        );
        run(&mut EliminateRedundantAntecedents::new(), &mut state);
        assert_eq!(
            state.antecedent_expressions(),
            vec![Expression::parse("p"), Expression::parse("q"), Expression::parse("r")]
        );
    }
}
