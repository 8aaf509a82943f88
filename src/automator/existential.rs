use std::sync::Arc;

use crate::automator::{apply_first, Automator, Heartbeat, Status};
use crate::error::ProverError;
use crate::transformation::{Transformation, TransformationKind};

/// Discharges existential consequents by finding witnesses among the antecedents and
/// theorems, one per heartbeat. Each witness is substituted into every consequent.
pub struct ExistentialInstantiation {
    rule: Arc<Transformation>,
}

impl ExistentialInstantiation {
    pub fn new() -> ExistentialInstantiation {
        ExistentialInstantiation {
            rule: Arc::new(Transformation::builtin(
                TransformationKind::ExistentialInstantiation,
            )),
        }
    }
}

impl Default for ExistentialInstantiation {
    fn default() -> ExistentialInstantiation {
        ExistentialInstantiation::new()
    }
}

impl Automator for ExistentialInstantiation {
    fn name(&self) -> String {
        "ExistentialInstantiation".to_string()
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

    fn run(automator: &mut dyn Automator, state: &mut ProofState) -> usize {
        let mut heartbeats = 0;
        loop {
            heartbeats += 1;
            let mut beat = Heartbeat::new(state);
            if automator.step(&mut beat).unwrap() == Status::Pop {
                return heartbeats;
            }
        }
    }

    #[test]
    fn test_witness_is_substituted_into_other_consequents() {
        let mut state = ProofState::parse(
            &["x < y"],
            &["h(a)", "x < @b", "g(@b)"],
            Arc::new(TheoremLibrary::empty()),
        );
        assert_eq!(run(&mut ExistentialInstantiation::new(), &mut state), 2);
        assert_eq!(
            state.consequent_expressions(),
            vec![Expression::parse("h(a)"), Expression::parse("g(y)")]
        );
        assert_eq!(state.antecedent_expressions(), vec![Expression::parse("x < y")]);
        assert_eq!(state.step_count(), 1);
    }

    #[test]
    fn test_no_witness_leaves_the_goal() {
        let mut state = ProofState::parse(
            &["x < y"],
            &["z < @b"],
            Arc::new(TheoremLibrary::empty()),
        );
        assert_eq!(run(&mut ExistentialInstantiation::new(), &mut state), 1);
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("z < @b")]);
        assert_eq!(state.step_count(), 0);
    }
}
