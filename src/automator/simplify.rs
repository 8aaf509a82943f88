use std::sync::Arc;

use crate::automator::{apply_first, Automator, Heartbeat, Status};
use crate::error::ProverError;
use crate::transformation::{Transformation, TransformationKind};

/// Cleans up the goal, one change per heartbeat, until nothing changes.
///
/// In priority order: a consequent identical to an antecedent becomes true, a symmetric
/// equality in the consequent becomes true, and true conjuncts are deleted.
pub struct Simplify {
    rules: Vec<Arc<Transformation>>,
}

impl Simplify {
    pub fn new() -> Simplify {
        let rules = [
            TransformationKind::ConsequentMatchesAntecedent,
            TransformationKind::SymmetricEquality,
            TransformationKind::EliminateTrueConjunct,
        ];
        Simplify {
            rules: rules
                .into_iter()
                .map(|kind| Arc::new(Transformation::builtin(kind)))
                .collect(),
        }
    }
}

impl Default for Simplify {
    fn default() -> Simplify {
        Simplify::new()
    }
}

impl Automator for Simplify {
    fn name(&self) -> String {
        "Simplify".to_string()
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        for rule in &self.rules {
            if apply_first(rule, beat.state)? {
                return Ok(Status::Continue);
            }
        }
        Ok(Status::Pop)
    }
}
