use std::sync::Arc;

use crate::automator::{apply_first, Automator, Heartbeat, Status};
use crate::error::ProverError;
use crate::transformation::{Transformation, TransformationKind};

/// Eliminates variables defined by antecedent equations, one equation per heartbeat.
pub struct VariablePropagator {
    rule: Arc<Transformation>,
}

impl VariablePropagator {
    pub fn new() -> VariablePropagator {
        VariablePropagator {
            rule: Arc::new(Transformation::builtin(
                TransformationKind::PropagateVariable,
            )),
        }
    }
}

impl Default for VariablePropagator {
    fn default() -> VariablePropagator {
        VariablePropagator::new()
    }
}

impl Automator for VariablePropagator {
    fn name(&self) -> String {
        "VariablePropagator".to_string()
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        if apply_first(&self.rule, beat.state)? {
            Ok(Status::Continue)
        } else {
            Ok(Status::Pop)
        }
    }
}
