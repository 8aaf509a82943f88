use std::collections::VecDeque;

use crate::automator::{Automator, Heartbeat, Status};
use crate::error::ProverError;

/// Runs a list of automators in order, pushing the next one each time it resumes.
pub struct PushSequence {
    pending: VecDeque<Box<dyn Automator>>,
}

impl PushSequence {
    pub fn new(automators: Vec<Box<dyn Automator>>) -> PushSequence {
        PushSequence {
            pending: automators.into(),
        }
    }
}

impl Automator for PushSequence {
    fn name(&self) -> String {
        format!("PushSequence({} pending)", self.pending.len())
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        match self.pending.pop_front() {
            Some(next) => {
                beat.push_boxed(next);
                Ok(Status::Continue)
            }
            None => Ok(Status::Pop),
        }
    }
}
