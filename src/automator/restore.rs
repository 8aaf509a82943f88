use crate::automator::{Automator, Heartbeat, Status};
use crate::error::ProverError;

/// Undoes steps until the step log is back to the length it had when this was created.
pub struct Restore {
    checkpoint: usize,
}

impl Restore {
    pub fn new(checkpoint: usize) -> Restore {
        Restore { checkpoint }
    }
}

impl Automator for Restore {
    fn name(&self) -> String {
        format!("Restore({})", self.checkpoint)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        beat.state.restore(self.checkpoint)?;
        Ok(Status::Pop)
    }
}
