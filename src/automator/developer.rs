use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use crate::automator::{ApplyN, Automator, Heartbeat, Status};
use crate::error::ProverError;
use crate::proof_state::ProofState;
use crate::transformation::Transformation;

/// How many times a single expansion may fire in one round.
pub const MAX_EXPANSIONS_PER_ROUND: usize = 8;

/// Adds consequences of the givens to the antecedent, for a fixed number of rounds.
///
/// Each round queues the library's expansions along with expansions derived from the
/// antecedents as they are when the round starts. Only expansions that add no new
/// variables are used, and each may fire a limited number of times per round.
pub struct AntecedentDeveloper {
    rounds: usize,
    round: usize,
    queue: VecDeque<Arc<Transformation>>,
    started: bool,
}

impl AntecedentDeveloper {
    pub fn new(rounds: usize) -> AntecedentDeveloper {
        AntecedentDeveloper {
            rounds,
            round: 0,
            queue: VecDeque::new(),
            started: false,
        }
    }

    fn expansions(state: &ProofState) -> VecDeque<Arc<Transformation>> {
        let local = state
            .local_transformations()
            .into_iter()
            .filter(|t| t.is_antecedent_expansion() && !t.introduces_quantified_variables());
        state
            .library()
            .expansion_transformations()
            .into_iter()
            .chain(local)
            .collect()
    }
}

impl Automator for AntecedentDeveloper {
    fn name(&self) -> String {
        format!("AntecedentDeveloper({}/{})", self.round, self.rounds)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        loop {
            if let Some(t) = self.queue.pop_front() {
                beat.push(ApplyN::new(t, MAX_EXPANSIONS_PER_ROUND));
                return Ok(Status::Continue);
            }
            if self.started {
                self.round += 1;
            }
            if self.round >= self.rounds {
                return Ok(Status::Pop);
            }
            self.started = true;
            self.queue = AntecedentDeveloper::expansions(beat.state);
            trace!(
                round = self.round,
                expansions = self.queue.len(),
                "developing antecedent"
            );
            if self.queue.is_empty() {
                return Ok(Status::Pop);
            }
        }
    }
}
