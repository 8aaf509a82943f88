use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::automator::{ApplyAll, Automator, Heartbeat, Status};
use crate::conjunct::Role;
use crate::error::ProverError;
use crate::theorem::TheoremLibrary;
use crate::transformation::Transformation;

// Runs ApplyAll for each transformation in turn, and starts over until a full round
// applies nothing. The transformations all shrink things, so this terminates.
struct Rounds {
    transformations: Vec<Arc<Transformation>>,
    next: usize,
    round: usize,
    tally: Rc<Cell<usize>>,
}

impl Rounds {
    fn new(transformations: Vec<Arc<Transformation>>) -> Rounds {
        Rounds {
            transformations,
            next: 0,
            round: 0,
            tally: Rc::new(Cell::new(0)),
        }
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Status {
        if let Some(t) = self.transformations.get(self.next) {
            beat.push(ApplyAll::with_tally(t.clone(), self.tally.clone()));
            self.next += 1;
            return Status::Continue;
        }
        let applied = self.tally.replace(0);
        trace!(round = self.round, applied, "finished minimizing round");
        if applied == 0 {
            return Status::Pop;
        }
        self.next = 0;
        self.round += 1;
        Status::Continue
    }
}

/// Shrinks the consequents with the library's strictly reducing rewrites.
pub struct Minimizer {
    rounds: Rounds,
}

impl Minimizer {
    pub fn new(library: &TheoremLibrary) -> Minimizer {
        Minimizer {
            rounds: Rounds::new(library.reducing_transformations(Role::Consequent)),
        }
    }
}

impl Automator for Minimizer {
    fn name(&self) -> String {
        format!("Minimizer(round {})", self.rounds.round)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        Ok(self.rounds.step(beat))
    }
}

/// Shrinks the antecedents with the library's strictly reducing rewrites.
pub struct AntecedentMinimizer {
    rounds: Rounds,
}

impl AntecedentMinimizer {
    pub fn new(library: &TheoremLibrary) -> AntecedentMinimizer {
        AntecedentMinimizer {
            rounds: Rounds::new(library.reducing_transformations(Role::LocalTheorem)),
        }
    }
}

impl Automator for AntecedentMinimizer {
    fn name(&self) -> String {
        format!("AntecedentMinimizer(round {})", self.rounds.round)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        Ok(self.rounds.step(beat))
    }
}
