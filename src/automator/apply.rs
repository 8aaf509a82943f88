use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use crate::application::Application;
use crate::automator::{Automator, Heartbeat, Status};
use crate::error::ProverError;
use crate::proof_state::ProofState;
use crate::proof_step::ProofStep;
use crate::transformation::Transformation;

// Applies the first application not already applied. Returns whether there was one.
fn apply_next(
    transformation: &Arc<Transformation>,
    applied: &mut HashSet<u64>,
    state: &mut ProofState,
) -> Result<bool, ProverError> {
    let next = transformation
        .clone()
        .applications(state)
        .find(|a| !applied.contains(&a.key()));
    match next {
        Some(application) => {
            applied.insert(application.key());
            application.apply(state)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Applies every application of a transformation, one per heartbeat.
/// The applications are found again on every heartbeat, since each one changes the state.
pub struct ApplyAll {
    transformation: Arc<Transformation>,
    applied: HashSet<u64>,
    count: usize,

    // Shared with whoever wants to know whether this was productive.
    tally: Option<Rc<Cell<usize>>>,
}

impl ApplyAll {
    pub fn new(transformation: Arc<Transformation>) -> ApplyAll {
        ApplyAll {
            transformation,
            applied: HashSet::new(),
            count: 0,
            tally: None,
        }
    }

    /// Adds each application to a counter owned by the caller.
    pub fn with_tally(transformation: Arc<Transformation>, tally: Rc<Cell<usize>>) -> ApplyAll {
        ApplyAll {
            tally: Some(tally),
            ..ApplyAll::new(transformation)
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Automator for ApplyAll {
    fn name(&self) -> String {
        format!("ApplyAll({})", self.transformation)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        if !apply_next(&self.transformation, &mut self.applied, beat.state)? {
            return Ok(Status::Pop);
        }
        self.count += 1;
        if let Some(tally) = &self.tally {
            tally.set(tally.get() + 1);
        }
        Ok(Status::Continue)
    }
}

/// Applies at most n applications of a transformation, one per heartbeat.
pub struct ApplyN {
    transformation: Arc<Transformation>,
    applied: HashSet<u64>,
    remaining: usize,
}

impl ApplyN {
    pub fn new(transformation: Arc<Transformation>, n: usize) -> ApplyN {
        ApplyN {
            transformation,
            applied: HashSet::new(),
            remaining: n,
        }
    }
}

impl Automator for ApplyN {
    fn name(&self) -> String {
        format!("ApplyN({}, {})", self.transformation, self.remaining)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        if self.remaining == 0 {
            return Ok(Status::Pop);
        }
        if !apply_next(&self.transformation, &mut self.applied, beat.state)? {
            return Ok(Status::Pop);
        }
        self.remaining -= 1;
        Ok(Status::Continue)
    }
}

/// Decides whether a speculative step should stay.
pub type Predicate = Box<dyn Fn(&ProofState, &ProofStep) -> bool>;

/// Applies an application, then on the next heartbeat keeps it only if the predicate
/// accepts the step it made.
pub struct ProbationaryApplication {
    application: Application,
    predicate: Predicate,

    // The step count before applying. None until the application is applied.
    checkpoint: Option<usize>,
}

impl ProbationaryApplication {
    pub fn new(application: Application, predicate: Predicate) -> ProbationaryApplication {
        ProbationaryApplication {
            application,
            predicate,
            checkpoint: None,
        }
    }
}

impl Automator for ProbationaryApplication {
    fn name(&self) -> String {
        format!("ProbationaryApplication({})", self.application)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        let Some(checkpoint) = self.checkpoint else {
            self.checkpoint = Some(beat.state.step_count());
            self.application.apply(beat.state)?;
            return Ok(Status::Continue);
        };
        let keep = match beat.state.last_step() {
            Some(step) => (self.predicate)(&*beat.state, step),
            None => false,
        };
        if !keep {
            beat.state.restore(checkpoint)?;
        }
        Ok(Status::Pop)
    }
}
