// Automators are resumable units of search strategy.
// They sit on a stack, and on each heartbeat the top one does one thing.

use std::sync::Arc;

use crate::error::ProverError;
use crate::proof_state::ProofState;
use crate::transformation::Transformation;

mod apply;
mod developer;
mod eliminate;
mod existential;
mod main_level;
mod minimizer;
mod propagator;
mod restore;
mod sequence;
mod simplify;

pub use apply::{ApplyAll, ApplyN, ProbationaryApplication};
pub use developer::AntecedentDeveloper;
pub use eliminate::{EliminateObviousAntecedents, EliminateRedundantAntecedents};
pub use existential::ExistentialInstantiation;
pub use main_level::{MainProofLevel, Visited};
pub use minimizer::{AntecedentMinimizer, Minimizer};
pub use propagator::VariablePropagator;
pub use restore::Restore;
pub use sequence::PushSequence;
pub use simplify::Simplify;

/// What an automator wants after its heartbeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Keep this automator on the stack.
    Continue,

    /// Remove this automator from the stack.
    Pop,
}

/// The context for one heartbeat of one automator.
pub struct Heartbeat<'a> {
    pub state: &'a mut ProofState,
    pushed: Vec<Box<dyn Automator>>,
}

impl<'a> Heartbeat<'a> {
    pub fn new(state: &'a mut ProofState) -> Heartbeat<'a> {
        Heartbeat {
            state,
            pushed: vec![],
        }
    }

    /// Pushes an automator above the current one.
    /// When several are pushed in one heartbeat, the last one pushed runs first.
    pub fn push<A: Automator + 'static>(&mut self, automator: A) {
        self.pushed.push(Box::new(automator));
    }

    pub fn push_boxed(&mut self, automator: Box<dyn Automator>) {
        self.pushed.push(automator);
    }

    pub fn into_pushed(self) -> Vec<Box<dyn Automator>> {
        self.pushed
    }
}

/// A search strategy.
///
/// An automator keeps all of its progress in its own fields, since control goes back to the
/// scheduler after every heartbeat. On each heartbeat it does exactly one of: push other
/// automators, apply one application, undo some steps, or pop itself.
/// An automator that does nothing observable must not keep doing so forever.
pub trait Automator {
    fn name(&self) -> String;

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError>;
}

/// Applies the first application of a transformation, if there is one.
/// Returns whether anything was applied.
pub(crate) fn apply_first(
    transformation: &Arc<Transformation>,
    state: &mut ProofState,
) -> Result<bool, ProverError> {
    let Some(application) = transformation.clone().applications(state).next() else {
        return Ok(false);
    };
    application.apply(state)?;
    Ok(true)
}
