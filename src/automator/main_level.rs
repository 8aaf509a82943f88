use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::automator::{Automator, Heartbeat, Restore, Simplify, Status};
use crate::error::ProverError;
use crate::proof_state::ProofState;
use crate::transformation::Transformation;

/// The state hashes on the current search branch, shared by every level of the branch.
pub type Visited = Rc<RefCell<HashSet<u64>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Apply,
    Simplify,
    Descend,
}

/// One level of the iterative-deepening search.
///
/// Each cycle applies the next application, simplifies, and then descends into a child
/// level with one less tether, after pushing a Restore that undoes it all once the child
/// is done. So every branch backtracks completely.
///
/// With cycle detection on, a child is never started on a state that is already on the
/// current branch.
pub struct MainProofLevel {
    tether: usize,
    global: Rc<Vec<Arc<Transformation>>>,
    cycle_detection: bool,
    visited: Visited,

    // The hash this level was entered with. It's removed from the visited set when the
    // level is exhausted, so sibling branches can visit it again.
    entry_hash: Option<u64>,

    // Computed on the first heartbeat, since local transformations depend on the state.
    candidates: Option<Vec<Arc<Transformation>>>,

    phase: Phase,
    transformation_index: usize,
    application_index: usize,
    checkpoint: usize,
}

impl MainProofLevel {
    pub fn new(
        tether: usize,
        global: Vec<Arc<Transformation>>,
        cycle_detection: bool,
    ) -> MainProofLevel {
        MainProofLevel::with_visited(
            tether,
            global,
            cycle_detection,
            Rc::new(RefCell::new(HashSet::new())),
        )
    }

    /// A root level that records visited states in a set the caller can inspect.
    pub fn with_visited(
        tether: usize,
        global: Vec<Arc<Transformation>>,
        cycle_detection: bool,
        visited: Visited,
    ) -> MainProofLevel {
        MainProofLevel::child(tether, Rc::new(global), cycle_detection, visited, None)
    }

    fn child(
        tether: usize,
        global: Rc<Vec<Arc<Transformation>>>,
        cycle_detection: bool,
        visited: Visited,
        entry_hash: Option<u64>,
    ) -> MainProofLevel {
        MainProofLevel {
            tether,
            global,
            cycle_detection,
            visited,
            entry_hash,
            candidates: None,
            phase: Phase::Apply,
            transformation_index: 0,
            application_index: 0,
            checkpoint: 0,
        }
    }

    pub fn tether(&self) -> usize {
        self.tether
    }

    // Local transformations that can't touch the antecedent, then the global ones.
    // With no tether left, only transformations that are sure to shrink the goal.
    fn find_candidates(&self, state: &ProofState) -> Vec<Arc<Transformation>> {
        state
            .local_transformations()
            .into_iter()
            .filter(|t| !t.could_affect_antecedent())
            .chain(self.global.iter().cloned())
            .filter(|t| self.tether > 0 || t.is_strictly_reducing())
            .collect()
    }

    // Applies the next untried application. Returns false when there are none left.
    fn apply_next(&mut self, state: &mut ProofState) -> Result<bool, ProverError> {
        while let Some(t) = self
            .candidates
            .as_ref()
            .and_then(|c| c.get(self.transformation_index))
            .cloned()
        {
            let next = t.applications(state).nth(self.application_index);
            let Some(application) = next else {
                self.transformation_index += 1;
                self.application_index = 0;
                continue;
            };
            self.application_index += 1;
            self.checkpoint = state.step_count();
            trace!(
                tether = self.tether,
                application = %application,
                "trying application"
            );
            application.apply(state)?;
            return Ok(true);
        }
        Ok(false)
    }
}

impl Automator for MainProofLevel {
    fn name(&self) -> String {
        format!("MainProofLevel({})", self.tether)
    }

    fn step(&mut self, beat: &mut Heartbeat) -> Result<Status, ProverError> {
        if self.candidates.is_none() {
            self.candidates = Some(self.find_candidates(beat.state));
            if self.cycle_detection && self.entry_hash.is_none() {
                let hash = beat.state.implication_hash();
                self.visited.borrow_mut().insert(hash);
                self.entry_hash = Some(hash);
            }
        }

        match self.phase {
            Phase::Apply => {
                if !self.apply_next(beat.state)? {
                    if let Some(hash) = self.entry_hash {
                        self.visited.borrow_mut().remove(&hash);
                    }
                    return Ok(Status::Pop);
                }
                self.phase = Phase::Simplify;
            }
            Phase::Simplify => {
                beat.push(Simplify::new());
                self.phase = Phase::Descend;
            }
            Phase::Descend => {
                beat.push(Restore::new(self.checkpoint));
                self.phase = Phase::Apply;
                if self.tether == 0 {
                    return Ok(Status::Continue);
                }
                let hash = beat.state.implication_hash();
                if self.cycle_detection && !self.visited.borrow_mut().insert(hash) {
                    trace!(tether = self.tether, hash, "cycle detected");
                    return Ok(Status::Continue);
                }
                beat.push(MainProofLevel::child(
                    self.tether - 1,
                    self.global.clone(),
                    self.cycle_detection,
                    self.visited.clone(),
                    self.cycle_detection.then_some(hash),
                ));
            }
        }
        Ok(Status::Continue)
    }
}
