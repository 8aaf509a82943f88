use std::fmt;
use std::sync::Arc;

use crate::conjunct::{Conjunct, ConjunctId, ConjunctKey, Role};
use crate::expression::Expression;
use crate::transformation::Transformation;

/// A primitive, reversible mutation of a proof state.
#[derive(Clone, Debug)]
pub enum Change {
    /// A conjunct was inserted at this index of its list.
    Inserted { index: usize, conjunct: Conjunct },

    /// A conjunct was removed from this index of its list.
    Removed { index: usize, conjunct: Conjunct },

    /// A conjunct's expression was replaced in place.
    Altered {
        role: Role,
        id: ConjunctId,
        original: Expression,
        replacement: Expression,
    },
}

/// One entry in the step log.
/// A step records everything needed to undo it, and what it used and produced.
#[derive(Clone, Debug)]
pub struct ProofStep {
    pub transformation: Arc<Transformation>,
    pub description: String,
    pub changes: Vec<Change>,

    /// Conjuncts the step depended on: the matched sites, plus anything it removed or altered.
    pub prerequisites: Vec<ConjunctKey>,

    /// Conjuncts the step created or rewrote, with their expressions after the step.
    pub affected: Vec<(ConjunctKey, Expression)>,
}

impl ProofStep {
    /// Label steps mark a phase of the search. They change nothing.
    pub fn is_label(&self) -> bool {
        self.transformation.is_label()
    }

    pub fn touches_consequent(&self) -> bool {
        self.prerequisites
            .iter()
            .any(|(role, _)| *role == Role::Consequent)
    }
}

impl fmt::Display for ProofStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}
