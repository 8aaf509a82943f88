use std::fmt;

use serde::Serialize;

use crate::expression::Expression;

/// Identifies a conjunct.
/// Antecedents and consequents draw ids from their proof state. Global theorems use
/// their index in the theorem library, so the id only means something together with a role.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ConjunctId(pub u32);

impl fmt::Display for ConjunctId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Role {
    /// A given, retractable fact. An antecedent.
    LocalTheorem,

    /// Part of the goal.
    Consequent,

    /// A fact from the theorem library. Never modified.
    GlobalTheorem,
}

impl Role {
    pub fn is_antecedent(self) -> bool {
        self == Role::LocalTheorem
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::LocalTheorem => write!(f, "antecedent"),
            Role::Consequent => write!(f, "consequent"),
            Role::GlobalTheorem => write!(f, "theorem"),
        }
    }
}

/// A conjunct identified together with its role.
pub type ConjunctKey = (Role, ConjunctId);

/// Why a conjunct is in the proof state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Justification {
    /// It was part of the obligation as given.
    Given,

    /// It was produced by a transformation with this description.
    Derived(String),

    /// A global theorem, by name.
    Theorem(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conjunct {
    pub id: ConjunctId,
    pub role: Role,
    pub expression: Expression,
    pub justification: Justification,
}

impl Conjunct {
    pub fn new(
        id: ConjunctId,
        role: Role,
        expression: Expression,
        justification: Justification,
    ) -> Conjunct {
        Conjunct {
            id,
            role,
            expression,
            justification,
        }
    }

    pub fn key(&self) -> ConjunctKey {
        (self.role, self.id)
    }
}

impl fmt::Display for Conjunct {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}
