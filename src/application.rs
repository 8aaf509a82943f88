use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::bindings::Bindings;
use crate::conjunct::{Conjunct, ConjunctKey, Justification, Role};
use crate::error::ProverError;
use crate::expression::Expression;
use crate::proof_state::ProofState;
use crate::proof_step::ProofStep;
use crate::site::Site;
use crate::transformation::{Equivalence, Transformation};

/// Where an inserted conjunct goes in its list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    /// An index into the list as it is after this application's removals and the
    /// insertions planned before this one.
    At(usize),
    End,
}

#[derive(Clone, Debug)]
struct Insertion {
    role: Role,
    position: Position,
    expression: Expression,
}

/// A transformation bound to specific sites of one proof state.
///
/// Applying it is the only way a proof state changes, and it records exactly one step.
/// The sites are checked again when applying, so an application found before some other
/// change can't be applied to the wrong thing.
#[derive(Clone, Debug)]
pub struct Application {
    transformation: Arc<Transformation>,
    sites: Vec<Site>,
    bindings: Bindings,

    removals: Vec<ConjunctKey>,
    alterations: Vec<(ConjunctKey, Expression)>,
    insertions: Vec<Insertion>,
}

impl Application {
    pub fn new(
        transformation: Arc<Transformation>,
        sites: Vec<Site>,
        bindings: Bindings,
    ) -> Application {
        Application {
            transformation,
            sites,
            bindings,
            removals: vec![],
            alterations: vec![],
            insertions: vec![],
        }
    }

    pub fn remove(&mut self, key: ConjunctKey) {
        self.removals.push(key);
    }

    pub fn alter(&mut self, key: ConjunctKey, replacement: Expression) {
        self.alterations.push((key, replacement));
    }

    pub fn insert(&mut self, role: Role, position: Position, expression: Expression) {
        self.insertions.push(Insertion {
            role,
            position,
            expression,
        });
    }

    /// Where a conjunct this application removes stood, as an insertion index.
    /// Counts the removals before it in the same list and the insertions already planned,
    /// so conjuncts must be replaced in list order.
    pub(crate) fn former_position(&self, state: &ProofState, key: ConjunctKey) -> Option<usize> {
        let (role, id) = key;
        let index = state.position(role, id)?;
        let removed_before = self
            .removals
            .iter()
            .filter(|(r, i)| *r == role && state.position(*r, *i).map_or(false, |p| p < index))
            .count();
        let inserted_before = self
            .insertions
            .iter()
            .filter(|insertion| insertion.role == role && matches!(insertion.position, Position::At(_)))
            .count();
        Some(index - removed_before + inserted_before)
    }

    pub fn transformation(&self) -> &Arc<Transformation> {
        &self.transformation
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Identifies this application among the applications of its transformation.
    pub fn key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for site in &self.sites {
            site.key().hash(&mut hasher);
            site.path.hash(&mut hasher);
            hasher.write_u64(site.root.structure_hash());
        }
        hasher.write_u64(self.bindings.structure_hash());
        for key in &self.removals {
            key.hash(&mut hasher);
        }
        for (key, e) in &self.alterations {
            key.hash(&mut hasher);
            hasher.write_u64(e.structure_hash());
        }
        for insertion in &self.insertions {
            insertion.role.hash(&mut hasher);
            insertion.position.hash(&mut hasher);
            hasher.write_u64(insertion.expression.structure_hash());
        }
        hasher.finish()
    }

    pub fn description(&self) -> String {
        let mut answer = self.transformation.to_string();
        if let Some(site) = self.sites.first() {
            answer.push_str(&format!(" on {}", site.expression));
        }
        if !self.bindings.is_empty() {
            answer.push_str(&format!(" with {}", self.bindings));
        }
        answer
    }

    /// Checks the planned changes against what the transformation's equivalence allows.
    fn check_soundness(&self, step_index: usize) -> Result<(), ProverError> {
        let forbidden = match self.transformation.equivalence() {
            Equivalence::Equivalent => None,
            Equivalence::Weaker => {
                if self.removals.iter().any(|(role, _)| role.is_antecedent()) {
                    Some("a weaker transformation cannot remove an antecedent")
                } else if !self.alterations.is_empty() {
                    Some("a weaker transformation cannot rewrite a conjunct")
                } else if self.insertions.iter().any(|i| i.role == Role::Consequent) {
                    Some("a weaker transformation cannot add a consequent")
                } else {
                    None
                }
            }
            Equivalence::Stronger => {
                if self.insertions.iter().any(|i| i.role.is_antecedent()) {
                    Some("a stronger transformation cannot add an antecedent")
                } else if self.alterations.iter().any(|((role, _), _)| role.is_antecedent()) {
                    Some("a stronger transformation cannot rewrite an antecedent")
                } else {
                    None
                }
            }
        };
        match forbidden {
            Some(message) => Err(ProverError::invariant(
                step_index,
                format!("{}: {}", message, self.description()),
            )),
            None => Ok(()),
        }
    }

    /// Applies the planned changes and records them as one step.
    /// Fails without changing anything if the state has moved on since the sites were found.
    pub fn apply(&self, state: &mut ProofState) -> Result<(), ProverError> {
        let step_index = state.step_count();
        for site in &self.sites {
            if !state.is_valid_site(site) {
                return Err(ProverError::invariant(
                    step_index,
                    format!("stale site {} for {}", site, self.transformation),
                ));
            }
        }
        for key in self
            .removals
            .iter()
            .chain(self.alterations.iter().map(|(key, _)| key))
        {
            if key.0 == Role::GlobalTheorem || state.conjunct(*key).is_none() {
                return Err(ProverError::invariant(
                    step_index,
                    format!("{} {} cannot be changed", key.0, key.1),
                ));
            }
        }
        self.check_soundness(step_index)?;

        let description = self.description();
        let mut changes = vec![];
        let mut prerequisites: Vec<ConjunctKey> = vec![];
        let mut affected = vec![];
        for key in self.sites.iter().map(|s| s.key()).chain(self.removals.iter().cloned()) {
            if !prerequisites.contains(&key) {
                prerequisites.push(key);
            }
        }

        for key in &self.removals {
            changes.push(state.remove_conjunct(*key)?);
        }
        for (key, replacement) in &self.alterations {
            changes.push(state.alter_conjunct(*key, replacement.clone())?);
            if !prerequisites.contains(key) {
                prerequisites.push(*key);
            }
            affected.push((*key, replacement.clone()));
        }
        for insertion in &self.insertions {
            let id = state.allocate_id();
            let conjunct = Conjunct::new(
                id,
                insertion.role,
                insertion.expression.clone(),
                Justification::Derived(description.clone()),
            );
            let index = match insertion.position {
                Position::At(i) => Some(i),
                Position::End => None,
            };
            changes.push(state.insert_conjunct(index, conjunct));
            affected.push(((insertion.role, id), insertion.expression.clone()));
        }

        state.push_step(ProofStep {
            transformation: self.transformation.clone(),
            description,
            changes,
            prerequisites,
            affected,
        });
        Ok(())
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theorem::TheoremLibrary;
    use crate::transformation::{Source, TransformationKind};

    fn state(antecedents: &[&str], consequents: &[&str]) -> ProofState {
        ProofState::parse(antecedents, consequents, Arc::new(TheoremLibrary::empty()))
    }

    fn transformation(kind: TransformationKind) -> Arc<Transformation> {
        Arc::new(Transformation::new(kind, Source::Theorem("t".to_string())))
    }

    #[test]
    fn test_undo_is_an_inverse() {
        let t = transformation(TransformationKind::SubstituteInPlaceInConsequent {
            pattern: Expression::parse("q(?x)"),
            template: Expression::parse("s(?x) and t(?x)"),
        });
        let mut state = state(&["a"], &["p", "q(a)", "r"]);
        let before_antecedents = state.antecedent_expressions();
        let before_consequents = state.consequent_expressions();
        let before_hash = state.implication_hash();

        let applications: Vec<_> = t.clone().applications(&state).collect();
        assert_eq!(applications.len(), 1);
        applications[0].apply(&mut state).unwrap();
        assert_eq!(state.step_count(), 1);
        assert_eq!(state.consequents().len(), 4);

        state.undo_last_step().unwrap();
        assert_eq!(state.antecedent_expressions(), before_antecedents);
        assert_eq!(state.consequent_expressions(), before_consequents);
        assert_eq!(state.implication_hash(), before_hash);
        assert_eq!(state.step_count(), 0);
    }

    #[test]
    fn test_stale_application_is_rejected() {
        let t = transformation(TransformationKind::SubstituteInPlaceInConsequent {
            pattern: Expression::parse("?x + 0"),
            template: Expression::parse("?x"),
        });
        let mut state = state(&[], &["f(a + 0, b + 0)"]);
        let applications: Vec<_> = t.clone().applications(&state).collect();
        assert_eq!(applications.len(), 2);
        applications[0].apply(&mut state).unwrap();
        let error = applications[1].apply(&mut state).unwrap_err();
        assert!(error.message().contains("stale"));

        // Nothing changed when the stale application was rejected.
        assert_eq!(state.step_count(), 1);
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("f(a, b + 0)")]);
    }

    #[test]
    fn test_weaker_cannot_remove_antecedents() {
        let t = transformation(TransformationKind::ExpandAntecedentByImplication {
            antecedents: vec![Expression::parse("p(?x)")],
            consequent: Expression::parse("q(?x)"),
        });
        let mut state = state(&["p(a)"], &["q(a)"]);
        let site = Site::top_level(&state.antecedents()[0]);
        let mut application = Application::new(t, vec![site.clone()], Bindings::new());
        application.remove(site.key());
        assert!(application.apply(&mut state).is_err());
        assert_eq!(state.antecedents().len(), 1);
        assert_eq!(state.step_count(), 0);
    }

    #[test]
    fn test_stronger_cannot_add_antecedents() {
        let t = transformation(TransformationKind::StrengthenConsequent {
            antecedents: vec![Expression::parse("p(?x)")],
            consequents: vec![Expression::parse("q(?x)")],
        });
        let mut state = state(&[], &["q(a)"]);
        let mut application = Application::new(t, vec![], Bindings::new());
        application.insert(Role::LocalTheorem, Position::End, Expression::parse("q(a)"));
        assert!(application.apply(&mut state).is_err());
        assert!(state.antecedents().is_empty());
    }

    #[test]
    fn test_steps_record_prerequisites_and_effects() {
        let t = transformation(TransformationKind::ExpandAntecedentByImplication {
            antecedents: vec![Expression::parse("p(?x)")],
            consequent: Expression::parse("q(?x)"),
        });
        let mut state = state(&["p(a)"], &["r"]);
        let antecedent = state.antecedents()[0].key();
        let application = t.clone().applications(&state).next().unwrap();
        application.apply(&mut state).unwrap();
        let step = state.last_step().unwrap();
        assert_eq!(step.prerequisites, vec![antecedent]);
        assert_eq!(step.affected.len(), 1);
        assert_eq!(step.affected[0].1, Expression::parse("q(a)"));
    }
}
