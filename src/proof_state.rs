use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::binder::SiteScope;
use crate::conjunct::{Conjunct, ConjunctId, ConjunctKey, Justification, Role};
use crate::error::ProverError;
use crate::expression::Expression;
use crate::proof_step::{Change, ProofStep};
use crate::site::Site;
use crate::theorem::{compile_assertion, TheoremLibrary};
use crate::transformation::{Source, Transformation};

/// The mutable unit of work for one proof obligation.
///
/// All mutation goes through applications, which record a step for each change they make.
/// Undoing a step reverses exactly the changes it recorded.
pub struct ProofState {
    name: String,

    antecedents: Vec<Conjunct>,
    consequents: Vec<Conjunct>,

    // How many times each expression appears among the antecedents.
    local_theorems: HashMap<Expression, usize>,

    // Wrapping sums of the structure hashes, kept up to date as conjuncts change.
    antecedents_hash: u64,
    consequents_hash: u64,

    library: Arc<TheoremLibrary>,

    steps: Vec<ProofStep>,

    next_id: u32,
}

impl ProofState {
    /// Creates a state from an obligation. Conjunctions are split into separate conjuncts.
    pub fn new(
        name: &str,
        antecedents: Vec<Expression>,
        consequents: Vec<Expression>,
        library: Arc<TheoremLibrary>,
    ) -> ProofState {
        let mut state = ProofState {
            name: name.to_string(),
            antecedents: vec![],
            consequents: vec![],
            local_theorems: HashMap::new(),
            antecedents_hash: 0,
            consequents_hash: 0,
            library,
            steps: vec![],
            next_id: 0,
        };
        for (role, expressions) in [
            (Role::LocalTheorem, antecedents),
            (Role::Consequent, consequents),
        ] {
            for e in expressions {
                for part in e.split_into_conjuncts() {
                    let id = state.allocate_id();
                    state.insert_conjunct(None, Conjunct::new(id, role, part, Justification::Given));
                }
            }
        }
        state
    }

    /// Creates a state from expression text, panicking on bad input. For tests.
    #[cfg(test)]
    pub fn parse(
        antecedents: &[&str],
        consequents: &[&str],
        library: Arc<TheoremLibrary>,
    ) -> ProofState {
        ProofState::new(
            "test",
            antecedents.iter().map(|s| Expression::parse(s)).collect(),
            consequents.iter().map(|s| Expression::parse(s)).collect(),
            library,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn antecedents(&self) -> &[Conjunct] {
        &self.antecedents
    }

    pub fn consequents(&self) -> &[Conjunct] {
        &self.consequents
    }

    pub fn antecedent_expressions(&self) -> Vec<Expression> {
        self.antecedents.iter().map(|c| c.expression.clone()).collect()
    }

    pub fn consequent_expressions(&self) -> Vec<Expression> {
        self.consequents.iter().map(|c| c.expression.clone()).collect()
    }

    pub fn library(&self) -> &Arc<TheoremLibrary> {
        &self.library
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn last_step(&self) -> Option<&ProofStep> {
        self.steps.last()
    }

    /// The obligation is discharged when no consequents remain.
    pub fn is_proved(&self) -> bool {
        self.consequents.is_empty()
    }

    pub fn contains_local_theorem(&self, e: &Expression) -> bool {
        self.local_theorems.contains_key(e)
    }

    pub fn contains_consequent(&self, e: &Expression) -> bool {
        self.consequents.iter().any(|c| &c.expression == e)
    }

    /// A cheap hash of the current antecedents and consequents, independent of their order.
    /// Collisions are possible, so this is only good for pruning.
    pub fn implication_hash(&self) -> u64 {
        self.antecedents_hash
            .wrapping_add(self.consequents_hash.wrapping_mul(51))
    }

    fn list(&self, role: Role) -> &[Conjunct] {
        match role {
            Role::LocalTheorem => &self.antecedents,
            Role::Consequent => &self.consequents,
            Role::GlobalTheorem => self.library.conjuncts(),
        }
    }

    /// The index of a conjunct within its list.
    pub fn position(&self, role: Role, id: ConjunctId) -> Option<usize> {
        match role {
            Role::GlobalTheorem => {
                let index = id.0 as usize;
                if index < self.library.conjuncts().len() {
                    Some(index)
                } else {
                    None
                }
            }
            _ => self.list(role).iter().position(|c| c.id == id),
        }
    }

    pub fn conjunct(&self, key: ConjunctKey) -> Option<&Conjunct> {
        let (role, id) = key;
        let index = self.position(role, id)?;
        self.list(role).get(index)
    }

    /// Whether a site still describes the current state.
    pub fn is_valid_site(&self, site: &Site) -> bool {
        match self.conjunct(site.key()) {
            Some(conjunct) => {
                conjunct.expression == site.root
                    && site.root.at_path(&site.path) == Some(&site.expression)
            }
            None => false,
        }
    }

    /// Enumerates sites lazily, in conjunct order.
    pub fn sites(&self, scope: SiteScope) -> Box<dyn Iterator<Item = Site> + '_> {
        let antecedents = self.antecedents.iter().map(Site::top_level);
        let consequents = self.consequents.iter().map(Site::top_level);
        match scope {
            SiteScope::TopLevelAntecedents => Box::new(antecedents),
            SiteScope::TopLevelConsequents => Box::new(consequents),
            SiteScope::InductiveAntecedents => Box::new(antecedents.flat_map(Site::descendants)),
            SiteScope::InductiveConsequents => Box::new(consequents.flat_map(Site::descendants)),
            SiteScope::TopLevelAntecedentsAndConsequents => Box::new(antecedents.chain(consequents)),
            SiteScope::TopLevelAntecedentsAndTheorems => Box::new(
                antecedents.chain(self.library.conjuncts().iter().map(Site::top_level)),
            ),
        }
    }

    /// Transformations derived from the current antecedents.
    /// Each one skips its own antecedent when matching.
    pub fn local_transformations(&self) -> Vec<Arc<Transformation>> {
        self.antecedents
            .iter()
            .flat_map(|c| compile_assertion(&c.expression, Source::Antecedent(c.id)))
            .map(Arc::new)
            .collect()
    }

    pub(crate) fn allocate_id(&mut self) -> ConjunctId {
        let id = ConjunctId(self.next_id);
        self.next_id += 1;
        id
    }

    fn add_hash(&mut self, role: Role, e: &Expression) {
        match role {
            Role::LocalTheorem => {
                self.antecedents_hash = self.antecedents_hash.wrapping_add(e.structure_hash());
                *self.local_theorems.entry(e.clone()).or_insert(0) += 1;
            }
            Role::Consequent => {
                self.consequents_hash = self.consequents_hash.wrapping_add(e.structure_hash());
            }
            Role::GlobalTheorem => {}
        }
    }

    fn remove_hash(&mut self, role: Role, e: &Expression) {
        match role {
            Role::LocalTheorem => {
                self.antecedents_hash = self.antecedents_hash.wrapping_sub(e.structure_hash());
                if let Some(count) = self.local_theorems.get_mut(e) {
                    *count -= 1;
                    if *count == 0 {
                        self.local_theorems.remove(e);
                    }
                }
            }
            Role::Consequent => {
                self.consequents_hash = self.consequents_hash.wrapping_sub(e.structure_hash());
            }
            Role::GlobalTheorem => {}
        }
    }

    fn list_mut(&mut self, role: Role) -> Option<&mut Vec<Conjunct>> {
        match role {
            Role::LocalTheorem => Some(&mut self.antecedents),
            Role::Consequent => Some(&mut self.consequents),
            Role::GlobalTheorem => None,
        }
    }

    /// Inserts at the index, clamped to the list length, or at the end if there's no index.
    /// Global theorems can't be inserted; asking to is a no-op.
    pub(crate) fn insert_conjunct(&mut self, index: Option<usize>, conjunct: Conjunct) -> Change {
        let role = conjunct.role;
        self.add_hash(role, &conjunct.expression);
        let index = match self.list_mut(role) {
            Some(list) => {
                let index = index.unwrap_or(list.len()).min(list.len());
                list.insert(index, conjunct.clone());
                index
            }
            None => 0,
        };
        Change::Inserted { index, conjunct }
    }

    pub(crate) fn remove_conjunct(&mut self, key: ConjunctKey) -> Result<Change, ProverError> {
        let (role, id) = key;
        let step_index = self.steps.len();
        let index = match role {
            Role::GlobalTheorem => None,
            _ => self.position(role, id),
        };
        let (Some(index), Some(list)) = (index, self.list_mut(role)) else {
            return Err(ProverError::invariant(
                step_index,
                format!("cannot remove missing {} {}", role, id),
            ));
        };
        let conjunct = list.remove(index);
        self.remove_hash(role, &conjunct.expression);
        Ok(Change::Removed { index, conjunct })
    }

    pub(crate) fn alter_conjunct(
        &mut self,
        key: ConjunctKey,
        replacement: Expression,
    ) -> Result<Change, ProverError> {
        let (role, id) = key;
        let step_index = self.steps.len();
        let index = match role {
            Role::GlobalTheorem => None,
            _ => self.position(role, id),
        };
        let (Some(index), Some(list)) = (index, self.list_mut(role)) else {
            return Err(ProverError::invariant(
                step_index,
                format!("cannot alter missing {} {}", role, id),
            ));
        };
        let original =
            std::mem::replace(&mut list[index].expression, replacement.clone());
        self.remove_hash(role, &original);
        self.add_hash(role, &replacement);
        Ok(Change::Altered {
            role,
            id,
            original,
            replacement,
        })
    }

    pub(crate) fn push_step(&mut self, step: ProofStep) {
        trace!(step = %step, index = self.steps.len(), "recording step");
        self.steps.push(step);
    }

    /// Pops the last step and reverses its changes.
    pub fn undo_last_step(&mut self) -> Result<ProofStep, ProverError> {
        let Some(step) = self.steps.pop() else {
            return Err(ProverError::invariant(
                0,
                "undo requested with an empty step log",
            ));
        };
        for change in step.changes.iter().rev() {
            match change {
                Change::Inserted { conjunct, .. } => {
                    if conjunct.role != Role::GlobalTheorem {
                        self.remove_conjunct(conjunct.key())?;
                    }
                }
                Change::Removed { index, conjunct } => {
                    self.insert_conjunct(Some(*index), conjunct.clone());
                }
                Change::Altered {
                    role, id, original, ..
                } => {
                    self.alter_conjunct((*role, *id), original.clone())?;
                }
            }
        }
        trace!(step = %step, remaining = self.steps.len(), "undid step");
        Ok(step)
    }

    /// Undoes steps until only the first `checkpoint` remain.
    pub fn restore(&mut self, checkpoint: usize) -> Result<(), ProverError> {
        if checkpoint > self.steps.len() {
            return Err(ProverError::invariant(
                self.steps.len(),
                format!("cannot restore forward to step {}", checkpoint),
            ));
        }
        while self.steps.len() > checkpoint {
            self.undo_last_step()?;
        }
        Ok(())
    }

    /// Reproduces a step recorded on some other proof state, by trying each application of
    /// the same transformation until one makes the same changes.
    pub fn mimic(&mut self, step: &ProofStep) -> Result<(), ProverError> {
        let target = signature(step);
        let checkpoint = self.steps.len();
        let applications: Vec<_> = step.transformation.clone().applications(self).collect();
        for application in applications {
            application.apply(self)?;
            if let Some(last) = self.steps.last() {
                if signature(last) == target {
                    return Ok(());
                }
            }
            self.restore(checkpoint)?;
        }
        Err(ProverError::invariant(
            checkpoint,
            format!("could not mimic step: {}", step),
        ))
    }
}

// What a step did, ignoring conjunct ids.
fn signature(step: &ProofStep) -> Vec<(u8, Role, Expression)> {
    let mut answer = vec![];
    for change in &step.changes {
        match change {
            Change::Inserted { conjunct, .. } => {
                answer.push((0, conjunct.role, conjunct.expression.clone()))
            }
            Change::Removed { conjunct, .. } => {
                answer.push((1, conjunct.role, conjunct.expression.clone()))
            }
            Change::Altered {
                role,
                original,
                replacement,
                ..
            } => {
                answer.push((2, *role, original.clone()));
                answer.push((3, *role, replacement.clone()));
            }
        }
    }
    answer
}

impl fmt::Display for ProofState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, c) in self.antecedents.iter().enumerate() {
            if i > 0 {
                writeln!(f, " and")?;
            }
            write!(f, "{}", c)?;
        }
        if !self.antecedents.is_empty() {
            writeln!(f)?;
        }
        writeln!(f, "  -->")?;
        for (i, c) in self.consequents.iter().enumerate() {
            if i > 0 {
                writeln!(f, " and")?;
            }
            write!(f, "{}", c)?;
        }
        if self.consequents.is_empty() {
            write!(f, "true")?;
        }
        Ok(())
    }
}
