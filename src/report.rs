use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::conjunct::ConjunctKey;
use crate::proof_state::ProofState;
use crate::prover::Outcome;
use crate::transformation::Equivalence;

#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub description: String,
    pub equivalence: Equivalence,
}

/// What is left of the goal when the search stopped.
#[derive(Clone, Debug, Serialize)]
pub struct Remaining {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
}

/// The result of searching for one obligation, in a form that can be printed or serialized.
#[derive(Clone, Debug, Serialize)]
pub struct ProofReport {
    pub name: String,
    pub outcome: Outcome,
    pub heartbeats: u64,
    pub applications: usize,

    /// The step log as it was when the search stopped.
    pub steps: Vec<StepReport>,

    /// Indices into steps of the ones that contributed to the result.
    pub productive_steps: Vec<usize>,

    pub remaining: Remaining,
}

impl ProofReport {
    pub fn new(
        state: &ProofState,
        outcome: Outcome,
        heartbeats: u64,
        applications: usize,
    ) -> ProofReport {
        let steps = state
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| StepReport {
                index,
                description: step.description.clone(),
                equivalence: step.transformation.equivalence(),
            })
            .collect();
        ProofReport {
            name: state.name().to_string(),
            outcome,
            heartbeats,
            applications,
            steps,
            productive_steps: ProofReport::productive_steps(state),
            remaining: Remaining {
                antecedents: state
                    .antecedent_expressions()
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
                consequents: state
                    .consequent_expressions()
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
            },
        }
    }

    /// The indices of the steps that contributed to the current state of the goal.
    ///
    /// Walks the log backwards, keeping a step if it worked on a consequent, or if it produced
    /// something a later kept step needed. Label steps are always kept.
    pub fn productive_steps(state: &ProofState) -> Vec<usize> {
        let mut needed: HashSet<ConjunctKey> =
            state.consequents().iter().map(|c| c.key()).collect();
        let mut answer = vec![];
        for (i, step) in state.steps().iter().enumerate().rev() {
            let productive = step.is_label()
                || step.touches_consequent()
                || step.affected.iter().any(|(key, _)| needed.contains(key));
            if !productive {
                continue;
            }
            answer.push(i);
            for (key, _) in &step.affected {
                needed.remove(key);
            }
            needed.extend(step.prerequisites.iter().cloned());
        }
        answer.reverse();
        answer
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("could not serialize report: {}", e))
    }
}

impl fmt::Display for ProofReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{}: {} ({} heartbeats, {} applications)",
            self.name, self.outcome, self.heartbeats, self.applications
        )?;
        for i in &self.productive_steps {
            if let Some(step) = self.steps.get(*i) {
                writeln!(f, "  {}. {}", step.index + 1, step.description)?;
            }
        }
        if self.remaining.consequents.is_empty() {
            return Ok(());
        }
        writeln!(f, "  remaining goal:")?;
        for a in &self.remaining.antecedents {
            writeln!(f, "    {}", a)?;
        }
        writeln!(f, "      -->")?;
        for c in &self.remaining.consequents {
            writeln!(f, "    {}", c)?;
        }
        Ok(())
    }
}
