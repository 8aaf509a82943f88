use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::automator::{
    AntecedentDeveloper, AntecedentMinimizer, ApplyN, Automator, EliminateObviousAntecedents,
    EliminateRedundantAntecedents, Heartbeat, MainProofLevel, Minimizer, PushSequence, Simplify,
    Status, VariablePropagator,
};
use crate::error::ProverError;
use crate::proof_state::ProofState;
use crate::report::ProofReport;
use crate::theorem::rank_by_fitness;
use crate::transformation::{Transformation, TransformationKind};

/// Mode controlling proof search behavior
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProverMode {
    /// About as long as a human is willing to wait for a proof.
    /// The timeout_secs parameter controls how long to search before giving up.
    Interactive { timeout_secs: f32 },

    /// A fast search with a shallow tether, for testing.
    Test,
}

impl ProverMode {
    pub fn config(&self) -> ProverConfig {
        match self {
            ProverMode::Interactive { timeout_secs } => ProverConfig {
                timeout_secs: Some(*timeout_secs),
                ..ProverConfig::default()
            },
            ProverMode::Test => ProverConfig {
                max_tether: 2,
                max_heartbeats: Some(100_000),
                ..ProverConfig::default()
            },
        }
    }
}

/// The budgets and switches for one search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// How deep the main search may recurse.
    pub max_tether: usize,

    pub max_heartbeats: Option<u64>,
    pub max_applications: Option<usize>,
    pub timeout_secs: Option<f32>,

    /// Whether the main search skips states already on the current branch.
    pub cycle_detection: bool,

    /// How many rounds of antecedent development run before the main search.
    pub developer_rounds: usize,

    /// Whether to shrink the antecedents and consequents before the main search.
    pub minimize: bool,
}

impl Default for ProverConfig {
    fn default() -> ProverConfig {
        ProverConfig {
            max_tether: 3,
            max_heartbeats: None,
            max_applications: None,
            timeout_secs: None,
            cycle_detection: true,
            developer_rounds: 3,
            minimize: true,
        }
    }
}

/// The outcome of a proof search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Every consequent was discharged.
    Proved,

    /// The automator stack emptied without a proof.
    Exhausted,

    /// A cancellation token was canceled.
    Interrupted,

    /// The wall clock ran out.
    Timeout,

    /// The heartbeat or application budget ran out.
    Constrained,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Proved => write!(f, "Proved"),
            Outcome::Exhausted => write!(f, "Exhausted"),
            Outcome::Interrupted => write!(f, "Interrupted"),
            Outcome::Timeout => write!(f, "Timeout"),
            Outcome::Constrained => write!(f, "Constrained"),
        }
    }
}

/// Runs a stack of automators against one proof state.
///
/// Each heartbeat hands the proof state to the automator on top of the stack. Whatever it
/// pushes goes above it, so the last thing pushed runs next.
pub struct Prover {
    state: ProofState,
    stack: Vec<Box<dyn Automator>>,
    config: ProverConfig,

    /// If any one of these tokens is canceled, the search stops with Outcome::Interrupted.
    cancellation_tokens: Vec<CancellationToken>,

    heartbeats: u64,

    /// Steps recorded by this prover, counting the ones later undone.
    applications: usize,

    started: Option<Instant>,
}

// A label step marks a phase of the pipeline in the step log.
fn label(text: &str) -> Box<dyn Automator> {
    Box::new(ApplyN::new(Arc::new(Transformation::label(text)), 1))
}

impl Prover {
    /// A prover running the default pipeline: clean up and develop the antecedent, shrink
    /// the consequent, and then search.
    pub fn new(
        state: ProofState,
        config: ProverConfig,
        tokens: Vec<CancellationToken>,
    ) -> Prover {
        let library = state.library().clone();
        let mut pipeline: Vec<Box<dyn Automator>> = vec![
            Box::new(VariablePropagator::new()),
            Box::new(EliminateObviousAntecedents::new()),
            Box::new(EliminateRedundantAntecedents::new()),
        ];
        if config.minimize {
            pipeline.push(Box::new(AntecedentMinimizer::new(&library)));
        }
        for _ in 0..config.developer_rounds {
            pipeline.push(Box::new(AntecedentDeveloper::new(1)));
            pipeline.push(Box::new(VariablePropagator::new()));
        }
        pipeline.push(label("Done Developing Antecedent"));
        if config.minimize {
            pipeline.push(Box::new(Minimizer::new(&library)));
            pipeline.push(label("Done Minimizing Consequent"));
        }
        pipeline.push(Box::new(Simplify::new()));

        let mut global = library.search_transformations();
        global.push(Arc::new(Transformation::builtin(
            TransformationKind::ExistentialInstantiation,
        )));
        rank_by_fitness(&mut global);
        pipeline.push(Box::new(MainProofLevel::new(
            config.max_tether,
            global,
            config.cycle_detection,
        )));

        Prover::with_automators(state, pipeline, config, tokens)
    }

    /// A prover that runs the given automators, the first one first.
    pub fn with_automators(
        state: ProofState,
        automators: Vec<Box<dyn Automator>>,
        config: ProverConfig,
        tokens: Vec<CancellationToken>,
    ) -> Prover {
        Prover {
            state,
            stack: vec![Box::new(PushSequence::new(automators))],
            config,
            cancellation_tokens: tokens,
            heartbeats: 0,
            applications: 0,
            started: None,
        }
    }

    pub fn state(&self) -> &ProofState {
        &self.state
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats
    }

    pub fn applications(&self) -> usize {
        self.applications
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    // The outcome if the search should stop before the next heartbeat.
    fn check_stop(&self) -> Option<Outcome> {
        if self.state.is_proved() {
            return Some(Outcome::Proved);
        }
        if self.stack.is_empty() {
            return Some(Outcome::Exhausted);
        }
        for token in &self.cancellation_tokens {
            if token.is_cancelled() {
                return Some(Outcome::Interrupted);
            }
        }
        if let Some(max) = self.config.max_heartbeats {
            if self.heartbeats >= max {
                return Some(Outcome::Constrained);
            }
        }
        if let Some(max) = self.config.max_applications {
            if self.applications >= max {
                return Some(Outcome::Constrained);
            }
        }
        if let (Some(seconds), Some(started)) = (self.config.timeout_secs, self.started) {
            if started.elapsed().as_secs_f32() >= seconds {
                return Some(Outcome::Timeout);
            }
        }
        None
    }

    /// Runs the automator on top of the stack for one heartbeat.
    fn heartbeat(&mut self) -> Result<(), ProverError> {
        let Some(mut automator) = self.stack.pop() else {
            return Ok(());
        };
        self.heartbeats += 1;
        let before = self.state.step_count();

        let mut beat = Heartbeat::new(&mut self.state);
        let status = match automator.step(&mut beat) {
            Ok(status) => status,
            Err(e) => {
                let e = e.within(&automator.name());
                error!(error = %e, heartbeat = self.heartbeats, "invariant violated");
                return Err(e);
            }
        };
        let pushed = beat.into_pushed();

        let after = self.state.step_count();
        if after > before {
            self.applications += after - before;
            for step in &self.state.steps()[before..] {
                debug!(
                    automator = %automator.name(),
                    step = %step.description,
                    "applied"
                );
            }
        }

        if status == Status::Continue {
            self.stack.push(automator);
        } else {
            trace!(automator = %automator.name(), "pop");
        }
        for a in pushed {
            trace!(automator = %a.name(), depth = self.stack.len(), "push");
            self.stack.push(a);
        }
        Ok(())
    }

    /// Runs heartbeats until the search stops.
    pub fn search(&mut self) -> Result<Outcome, ProverError> {
        self.started.get_or_insert_with(Instant::now);
        loop {
            if let Some(outcome) = self.check_stop() {
                info!(
                    obligation = %self.state.name(),
                    outcome = %outcome,
                    heartbeats = self.heartbeats,
                    applications = self.applications,
                    "search finished"
                );
                return Ok(outcome);
            }
            self.heartbeat()?;
        }
    }

    /// Runs heartbeats until the step log changes or the search stops.
    /// Returns the outcome if the search stopped.
    pub fn step(&mut self) -> Result<Option<Outcome>, ProverError> {
        self.started.get_or_insert_with(Instant::now);
        let before = self.state.steps().len();
        loop {
            if let Some(outcome) = self.check_stop() {
                return Ok(Some(outcome));
            }
            self.heartbeat()?;
            if self.state.steps().len() != before {
                return Ok(None);
            }
        }
    }

    pub fn report(&self, outcome: Outcome) -> ProofReport {
        ProofReport::new(&self.state, outcome, self.heartbeats, self.applications)
    }
}
