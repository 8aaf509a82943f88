use std::fmt;

/// Problems with a theorem, found when it's compiled into transformations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TheoryError {
    /// A symbol is used with two different numbers of arguments.
    InconsistentArity {
        theorem: String,
        symbol: String,
        first: usize,
        second: usize,
    },

    /// Theorems may only quantify universally.
    ExistentialInTheorem { theorem: String },

    EmptyName,

    Parse { theorem: String, message: String },
}

impl fmt::Display for TheoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TheoryError::InconsistentArity {
                theorem,
                symbol,
                first,
                second,
            } => write!(
                f,
                "in theorem {}, {} is used with {} arguments and with {} arguments",
                theorem, symbol, first, second
            ),
            TheoryError::ExistentialInTheorem { theorem } => {
                write!(f, "theorem {} contains an existential variable", theorem)
            }
            TheoryError::EmptyName => write!(f, "theorem has an empty name"),
            TheoryError::Parse { theorem, message } => {
                write!(f, "could not parse theorem {}: {}", theorem, message)
            }
        }
    }
}

impl std::error::Error for TheoryError {}

/// An internal inconsistency detected during search.
/// These indicate a bug in an automator or transformation, not a failure to find a proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProverError {
    Invariant {
        /// The automator running when the problem was found, if known.
        automator: Option<String>,

        /// The length of the step log when the problem was found.
        step_index: usize,

        message: String,
    },
}

impl ProverError {
    pub fn invariant(step_index: usize, message: impl Into<String>) -> ProverError {
        ProverError::Invariant {
            automator: None,
            step_index,
            message: message.into(),
        }
    }

    /// Attributes the error to an automator, unless it's already attributed.
    pub fn within(self, name: &str) -> ProverError {
        match self {
            ProverError::Invariant {
                automator: None,
                step_index,
                message,
            } => ProverError::Invariant {
                automator: Some(name.to_string()),
                step_index,
                message,
            },
            e => e,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProverError::Invariant { message, .. } => message,
        }
    }
}

impl fmt::Display for ProverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProverError::Invariant {
                automator,
                step_index,
                message,
            } => {
                write!(f, "invariant violated at step {}", step_index)?;
                if let Some(name) = automator {
                    write!(f, " in {}", name)?;
                }
                write!(f, ": {}", message)
            }
        }
    }
}

impl std::error::Error for ProverError {}
