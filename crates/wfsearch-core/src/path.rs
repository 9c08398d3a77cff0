// Decode results: the winning path and the outcome of one decode call.

use serde::Serialize;

use crate::LogProb;

/// The best-scoring path through an automaton for one observation sequence.
///
/// `states` starts with the seed state (the virtual start at timestep 0).
/// For a tagger it has one more entry than the observation; transducer paths
/// that take epsilon arcs are longer. `outputs` holds the non-epsilon output
/// labels in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinningPath {
    pub states: Vec<String>,
    pub outputs: Vec<String>,
    pub log_prob: LogProb,
}

impl WinningPath {
    /// Probability of the path (not in log space).
    pub fn prob(&self) -> f64 {
        self.log_prob.to_prob()
    }

    /// Number of states on the path.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Result of a single decode call.
///
/// Failing to find a path is an expected answer, not an error, and is kept
/// apart from running out of budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Found(WinningPath),
    NoPath,
    BudgetExhausted { expansions: u64 },
}

impl Outcome {
    pub fn path(&self) -> Option<&WinningPath> {
        match self {
            Outcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<WinningPath> {
        match self {
            Outcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }
}
