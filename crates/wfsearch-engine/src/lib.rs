//! Weighted finite-state search engine.
//!
//! Finds the best-scoring path through a probabilistic transducer (PFST) or a
//! hidden Markov model for one observation sequence, using dynamic
//! programming over a per-timestep state table.
//!
//! # Architecture
//!
//! - [`pfst`] -- probabilistic finite-state transducer model and builder
//! - [`hmm`] -- state-emission HMM model and builder
//! - [`table`] -- the per-timestep state table (best predecessor per state)
//! - [`config`] -- search configuration and budgets
//! - [`frontier`] -- layer-synchronous and best-first exploration
//! - [`backtrace`] -- winning path reconstruction
//! - [`decoder`] -- the decode entry point, single and batch
//! - [`format`] -- text formats: rule files, HMM files, lexicon expansion, result lines
//! - [`validate`] -- HMM header and stochastic-constraint checks

pub mod backtrace;
pub mod config;
pub mod decoder;
pub mod format;
pub mod frontier;
pub mod hmm;
pub mod pfst;
pub mod table;
pub mod validate;

use wfsearch_core::{Label, LogProb, StateId, SymbolId};

pub use config::{SearchBudget, SearchConfig};
pub use decoder::Decoder;
pub use hmm::{Hmm, HmmBuilder};
pub use pfst::{Pfst, PfstBuilder};

/// Error type for building a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),
    #[error("transducer has no start state")]
    MissingStart,
    #[error("transducer has no final state")]
    MissingFinal,
    #[error("transducer definition contains no usable rule")]
    NoRules,
}

/// Error type for queries against a finished search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The requested (timestep, state) pair was never reached.
    #[error("state {state} was not reached at timestep {timestep}")]
    Unreached { state: u32, timestep: usize },
    /// Predecessor links loop back on themselves.
    #[error("predecessor chain from state {state} at timestep {timestep} does not terminate")]
    BrokenChain { state: u32, timestep: usize },
}

/// One weighted move out of a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub to: StateId,
    /// Label written by the move; `None` for epsilon output.
    pub output: Option<Label>,
    /// Combined log weight of the move (transition plus emission, if any).
    pub weight: LogProb,
}

/// The view of a model that the search needs.
///
/// `successors` yields the moves that consume one observation symbol; the
/// model is responsible for intersecting its transitions with whatever it
/// requires of the symbol (an input label, an emission). `epsilon_successors`
/// yields moves that consume nothing and stay within the timestep.
pub trait SearchSpace {
    /// Map an observation token to the model's symbol id. `None` means the
    /// token can never be consumed.
    fn observe(&self, token: &str) -> Option<SymbolId>;

    /// States the search starts from at timestep 0, with their prior.
    fn seeds(&self) -> &[(StateId, LogProb)];

    /// Moves from `state` consuming `symbol`.
    fn successors(&self, state: StateId, symbol: Option<SymbolId>, out: &mut Vec<Step>);

    /// Moves from `state` consuming nothing.
    fn epsilon_successors(&self, _state: StateId, _out: &mut Vec<Step>) {}

    /// Whether the model has any epsilon moves at all.
    fn has_epsilons(&self) -> bool {
        false
    }

    /// Whether a path may end in `state` once all input is consumed.
    fn is_accepting(&self, state: StateId) -> bool;

    fn state_name(&self, state: StateId) -> &str;

    fn label_name(&self, label: Label) -> &str;
}
