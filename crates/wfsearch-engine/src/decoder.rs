// Decode entry point: run a search, reconstruct the winner, render names.

use rayon::prelude::*;
use tracing::{debug, error};
use wfsearch_core::{LogProb, Outcome, StateId, SymbolId, WinningPath};

use crate::SearchSpace;
use crate::backtrace::{TraceStep, backtrace};
use crate::config::SearchConfig;
use crate::frontier::{SearchRun, Termination, search};

/// Decodes observation sequences against one shared, read-only model.
///
/// A `Decoder` holds no per-call state; every call builds and drops its own
/// state table, so one decoder can serve many sequences (and threads, when
/// the model is `Sync`).
#[derive(Debug)]
pub struct Decoder<'m, M: SearchSpace + ?Sized> {
    model: &'m M,
    config: SearchConfig,
}

impl<M: SearchSpace + ?Sized> Clone for Decoder<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: SearchSpace + ?Sized> Copy for Decoder<'_, M> {}

impl<'m, M: SearchSpace + ?Sized> Decoder<'m, M> {
    pub fn new(model: &'m M, config: SearchConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &'m M {
        self.model
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Decode a whitespace-tokenized observation line.
    pub fn decode_line(&self, line: &str) -> Outcome {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        self.decode(&tokens)
    }

    /// Decode one observation sequence.
    pub fn decode<S: AsRef<str>>(&self, tokens: &[S]) -> Outcome {
        let symbols: Vec<Option<SymbolId>> = tokens
            .iter()
            .map(|t| self.model.observe(t.as_ref()))
            .collect();
        self.decode_symbols(&symbols)
    }

    /// Decode a sequence already mapped through [`SearchSpace::observe`].
    pub fn decode_symbols(&self, symbols: &[Option<SymbolId>]) -> Outcome {
        let run = self.run(symbols);
        debug!(
            strategy = %self.config.strategy,
            observations = symbols.len(),
            expansions = run.expansions,
            table_entries = run.table.len(),
            "decode finished"
        );
        match run.termination {
            Termination::Accepted { state, timestep } => self.winning_path(&run, state, timestep),
            Termination::NoPath => Outcome::NoPath,
            Termination::Exhausted { expansions } => Outcome::BudgetExhausted { expansions },
        }
    }

    /// Run the search and hand back the raw state table.
    pub fn run(&self, symbols: &[Option<SymbolId>]) -> SearchRun {
        search(
            self.model,
            symbols,
            self.config.strategy,
            &self.config.budget,
        )
    }

    fn winning_path(&self, run: &SearchRun, state: StateId, timestep: usize) -> Outcome {
        let Some(log_prob) = run.table.get(timestep, state).map(|e| e.log_prob) else {
            error!(state = state.0, timestep, "accepted state missing from table");
            return Outcome::NoPath;
        };
        match backtrace(&run.table, state, timestep) {
            Ok(steps) => Outcome::Found(self.render(&steps, log_prob)),
            Err(err) => {
                error!(%err, "backtrace failed");
                Outcome::NoPath
            }
        }
    }

    fn render(&self, steps: &[TraceStep], log_prob: LogProb) -> WinningPath {
        WinningPath {
            states: steps
                .iter()
                .map(|s| self.model.state_name(s.state).to_owned())
                .collect(),
            outputs: steps
                .iter()
                .filter_map(|s| s.output)
                .map(|label| self.model.label_name(label).to_owned())
                .collect(),
            log_prob,
        }
    }
}

impl<M: SearchSpace + Sync + ?Sized> Decoder<'_, M> {
    /// Decode many independent sequences in parallel. Results come back in
    /// input order.
    pub fn decode_batch<S: AsRef<str> + Sync>(&self, batch: &[Vec<S>]) -> Vec<Outcome> {
        batch.par_iter().map(|tokens| self.decode(tokens)).collect()
    }

    /// Like [`decode_batch`](Self::decode_batch) over raw observation lines.
    pub fn decode_lines<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<Outcome> {
        lines
            .par_iter()
            .map(|line| self.decode_line(line.as_ref()))
            .collect()
    }
}
