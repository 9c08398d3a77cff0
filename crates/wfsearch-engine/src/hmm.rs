// State-emission hidden Markov model.
//
// The observation at timestep t is emitted by the state entered at t+1, so a
// path over n observations visits n+1 states, the first drawn from the
// initial distribution. Every state may end a path.

use hashbrown::HashMap;
use wfsearch_core::logprob::is_probability;
use wfsearch_core::{Interner, Label, LogProb, StateId, SymbolId};

use crate::{ModelError, SearchSpace, Step};

/// Emission key used for observations never seen in training.
pub const UNK: &str = "<unk>";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Weighted {
    prob: f64,
    log: LogProb,
}

impl Weighted {
    fn new(prob: f64) -> Self {
        Self {
            prob,
            log: LogProb::from_prob(prob),
        }
    }
}

/// Immutable HMM parameters.
///
/// Emissions are indexed by symbol first, so the states able to emit the
/// current observation come out of one lookup.
#[derive(Debug, Clone)]
pub struct Hmm {
    states: Interner,
    symbols: Interner,
    init: Vec<(StateId, f64)>,
    seeds: Vec<(StateId, LogProb)>,
    /// Outgoing transitions per source state, in insertion order.
    transitions: HashMap<StateId, Vec<(StateId, Weighted)>>,
    /// `symbol -> state -> probability`.
    emissions: HashMap<SymbolId, HashMap<StateId, Weighted>>,
    unk: Option<SymbolId>,
}

impl Hmm {
    /// Prior probability of each initial state, in insertion order.
    pub fn initial_distribution(&self) -> &[(StateId, f64)] {
        &self.init
    }

    /// Outgoing transitions of `state` as `(to, probability)`.
    pub fn transitions(&self, state: StateId) -> impl Iterator<Item = (StateId, f64)> + '_ {
        self.transitions
            .get(&state)
            .into_iter()
            .flatten()
            .map(|(to, w)| (*to, w.prob))
    }

    /// Probability that `state` emits `token`, falling back to the
    /// [`UNK`] row when the token has no emission row at all.
    pub fn emission(&self, state: StateId, token: &str) -> f64 {
        self.observe(token)
            .and_then(|sym| self.emissions.get(&sym))
            .and_then(|row| row.get(&state))
            .map(|w| w.prob)
            .unwrap_or(0.0)
    }

    pub fn state_id(&self, label: &str) -> Option<StateId> {
        self.states.get(label).map(StateId)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// The `<unk>` symbol, if the model defines emissions for it.
    pub fn unk(&self) -> Option<SymbolId> {
        self.unk
    }

    /// Sum of outgoing transition probabilities for every state that has
    /// outgoing transitions, ordered by state id.
    pub fn transition_sums(&self) -> Vec<(StateId, f64)> {
        let mut sums: Vec<(StateId, f64)> = self
            .transitions
            .iter()
            .map(|(from, row)| (*from, row.iter().map(|(_, w)| w.prob).sum()))
            .collect();
        sums.sort_by_key(|(s, _)| *s);
        sums
    }

    /// Sum of emission probabilities for every state that emits something,
    /// ordered by state id.
    pub fn emission_sums(&self) -> Vec<(StateId, f64)> {
        let mut sums: HashMap<StateId, f64> = HashMap::new();
        // Sum in symbol-id order so the result does not depend on hashing.
        let mut symbols: Vec<&SymbolId> = self.emissions.keys().collect();
        symbols.sort();
        for sym in symbols {
            let mut row: Vec<(&StateId, &Weighted)> = self.emissions[sym].iter().collect();
            row.sort_by_key(|(s, _)| **s);
            for (state, w) in row {
                *sums.entry(*state).or_insert(0.0) += w.prob;
            }
        }
        let mut sums: Vec<(StateId, f64)> = sums.into_iter().collect();
        sums.sort_by_key(|(s, _)| *s);
        sums
    }
}

impl SearchSpace for Hmm {
    fn observe(&self, token: &str) -> Option<SymbolId> {
        match self.symbols.get(token).map(SymbolId) {
            Some(sym) if self.emissions.contains_key(&sym) => Some(sym),
            _ => self.unk,
        }
    }

    fn seeds(&self) -> &[(StateId, LogProb)] {
        &self.seeds
    }

    fn successors(&self, state: StateId, symbol: Option<SymbolId>, out: &mut Vec<Step>) {
        let Some(row) = symbol.and_then(|s| self.emissions.get(&s)) else {
            return;
        };
        let Some(outgoing) = self.transitions.get(&state) else {
            return;
        };
        for (to, trans) in outgoing {
            if let Some(emit) = row.get(to) {
                out.push(Step {
                    to: *to,
                    output: Some(Label::State(*to)),
                    weight: trans.log + emit.log,
                });
            }
        }
    }

    fn is_accepting(&self, _state: StateId) -> bool {
        true
    }

    fn state_name(&self, state: StateId) -> &str {
        self.states.name(state.0)
    }

    fn label_name(&self, label: Label) -> &str {
        match label {
            Label::State(s) => self.states.name(s.0),
            Label::Symbol(s) => self.symbols.name(s.0),
        }
    }
}

/// Incremental constructor for [`Hmm`].
///
/// Each `add_*` returns `Ok(true)` when it replaced an existing entry.
#[derive(Debug, Default)]
pub struct HmmBuilder {
    states: Interner,
    symbols: Interner,
    init: Vec<(StateId, f64)>,
    transitions: HashMap<StateId, Vec<(StateId, Weighted)>>,
    emissions: HashMap<SymbolId, HashMap<StateId, Weighted>>,
}

impl HmmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&mut self, label: &str) -> StateId {
        StateId(self.states.intern(label))
    }

    pub fn add_initial(&mut self, state: &str, prob: f64) -> Result<bool, ModelError> {
        check(prob)?;
        let state = self.state(state);
        if let Some(entry) = self.init.iter_mut().find(|(s, _)| *s == state) {
            entry.1 = prob;
            return Ok(true);
        }
        self.init.push((state, prob));
        Ok(false)
    }

    pub fn add_transition(&mut self, from: &str, to: &str, prob: f64) -> Result<bool, ModelError> {
        check(prob)?;
        let from = self.state(from);
        let to = self.state(to);
        let row = self.transitions.entry(from).or_default();
        if let Some(entry) = row.iter_mut().find(|(s, _)| *s == to) {
            entry.1 = Weighted::new(prob);
            return Ok(true);
        }
        row.push((to, Weighted::new(prob)));
        Ok(false)
    }

    pub fn add_emission(&mut self, state: &str, symbol: &str, prob: f64) -> Result<bool, ModelError> {
        check(prob)?;
        let state = self.state(state);
        let symbol = SymbolId(self.symbols.intern(symbol));
        let replaced = self
            .emissions
            .entry(symbol)
            .or_default()
            .insert(state, Weighted::new(prob))
            .is_some();
        Ok(replaced)
    }

    pub fn build(self) -> Hmm {
        let seeds = self
            .init
            .iter()
            .map(|(s, p)| (*s, LogProb::from_prob(*p)))
            .collect();
        let unk = self
            .symbols
            .get(UNK)
            .map(SymbolId)
            .filter(|s| self.emissions.contains_key(s));
        Hmm {
            states: self.states,
            symbols: self.symbols,
            init: self.init,
            seeds,
            transitions: self.transitions,
            emissions: self.emissions,
            unk,
        }
    }
}

fn check(prob: f64) -> Result<(), ModelError> {
    if is_probability(prob) {
        Ok(())
    } else {
        Err(ModelError::ProbabilityOutOfRange(prob))
    }
}
