// Probabilistic finite-state transducer: states, labelled weighted arcs, a
// single start state and a single final state.

use hashbrown::HashMap;
use wfsearch_core::logprob::is_probability;
use wfsearch_core::{Interner, Label, LogProb, StateId, SymbolId};

use crate::{ModelError, SearchSpace, Step};

/// Reserved symbol for "no symbol" on either tape.
pub const EPSILON: &str = "*e*";

/// Input side of an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Epsilon,
    Symbol(SymbolId),
}

/// A weighted arc leaving some `(state, input)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub to: StateId,
    /// `None` for epsilon output.
    pub output: Option<SymbolId>,
    pub prob: f64,
    weight: LogProb,
}

impl Arc {
    #[inline]
    pub fn weight(&self) -> LogProb {
        self.weight
    }
}

/// Immutable transducer, shared read-only across decode calls.
///
/// Arcs are stored under their `(from_state, input)` key in insertion order,
/// which fixes the order successors are explored in.
#[derive(Debug, Clone)]
pub struct Pfst {
    states: Interner,
    symbols: Interner,
    start: StateId,
    finish: StateId,
    seeds: [(StateId, LogProb); 1],
    arcs: HashMap<(StateId, Input), Vec<Arc>>,
    /// Arc keys in first-insertion order.
    key_order: Vec<(StateId, Input)>,
    has_epsilons: bool,
    arc_count: usize,
}

impl Pfst {
    /// Arcs leaving `state` on `input`. Empty when none are defined.
    pub fn transitions(&self, state: StateId, input: Input) -> &[Arc] {
        self.arcs
            .get(&(state, input))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn finish(&self) -> StateId {
        self.finish
    }

    pub fn state_id(&self, label: &str) -> Option<StateId> {
        self.states.get(label).map(StateId)
    }

    pub fn symbol_id(&self, label: &str) -> Option<SymbolId> {
        self.symbols.get(label).map(SymbolId)
    }

    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.symbols.name(symbol.0)
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.arc_count
    }

    /// All arcs as `(from, input, arc)` in insertion order of their keys.
    pub fn arcs(&self) -> impl Iterator<Item = (StateId, Input, &Arc)> {
        self.key_order.iter().flat_map(move |key| {
            self.arcs
                .get(key)
                .into_iter()
                .flatten()
                .map(move |arc| (key.0, key.1, arc))
        })
    }

    /// Sum of outgoing arc probabilities per state, over every input symbol,
    /// for each state that has outgoing arcs. Ordered by state id.
    pub fn outgoing_sums(&self) -> Vec<(StateId, f64)> {
        let mut sums: Vec<Option<f64>> = vec![None; self.states.len()];
        for (from, _, arc) in self.arcs() {
            *sums[from.index()].get_or_insert(0.0) += arc.prob;
        }
        sums.into_iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (StateId(i as u32), s)))
            .collect()
    }
}

impl SearchSpace for Pfst {
    fn observe(&self, token: &str) -> Option<SymbolId> {
        if token == EPSILON {
            return None;
        }
        self.symbol_id(token)
    }

    fn seeds(&self) -> &[(StateId, LogProb)] {
        &self.seeds
    }

    fn successors(&self, state: StateId, symbol: Option<SymbolId>, out: &mut Vec<Step>) {
        let Some(symbol) = symbol else {
            return;
        };
        out.extend(
            self.transitions(state, Input::Symbol(symbol))
                .iter()
                .map(arc_step),
        );
    }

    fn epsilon_successors(&self, state: StateId, out: &mut Vec<Step>) {
        out.extend(self.transitions(state, Input::Epsilon).iter().map(arc_step));
    }

    fn has_epsilons(&self) -> bool {
        self.has_epsilons
    }

    fn is_accepting(&self, state: StateId) -> bool {
        state == self.finish
    }

    fn state_name(&self, state: StateId) -> &str {
        self.states.name(state.0)
    }

    fn label_name(&self, label: Label) -> &str {
        match label {
            Label::Symbol(s) => self.symbols.name(s.0),
            Label::State(s) => self.states.name(s.0),
        }
    }
}

#[inline]
fn arc_step(arc: &Arc) -> Step {
    Step {
        to: arc.to,
        output: arc.output.map(Label::Symbol),
        weight: arc.weight,
    }
}

/// Incremental constructor for [`Pfst`].
#[derive(Debug, Default)]
pub struct PfstBuilder {
    states: Interner,
    symbols: Interner,
    start: Option<StateId>,
    finish: Option<StateId>,
    arcs: HashMap<(StateId, Input), Vec<Arc>>,
    key_order: Vec<(StateId, Input)>,
}

impl PfstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for a named state, created on first use.
    pub fn state(&mut self, label: &str) -> StateId {
        StateId(self.states.intern(label))
    }

    /// A new state that no label lookup can return. `stem` only shapes its
    /// display name; the numeric suffix keeps display names distinct.
    pub fn fresh_state(&mut self, stem: &str) -> StateId {
        let next = self.states.len();
        StateId(self.states.fresh(format!("{stem}~{next}")))
    }

    pub fn set_start(&mut self, state: StateId) {
        self.start = Some(state);
    }

    pub fn set_finish(&mut self, state: StateId) {
        self.finish = Some(state);
    }

    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    fn symbol(&mut self, label: Option<&str>) -> Option<SymbolId> {
        match label {
            None => None,
            Some(EPSILON) => None,
            Some(s) => Some(SymbolId(self.symbols.intern(s))),
        }
    }

    /// Add an arc. `None` (or [`EPSILON`]) on either side means epsilon.
    ///
    /// Returns `Ok(true)` when an arc with the same `(from, input, to,
    /// output)` already existed and its probability was replaced.
    pub fn add_arc(
        &mut self,
        from: StateId,
        input: Option<&str>,
        to: StateId,
        output: Option<&str>,
        prob: f64,
    ) -> Result<bool, ModelError> {
        if !is_probability(prob) {
            return Err(ModelError::ProbabilityOutOfRange(prob));
        }
        let input = match self.symbol(input) {
            Some(s) => Input::Symbol(s),
            None => Input::Epsilon,
        };
        let output = self.symbol(output);
        let arc = Arc {
            to,
            output,
            prob,
            weight: LogProb::from_prob(prob),
        };

        let key = (from, input);
        let bucket = self.arcs.entry(key).or_insert_with(Vec::new);
        if bucket.is_empty() {
            self.key_order.push(key);
        }
        if let Some(existing) = bucket
            .iter_mut()
            .find(|a| a.to == to && a.output == output)
        {
            *existing = arc;
            return Ok(true);
        }
        bucket.push(arc);
        Ok(false)
    }

    /// Convenience wrapper over [`add_arc`](Self::add_arc) taking state labels.
    pub fn add_rule(
        &mut self,
        from: &str,
        input: &str,
        to: &str,
        output: &str,
        prob: f64,
    ) -> Result<bool, ModelError> {
        let from = self.state(from);
        let to = self.state(to);
        self.add_arc(from, Some(input), to, Some(output), prob)
    }

    pub fn build(self) -> Result<Pfst, ModelError> {
        let start = self.start.ok_or(ModelError::MissingStart)?;
        let finish = self.finish.ok_or(ModelError::MissingFinal)?;
        let arc_count = self.arcs.values().map(Vec::len).sum();
        let has_epsilons = self.arcs.keys().any(|(_, i)| *i == Input::Epsilon);
        Ok(Pfst {
            states: self.states,
            symbols: self.symbols,
            start,
            finish,
            seeds: [(start, LogProb::ONE)],
            arcs: self.arcs,
            key_order: self.key_order,
            has_epsilons,
            arc_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state() -> Pfst {
        let mut b = PfstBuilder::new();
        b.add_rule("0", "a", "1", "b", 1.0).unwrap();
        b.add_rule("1", "a", "1", "b", 1.0).unwrap();
        let s = b.state("0");
        let f = b.state("1");
        b.set_start(s);
        b.set_finish(f);
        b.build().unwrap()
    }

    #[test]
    fn transitions_by_state_and_input() {
        let t = two_state();
        let a = t.symbol_id("a").unwrap();
        let arcs = t.transitions(t.start(), Input::Symbol(a));
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].to, t.finish());
        assert_eq!(t.symbol_name(arcs[0].output.unwrap()), "b");
        assert_eq!(arcs[0].weight(), LogProb::ONE);
    }

    #[test]
    fn missing_transitions_are_empty() {
        let t = two_state();
        assert!(t.transitions(t.start(), Input::Epsilon).is_empty());
        let b = t.symbol_id("b").unwrap();
        assert!(t.transitions(t.start(), Input::Symbol(b)).is_empty());
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let mut b = PfstBuilder::new();
        let err = b.add_rule("0", "a", "1", "a", 1.5).unwrap_err();
        assert_eq!(err, ModelError::ProbabilityOutOfRange(1.5));
    }

    #[test]
    fn duplicate_arc_replaces_probability() {
        let mut b = PfstBuilder::new();
        assert!(!b.add_rule("0", "a", "1", "x", 0.2).unwrap());
        assert!(b.add_rule("0", "a", "1", "x", 0.4).unwrap());
        let s = b.state("0");
        b.set_start(s);
        b.set_finish(s);
        let t = b.build().unwrap();
        assert_eq!(t.num_arcs(), 1);
        assert_eq!(t.arcs().next().unwrap().2.prob, 0.4);
    }

    #[test]
    fn epsilon_labels_map_to_none() {
        let mut b = PfstBuilder::new();
        let s = b.state("s");
        let f = b.state("f");
        b.add_arc(s, Some(EPSILON), f, None, 0.5).unwrap();
        b.set_start(s);
        b.set_finish(f);
        let t = b.build().unwrap();
        assert!(t.has_epsilons());
        let mut out = Vec::new();
        t.epsilon_successors(s, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].output, None);
        assert_eq!(t.observe(EPSILON), None);
    }

    #[test]
    fn build_requires_start_and_finish() {
        let mut b = PfstBuilder::new();
        b.add_rule("0", "a", "1", "a", 1.0).unwrap();
        assert_eq!(b.build().unwrap_err(), ModelError::MissingStart);
    }

    #[test]
    fn fresh_states_never_collide() {
        let mut b = PfstBuilder::new();
        let named = b.state("q0a");
        let fresh = b.fresh_state("q0a");
        assert_ne!(named, fresh);
        assert_eq!(b.state("q0a"), named);
    }

    #[test]
    fn outgoing_sums_cover_all_inputs() {
        let mut b = PfstBuilder::new();
        b.add_rule("0", "a", "1", "a", 0.25).unwrap();
        b.add_rule("0", "b", "1", "b", 0.5).unwrap();
        b.add_rule("1", "a", "1", "a", 1.0).unwrap();
        let s = b.state("0");
        b.set_start(s);
        b.set_finish(s);
        let t = b.build().unwrap();
        let sums = t.outgoing_sums();
        assert_eq!(sums, vec![(StateId(0), 0.75), (StateId(1), 1.0)]);
    }
}
