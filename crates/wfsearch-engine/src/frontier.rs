// Frontier scheduling: how (timestep, state) pairs get expanded.
//
// Both disciplines rely on every step weight being <= 0 in log space
// (probabilities never exceed 1). Under that condition the first expansion
// of a pair in best-first order already carries its final score.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashSet;
use tracing::trace;
use wfsearch_core::{LogProb, StateId, Strategy, SymbolId};

use crate::config::{BudgetMeter, Exhausted, SearchBudget};
use crate::table::{Backpointer, Entry, StateTable};
use crate::{SearchSpace, Step};

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An accepting state was reached with all input consumed.
    Accepted { state: StateId, timestep: usize },
    NoPath,
    Exhausted { expansions: u64 },
}

/// The filled state table together with how the search ended.
#[derive(Debug, Clone)]
pub struct SearchRun {
    pub table: StateTable,
    pub termination: Termination,
    pub expansions: u64,
}

/// Run one search over `observations` (already mapped to model symbols).
pub fn search<M: SearchSpace + ?Sized>(
    model: &M,
    observations: &[Option<SymbolId>],
    strategy: Strategy,
    budget: &SearchBudget,
) -> SearchRun {
    let mut meter = BudgetMeter::start(budget);
    let mut table = StateTable::with_timesteps(observations.len() + 1);
    let result = match strategy {
        Strategy::LayerSync => layer_sync(model, observations, &mut table, &mut meter),
        Strategy::BestFirst => best_first(model, observations, &mut table, &mut meter),
    };
    let termination = match result {
        Ok(Some((state, timestep))) => Termination::Accepted { state, timestep },
        Ok(None) => Termination::NoPath,
        Err(Exhausted { expansions }) => Termination::Exhausted { expansions },
    };
    SearchRun {
        table,
        termination,
        expansions: meter.expansions(),
    }
}

/// Pending work item, ordered so that `BinaryHeap` pops the best score
/// first, then the shallowest, then the earliest pushed.
#[derive(Debug, Clone, Copy)]
struct Pending {
    score: LogProb,
    depth: u32,
    seq: u64,
    state: StateId,
    timestep: usize,
}

impl Pending {
    fn same_value(&self, other: &Pending) -> bool {
        self.score == other.score && self.depth == other.depth
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
struct Queue {
    heap: BinaryHeap<Pending>,
    seq: u64,
}

impl Queue {
    fn push(&mut self, state: StateId, timestep: usize, entry: &Entry) {
        self.heap.push(Pending {
            score: entry.log_prob,
            depth: entry.depth,
            seq: self.seq,
            state,
            timestep,
        });
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<Pending> {
        self.heap.pop()
    }

    fn peek(&self) -> Option<&Pending> {
        self.heap.peek()
    }
}

fn seed<M: SearchSpace + ?Sized>(model: &M, table: &mut StateTable) {
    for &(state, log_prob) in model.seeds() {
        table.update(0, state, Entry::seed(log_prob));
    }
}

/// Relax `steps` out of `from`, whose entry is `base`, into layer
/// `to_timestep`. Calls `on_improved` for every entry that changed.
fn relax(
    table: &mut StateTable,
    from: Backpointer,
    base: Entry,
    to_timestep: usize,
    steps: &[Step],
    mut on_improved: impl FnMut(StateId, &Entry),
) {
    for step in steps {
        let candidate = Entry {
            pred: Some(from),
            output: step.output,
            log_prob: base.log_prob + step.weight,
            depth: base.depth + 1,
        };
        if table.update(to_timestep, step.to, candidate) {
            on_improved(step.to, &candidate);
        }
    }
}

/// Breadth-first by timestep: layer t is final before layer t+1 is built.
fn layer_sync<M: SearchSpace + ?Sized>(
    model: &M,
    observations: &[Option<SymbolId>],
    table: &mut StateTable,
    meter: &mut BudgetMeter,
) -> Result<Option<(StateId, usize)>, Exhausted> {
    seed(model, table);
    epsilon_closure(model, table, 0, meter)?;

    let mut steps = Vec::new();
    for (t, &symbol) in observations.iter().enumerate() {
        let layer: Vec<(StateId, Entry)> = table.layer(t).map(|(s, e)| (s, *e)).collect();
        trace!(timestep = t, states = layer.len(), "expanding layer");
        if layer.is_empty() {
            return Ok(None);
        }
        for (state, entry) in layer {
            meter.tick()?;
            steps.clear();
            model.successors(state, symbol, &mut steps);
            let from = Backpointer { state, timestep: t };
            relax(table, from, entry, t + 1, &steps, |_, _| {});
        }
        epsilon_closure(model, table, t + 1, meter)?;
    }

    let end = observations.len();
    Ok(table
        .best_in_layer(end, |s| model.is_accepting(s))
        .map(|(state, _)| (state, end)))
}

/// Close layer `timestep` under epsilon moves, best-first, expanding each
/// state at most once.
fn epsilon_closure<M: SearchSpace + ?Sized>(
    model: &M,
    table: &mut StateTable,
    timestep: usize,
    meter: &mut BudgetMeter,
) -> Result<(), Exhausted> {
    if !model.has_epsilons() {
        return Ok(());
    }
    let mut queue = Queue::default();
    for (state, entry) in table.layer(timestep) {
        queue.push(state, timestep, entry);
    }
    let mut expanded: HashSet<StateId> = HashSet::new();
    let mut steps = Vec::new();
    while let Some(item) = queue.pop() {
        if !expanded.insert(item.state) {
            continue;
        }
        steps.clear();
        model.epsilon_successors(item.state, &mut steps);
        if steps.is_empty() {
            continue;
        }
        meter.tick()?;
        let Some(&entry) = table.get(timestep, item.state) else {
            continue;
        };
        steps.retain(|s| !expanded.contains(&s.to));
        let from = Backpointer {
            state: item.state,
            timestep,
        };
        relax(table, from, entry, timestep, &steps, |to, e| {
            queue.push(to, timestep, e)
        });
    }
    Ok(())
}

/// Dijkstra over (timestep, state) pairs.
///
/// Once an accepting pair at the last timestep comes off the queue, every
/// other pending pair of exactly the same score and depth is drained as well
/// and the lowest state id among the accepting ones wins, matching
/// [`StateTable::best_in_layer`].
fn best_first<M: SearchSpace + ?Sized>(
    model: &M,
    observations: &[Option<SymbolId>],
    table: &mut StateTable,
    meter: &mut BudgetMeter,
) -> Result<Option<(StateId, usize)>, Exhausted> {
    let end = observations.len();
    let mut queue = Queue::default();
    seed(model, table);
    for (state, entry) in table.layer(0) {
        queue.push(state, 0, entry);
    }

    let mut expanded: HashSet<(usize, StateId)> = HashSet::new();
    let mut steps = Vec::new();
    while let Some(item) = queue.pop() {
        let t = item.timestep;
        if !expanded.insert((t, item.state)) {
            continue;
        }
        if t == end && model.is_accepting(item.state) {
            return Ok(Some((drain_ties(&mut queue, item, model, end), end)));
        }
        meter.tick()?;
        let Some(&entry) = table.get(t, item.state) else {
            continue;
        };
        let from = Backpointer {
            state: item.state,
            timestep: t,
        };

        if model.has_epsilons() {
            steps.clear();
            model.epsilon_successors(item.state, &mut steps);
            steps.retain(|s| !expanded.contains(&(t, s.to)));
            relax(table, from, entry, t, &steps, |to, e| queue.push(to, t, e));
        }
        if t < end {
            steps.clear();
            model.successors(item.state, observations[t], &mut steps);
            relax(table, from, entry, t + 1, &steps, |to, e| {
                queue.push(to, t + 1, e)
            });
        }
    }
    Ok(None)
}

/// Lowest accepting state at `end` among the pending pairs valued exactly
/// like `first`. Any pair reached later would be deeper, so nothing else can
/// tie.
fn drain_ties<M: SearchSpace + ?Sized>(
    queue: &mut Queue,
    first: Pending,
    model: &M,
    end: usize,
) -> StateId {
    let mut winner = first.state;
    while queue.peek().is_some_and(|next| next.same_value(&first)) {
        let Some(next) = queue.pop() else { break };
        if next.timestep == end && model.is_accepting(next.state) && next.state < winner {
            winner = next.state;
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PfstBuilder;
    use crate::pfst::EPSILON;

    fn observe<M: SearchSpace>(model: &M, input: &str) -> Vec<Option<SymbolId>> {
        input.split_whitespace().map(|t| model.observe(t)).collect()
    }

    /// 0 -a-> 1 (0.5) and 0 -a-> 2 (0.4), 2 -eps-> 1 (1.0), 1 -eps-> 3 (0.9),
    /// with 3 final. The epsilon route through 2 loses to the direct arc.
    fn epsilon_model() -> crate::Pfst {
        let mut b = PfstBuilder::new();
        let s0 = b.state("0");
        let s1 = b.state("1");
        let s2 = b.state("2");
        let s3 = b.state("3");
        b.add_arc(s0, Some("a"), s1, Some("x"), 0.5).unwrap();
        b.add_arc(s0, Some("a"), s2, Some("y"), 0.4).unwrap();
        b.add_arc(s2, Some(EPSILON), s1, None, 1.0).unwrap();
        b.add_arc(s1, Some(EPSILON), s3, Some("z"), 0.9).unwrap();
        b.set_start(s0);
        b.set_finish(s3);
        b.build().unwrap()
    }

    #[test]
    fn pending_orders_by_score_depth_then_sequence() {
        let at = |lp: f64, depth: u32| Entry {
            depth,
            ..Entry::seed(LogProb::from_log10(lp))
        };
        let mut q = Queue::default();
        q.push(StateId(1), 0, &at(-2.0, 0));
        q.push(StateId(2), 0, &at(-1.0, 3));
        q.push(StateId(3), 0, &at(-1.0, 1));
        q.push(StateId(4), 0, &at(-1.0, 1));
        assert_eq!(q.pop().unwrap().state, StateId(3));
        assert_eq!(q.pop().unwrap().state, StateId(4));
        assert_eq!(q.pop().unwrap().state, StateId(2));
        assert_eq!(q.pop().unwrap().state, StateId(1));
    }

    #[test]
    fn epsilon_moves_stay_within_the_timestep() {
        let model = epsilon_model();
        let obs = observe(&model, "a");
        for strategy in [Strategy::LayerSync, Strategy::BestFirst] {
            let run = search(&model, &obs, strategy, &SearchBudget::unbounded());
            let finish = model.finish();
            assert_eq!(
                run.termination,
                Termination::Accepted {
                    state: finish,
                    timestep: 1
                }
            );
            let entry = run.table.get(1, finish).unwrap();
            let pred = entry.pred.unwrap();
            assert_eq!(pred.timestep, 1);
            assert_eq!(model.state_name(pred.state), "1");
            let expected = LogProb::from_prob(0.5) + LogProb::from_prob(0.9);
            assert_eq!(entry.log_prob, expected);
        }
    }

    #[test]
    fn epsilon_cycles_terminate() {
        let mut b = PfstBuilder::new();
        let s0 = b.state("0");
        let s1 = b.state("1");
        b.add_arc(s0, None, s1, None, 1.0).unwrap();
        b.add_arc(s1, None, s0, None, 1.0).unwrap();
        b.add_arc(s1, None, s1, None, 1.0).unwrap();
        b.set_start(s0);
        b.set_finish(s1);
        let model = b.build().unwrap();
        for strategy in [Strategy::LayerSync, Strategy::BestFirst] {
            let run = search(&model, &[], strategy, &SearchBudget::unbounded());
            assert_eq!(
                run.termination,
                Termination::Accepted {
                    state: s1,
                    timestep: 0
                }
            );
            assert_eq!(run.table.get(0, s1).unwrap().log_prob, LogProb::ONE);
        }
    }

    #[test]
    fn dead_end_reports_no_path() {
        let model = epsilon_model();
        let obs = observe(&model, "a a");
        for strategy in [Strategy::LayerSync, Strategy::BestFirst] {
            let run = search(&model, &obs, strategy, &SearchBudget::unbounded());
            assert_eq!(run.termination, Termination::NoPath);
        }
    }

    #[test]
    fn budget_stops_the_search() {
        let model = epsilon_model();
        let obs = observe(&model, "a");
        let budget = SearchBudget::unbounded().with_max_expansions(1);
        for strategy in [Strategy::LayerSync, Strategy::BestFirst] {
            let run = search(&model, &obs, strategy, &budget);
            assert!(matches!(run.termination, Termination::Exhausted { .. }));
        }
    }

    #[test]
    fn best_first_leaves_unneeded_pairs_unexplored() {
        // A cheap branch that dies and an expensive one that survives.
        let mut b = PfstBuilder::new();
        b.add_rule("0", "a", "1", "a", 0.1).unwrap();
        b.add_rule("0", "a", "2", "a", 0.9).unwrap();
        b.add_rule("1", "a", "1", "a", 1.0).unwrap();
        b.add_rule("2", "a", "3", "a", 1.0).unwrap();
        b.add_rule("3", "a", "3", "a", 1.0).unwrap();
        let s = b.state("0");
        let f = b.state("1");
        b.set_start(s);
        b.set_finish(f);
        let model = b.build().unwrap();
        let obs = observe(&model, "a a a");
        let layer = search(&model, &obs, Strategy::LayerSync, &SearchBudget::unbounded());
        let best = search(&model, &obs, Strategy::BestFirst, &SearchBudget::unbounded());
        assert_eq!(layer.termination, best.termination);
        assert!(layer.table.len() >= best.table.len());
    }
}
