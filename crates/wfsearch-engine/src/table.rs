// Per-timestep state table: the best known predecessor of every reached
// (timestep, state) pair.
//
// Entries are ranked by score, then by fewer moves from a seed, then by the
// predecessor key. The ranking depends only on the paths themselves, so any
// exploration order that relaxes every optimal predecessor ends with the same
// table along the winning path.

use std::cmp::Ordering;

use hashbrown::HashMap;
use wfsearch_core::{Label, LogProb, StateId};

/// Where the best path into an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Backpointer {
    pub state: StateId,
    /// Equal to the entry's own timestep for an epsilon move.
    pub timestep: usize,
}

/// Best known way to reach one (timestep, state) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    /// `None` for a seed entry.
    pub pred: Option<Backpointer>,
    /// Label written by the move into this entry.
    pub output: Option<Label>,
    pub log_prob: LogProb,
    /// Moves (epsilon moves included) from the seed.
    pub depth: u32,
}

impl Entry {
    pub fn seed(log_prob: LogProb) -> Self {
        Self {
            pred: None,
            output: None,
            log_prob,
            depth: 0,
        }
    }

    /// Rank two ways into the same pair; `Greater` is better.
    ///
    /// Among equal scores the shallower path wins, which keeps predecessor
    /// links acyclic through zero-weight epsilon cycles. Remaining ties go to
    /// the smaller `(timestep, state, output)` of the predecessor, with a
    /// seed ahead of everything.
    pub fn rank(&self, other: &Entry) -> Ordering {
        self.log_prob
            .cmp(&other.log_prob)
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.tie_key().cmp(&self.tie_key()))
    }

    fn tie_key(&self) -> (Option<(usize, StateId)>, Option<Label>) {
        (self.pred.map(|p| (p.timestep, p.state)), self.output)
    }
}

#[derive(Debug, Default, Clone)]
struct Layer {
    index: HashMap<StateId, usize>,
    /// Entries in first-insertion order.
    entries: Vec<(StateId, Entry)>,
}

/// Dynamic-programming table scoped to one decode call.
///
/// An entry is only ever replaced by a strictly better one, so for a fixed
/// key the stored score never decreases, and among equally good paths the
/// first one recorded wins.
#[derive(Debug, Default, Clone)]
pub struct StateTable {
    layers: Vec<Layer>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-sized for `timesteps` layers.
    pub fn with_timesteps(timesteps: usize) -> Self {
        Self {
            layers: vec![Layer::default(); timesteps],
        }
    }

    pub fn get(&self, timestep: usize, state: StateId) -> Option<&Entry> {
        let layer = self.layers.get(timestep)?;
        layer.index.get(&state).map(|&i| &layer.entries[i].1)
    }

    /// Record `candidate` for `(timestep, state)` if the pair is unreached or
    /// the candidate ranks strictly higher (see [`Entry::rank`]). The stored
    /// score never decreases. Impossible candidates are ignored.
    ///
    /// Returns whether the table changed.
    pub fn update(&mut self, timestep: usize, state: StateId, candidate: Entry) -> bool {
        if candidate.log_prob.is_zero() {
            return false;
        }
        if timestep >= self.layers.len() {
            self.layers.resize_with(timestep + 1, Layer::default);
        }
        let layer = &mut self.layers[timestep];
        match layer.index.get(&state) {
            Some(&i) => {
                let slot = &mut layer.entries[i].1;
                if candidate.rank(slot) == Ordering::Greater {
                    *slot = candidate;
                    true
                } else {
                    false
                }
            }
            None => {
                layer.index.insert(state, layer.entries.len());
                layer.entries.push((state, candidate));
                true
            }
        }
    }

    /// Entries of one layer in first-insertion order.
    pub fn layer(&self, timestep: usize) -> impl Iterator<Item = (StateId, &Entry)> {
        self.layers
            .get(timestep)
            .into_iter()
            .flat_map(|l| l.entries.iter().map(|(s, e)| (*s, e)))
    }

    pub fn layer_len(&self, timestep: usize) -> usize {
        self.layers.get(timestep).map_or(0, |l| l.entries.len())
    }

    /// Number of layers allocated.
    pub fn timesteps(&self) -> usize {
        self.layers.len()
    }

    /// Total number of entries across all layers.
    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best entry of a layer among states passing `accept`: highest score,
    /// then fewest moves, then lowest state id.
    pub fn best_in_layer(
        &self,
        timestep: usize,
        accept: impl Fn(StateId) -> bool,
    ) -> Option<(StateId, LogProb)> {
        let mut best: Option<(StateId, &Entry)> = None;
        for (state, entry) in self.layer(timestep) {
            if !accept(state) {
                continue;
            }
            let better = match best {
                None => true,
                Some((s, e)) => finish_order((state, entry), (s, e)) == Ordering::Greater,
            };
            if better {
                best = Some((state, entry));
            }
        }
        best.map(|(s, e)| (s, e.log_prob))
    }
}

/// Order two candidate end points of a search; `Greater` is preferred.
pub(crate) fn finish_order(a: (StateId, &Entry), b: (StateId, &Entry)) -> Ordering {
    a.1.log_prob
        .cmp(&b.1.log_prob)
        .then_with(|| b.1.depth.cmp(&a.1.depth))
        .then_with(|| b.0.cmp(&a.0))
}
