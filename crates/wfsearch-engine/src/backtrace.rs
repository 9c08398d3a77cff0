// Winning path reconstruction from a filled state table.

use wfsearch_core::{Label, StateId};

use crate::DecodeError;
use crate::table::StateTable;

/// One position on a reconstructed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceStep {
    pub state: StateId,
    pub timestep: usize,
    /// Label written by the move into this position; `None` for the seed
    /// and for epsilon output.
    pub output: Option<Label>,
}

/// Follow predecessor links from `(timestep, state)` back to a seed entry.
///
/// Returns the path in forward order. Fails if the end pair was never
/// reached or the links do not terminate.
pub fn backtrace(
    table: &StateTable,
    state: StateId,
    timestep: usize,
) -> Result<Vec<TraceStep>, DecodeError> {
    // Every entry appears at most once on a well-formed chain.
    let limit = table.len() + 1;
    let mut path = Vec::new();
    let (mut cur, mut t) = (state, timestep);
    loop {
        let Some(entry) = table.get(t, cur) else {
            return Err(if path.is_empty() {
                DecodeError::Unreached {
                    state: state.0,
                    timestep,
                }
            } else {
                DecodeError::BrokenChain {
                    state: state.0,
                    timestep,
                }
            });
        };
        path.push(TraceStep {
            state: cur,
            timestep: t,
            output: entry.output,
        });
        if path.len() > limit {
            return Err(DecodeError::BrokenChain {
                state: state.0,
                timestep,
            });
        }
        match entry.pred {
            Some(pred) => {
                cur = pred.state;
                t = pred.timestep;
            }
            None => break,
        }
    }
    path.reverse();
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Backpointer, Entry};
    use wfsearch_core::{LogProb, SymbolId};

    fn link(state: u32, timestep: usize, out: u32, lp: f64) -> Entry {
        Entry {
            pred: Some(Backpointer {
                state: StateId(state),
                timestep,
            }),
            output: Some(Label::Symbol(SymbolId(out))),
            log_prob: LogProb::from_log10(lp),
            depth: 1,
        }
    }

    #[test]
    fn follows_links_back_to_the_seed() {
        let mut table = StateTable::new();
        table.update(0, StateId(0), Entry::seed(LogProb::ONE));
        table.update(1, StateId(1), link(0, 0, 7, -0.5));
        // Epsilon move within timestep 1.
        table.update(1, StateId(2), link(1, 1, 8, -0.7));
        table.update(2, StateId(3), link(2, 1, 9, -1.0));

        let path = backtrace(&table, StateId(3), 2).unwrap();
        let states: Vec<(u32, usize)> = path.iter().map(|s| (s.state.0, s.timestep)).collect();
        assert_eq!(states, vec![(0, 0), (1, 1), (2, 1), (3, 2)]);
        assert_eq!(path[0].output, None);
        assert_eq!(path[3].output, Some(Label::Symbol(SymbolId(9))));
    }

    #[test]
    fn unreached_end_is_an_error() {
        let table = StateTable::new();
        assert_eq!(
            backtrace(&table, StateId(4), 1),
            Err(DecodeError::Unreached {
                state: 4,
                timestep: 1
            })
        );
    }

    #[test]
    fn cyclic_links_are_detected() {
        let mut table = StateTable::new();
        table.update(0, StateId(0), link(1, 0, 0, -0.1));
        table.update(0, StateId(1), link(0, 0, 0, -0.1));
        assert!(matches!(
            backtrace(&table, StateId(0), 0),
            Err(DecodeError::BrokenChain { .. })
        ));
    }

    #[test]
    fn dangling_link_is_a_broken_chain() {
        let mut table = StateTable::new();
        table.update(1, StateId(1), link(5, 0, 0, -0.1));
        assert!(matches!(
            backtrace(&table, StateId(1), 1),
            Err(DecodeError::BrokenChain { .. })
        ));
    }
}
