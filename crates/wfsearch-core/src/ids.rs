// Opaque identifiers for states and symbols, and the labels carried by arcs.

use serde::{Deserialize, Serialize};

/// Identifier of a state inside one automaton. Only meaningful together with
/// the automaton's state [`Interner`](crate::Interner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub u32);

/// Identifier of an input/output/observation symbol inside one automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an arc writes to the output tape.
///
/// Transducer arcs write a symbol (or nothing, for epsilon output). Tagger
/// steps write the label of the state they enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Symbol(SymbolId),
    State(StateId),
}
