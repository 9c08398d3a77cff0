//! Shared types for weighted finite-state search.
//!
//! - [`ids`] -- opaque state / symbol identifiers and arc labels
//! - [`symbols`] -- string interner mapping labels to identifiers
//! - [`logprob`] -- base-10 log-probability arithmetic
//! - [`enums`] -- search strategy selection
//! - [`path`] -- winning paths and decode outcomes

pub mod enums;
pub mod ids;
pub mod logprob;
pub mod path;
pub mod symbols;

pub use enums::Strategy;
pub use ids::{Label, StateId, SymbolId};
pub use logprob::LogProb;
pub use path::{Outcome, WinningPath};
pub use symbols::Interner;
