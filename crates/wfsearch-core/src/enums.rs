// Shared enums: search strategy selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Frontier discipline used by the decoder.
///
/// Both strategies return the same winning path and score on a well-formed
/// model; they differ only in how much of the state table gets filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Fill every timestep layer completely before moving to the next one.
    #[default]
    LayerSync,
    /// Expand the globally best pending (timestep, state) pair first and stop
    /// at the first accepting pop.
    BestFirst,
}

/// Error for an unrecognised strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown search strategy '{0}' (expected 'layer' or 'best-first')")]
pub struct ParseStrategyError(pub String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "layer" | "layer-sync" | "bfs" | "viterbi" => Ok(Strategy::LayerSync),
            "best-first" | "bestfirst" | "dijkstra" => Ok(Strategy::BestFirst),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LayerSync => f.write_str("layer"),
            Strategy::BestFirst => f.write_str("best-first"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("layer".parse(), Ok(Strategy::LayerSync));
        assert_eq!("Best-First".parse(), Ok(Strategy::BestFirst));
        assert_eq!("dijkstra".parse(), Ok(Strategy::BestFirst));
        assert!("astar".parse::<Strategy>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in [Strategy::LayerSync, Strategy::BestFirst] {
            assert_eq!(s.to_string().parse(), Ok(s));
        }
    }

    #[test]
    fn default_is_layer_sync() {
        assert_eq!(Strategy::default(), Strategy::LayerSync);
    }
}
