// Search configuration: frontier strategy and per-call budgets.

use std::time::{Duration, Instant};

use wfsearch_core::Strategy;

/// Limits imposed on a single decode call. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchBudget {
    /// Maximum number of state expansions.
    pub max_expansions: Option<u64>,
    /// Wall-clock limit measured from the start of the call.
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_expansions(mut self, n: u64) -> Self {
        self.max_expansions = Some(n);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

/// Everything a [`Decoder`](crate::Decoder) needs besides the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchConfig {
    pub strategy: Strategy,
    pub budget: SearchBudget,
}

impl SearchConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            budget: SearchBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// The budget ran out after this many expansions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted {
    pub expansions: u64,
}

/// Clock checks happen once per this many expansions.
const CLOCK_INTERVAL: u64 = 64;

/// Running expansion counter checked against a [`SearchBudget`].
#[derive(Debug)]
pub(crate) struct BudgetMeter {
    expansions: u64,
    max_expansions: Option<u64>,
    deadline: Option<Instant>,
}

impl BudgetMeter {
    pub(crate) fn start(budget: &SearchBudget) -> Self {
        Self {
            expansions: 0,
            max_expansions: budget.max_expansions,
            deadline: budget.time_limit.map(|limit| Instant::now() + limit),
        }
    }

    /// Account for one expansion. Fails once the budget is spent.
    #[inline]
    pub(crate) fn tick(&mut self) -> Result<(), Exhausted> {
        if let Some(max) = self.max_expansions {
            if self.expansions >= max {
                return Err(self.exhausted());
            }
        }
        self.expansions += 1;
        if let Some(deadline) = self.deadline {
            if self.expansions % CLOCK_INTERVAL == 1 && Instant::now() >= deadline {
                return Err(self.exhausted());
            }
        }
        Ok(())
    }

    pub(crate) fn expansions(&self) -> u64 {
        self.expansions
    }

    fn exhausted(&self) -> Exhausted {
        Exhausted {
            expansions: self.expansions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unbounded_layer_sync() {
        let config = SearchConfig::default();
        assert_eq!(config.strategy, Strategy::LayerSync);
        assert_eq!(config.budget, SearchBudget::unbounded());
    }

    #[test]
    fn expansion_limit_trips_after_max() {
        let budget = SearchBudget::unbounded().with_max_expansions(2);
        let mut meter = BudgetMeter::start(&budget);
        assert!(meter.tick().is_ok());
        assert!(meter.tick().is_ok());
        assert_eq!(meter.tick(), Err(Exhausted { expansions: 2 }));
    }

    #[test]
    fn zero_time_limit_trips_on_first_check() {
        let budget = SearchBudget::unbounded().with_time_limit(Duration::ZERO);
        let mut meter = BudgetMeter::start(&budget);
        assert!(meter.tick().is_err());
    }

    #[test]
    fn unbounded_meter_counts() {
        let mut meter = BudgetMeter::start(&SearchBudget::unbounded());
        for _ in 0..1000 {
            meter.tick().unwrap();
        }
        assert_eq!(meter.expansions(), 1000);
    }
}
