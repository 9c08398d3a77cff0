// Base-10 log-probability arithmetic.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A probability stored as its base-10 logarithm.
///
/// Path scores are sums of `LogProb`s, so long products of small
/// probabilities never underflow. The type is totally ordered through
/// [`f64::total_cmp`], which lets it key priority queues directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogProb(f64);

impl LogProb {
    /// `log10(1)`: the score of the empty path.
    pub const ONE: LogProb = LogProb(0.0);
    /// `log10(0)`: an impossible path.
    pub const ZERO: LogProb = LogProb(f64::NEG_INFINITY);

    /// Convert a probability. Zero maps to [`LogProb::ZERO`].
    #[inline]
    pub fn from_prob(p: f64) -> Self {
        LogProb(p.log10())
    }

    /// Wrap a value that is already a base-10 log.
    #[inline]
    pub const fn from_log10(value: f64) -> Self {
        LogProb(value)
    }

    #[inline]
    pub fn log10(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn to_prob(self) -> f64 {
        10f64.powf(self.0)
    }

    /// True when no path can carry this score.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }
}

impl Default for LogProb {
    fn default() -> Self {
        LogProb::ONE
    }
}

impl Add for LogProb {
    type Output = LogProb;

    #[inline]
    fn add(self, rhs: LogProb) -> LogProb {
        LogProb(self.0 + rhs.0)
    }
}

impl PartialEq for LogProb {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LogProb {}

impl PartialOrd for LogProb {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogProb {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for LogProb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns `true` when `p` is a usable probability in `[0, 1]`.
#[inline]
pub fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_and_zero() {
        assert_eq!(LogProb::from_prob(1.0), LogProb::ONE);
        assert!(LogProb::from_prob(0.0).is_zero());
        assert!(LogProb::ZERO < LogProb::from_prob(1e-300));
    }

    #[test]
    fn addition_multiplies_probabilities() {
        let p = LogProb::from_prob(0.1) + LogProb::from_prob(0.01);
        assert!((p.log10() + 3.0).abs() < 1e-12);
        assert!((p.to_prob() - 0.001).abs() < 1e-15);
    }

    #[test]
    fn zero_absorbs() {
        let p = LogProb::ZERO + LogProb::from_prob(0.5);
        assert!(p.is_zero());
    }

    #[test]
    fn ordering_is_total() {
        let mut v = vec![
            LogProb::from_prob(0.5),
            LogProb::ZERO,
            LogProb::ONE,
            LogProb::from_prob(0.25),
        ];
        v.sort();
        assert_eq!(v[0], LogProb::ZERO);
        assert_eq!(v[3], LogProb::ONE);
    }

    #[test]
    fn probability_range() {
        assert!(is_probability(0.0));
        assert!(is_probability(1.0));
        assert!(!is_probability(1.5));
        assert!(!is_probability(-0.1));
        assert!(!is_probability(f64::NAN));
    }
}
