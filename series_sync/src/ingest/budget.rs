//! Per-process accounting of upstream calls.

use serde::Serialize;

/// Emitted once when the call count reaches a warning threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetWarning {
    /// Calls made so far, including the one that crossed the threshold.
    pub calls_made: u32,
    /// Calls left in the allowance.
    pub remaining: u32,
}

/// Counts upstream calls against a daily allowance.
///
/// Advisory only: it never blocks or delays a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallBudget {
    allowance: u32,
    warn_at: Vec<u32>,
    calls: u32,
}

impl Default for CallBudget {
    /// The vendor free tier: 25 calls, warnings at 10 and 20.
    fn default() -> Self {
        Self::new(25, vec![10, 20])
    }
}

impl CallBudget {
    /// Budget with an allowance and warning thresholds (any order).
    pub fn new(allowance: u32, mut warn_at: Vec<u32>) -> Self {
        warn_at.sort_unstable();
        warn_at.dedup();
        Self {
            allowance,
            warn_at,
            calls: 0,
        }
    }

    /// Counts one call. Returns a warning when this call lands on a
    /// threshold; the count only grows, so each threshold fires once.
    pub fn record_call(&mut self) -> Option<BudgetWarning> {
        self.calls = self.calls.saturating_add(1);
        self.warn_at
            .binary_search(&self.calls)
            .ok()
            .map(|_| BudgetWarning {
                calls_made: self.calls,
                remaining: self.remaining(),
            })
    }

    /// Calls made so far.
    pub fn calls_made(&self) -> u32 {
        self.calls
    }

    /// Calls left before the allowance is spent.
    pub fn remaining(&self) -> u32 {
        self.allowance.saturating_sub(self.calls)
    }

    /// Configured allowance.
    pub fn allowance(&self) -> u32 {
        self.allowance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_fire_once_per_threshold() {
        let mut budget = CallBudget::default();
        let warnings: Vec<_> = (0..30).filter_map(|_| budget.record_call()).collect();
        assert_eq!(
            warnings,
            vec![
                BudgetWarning { calls_made: 10, remaining: 15 },
                BudgetWarning { calls_made: 20, remaining: 5 },
            ]
        );
        assert_eq!(budget.remaining(), 0);
        assert_eq!(budget.calls_made(), 30);
    }

    #[test]
    fn thresholds_are_normalized() {
        let mut budget = CallBudget::new(5, vec![2, 1, 2]);
        assert!(budget.record_call().is_some());
        assert!(budget.record_call().is_some());
        assert!(budget.record_call().is_none());
    }
}
