//! Caller-owned state that keeps counters and running totals coherent
//! across render calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stored position of one auto-increment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// Last value handed out
    pub value: i64,
    /// Step applied on the next advance
    pub step: i64,
    /// Start value the sequence was opened with
    pub initial_start: i64,
}

/// Long-lived store for the stateful expressions.
///
/// Entries are only ever inserted or updated in place; the whole state is
/// discarded (or [`reset`](RenderState::reset)) to start over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub(crate) counters: HashMap<String, CounterState>,
    pub(crate) accumulators: HashMap<String, f64>,
}

impl RenderState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every counter and running total
    pub fn reset(&mut self) {
        self.counters.clear();
        self.accumulators.clear();
    }

    /// Look up an auto-increment sequence by its key
    pub fn counter(&self, key: &str) -> Option<&CounterState> {
        self.counters.get(key)
    }

    pub fn counters(&self) -> &HashMap<String, CounterState> {
        &self.counters
    }

    pub fn accumulators(&self) -> &HashMap<String, f64> {
        &self.accumulators
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.accumulators.is_empty()
    }
}

/// Key identifying one accumulator: start plus the ordered step bounds.
pub(crate) fn accumulator_key(start: f64, min_step: f64, max_step: f64) -> String {
    format!("{}_{}_{}", start, min_step, max_step)
}

/// Deduplication map living for exactly one render call.
///
/// Only auto-increment consults it; accumulators advance on every occurrence.
#[derive(Debug, Default)]
pub(crate) struct CallCache {
    auto_increment: HashMap<(String, i64, i64), i64>,
}

impl CallCache {
    pub(crate) fn auto_increment(&self, key: &str, start: i64, step: i64) -> Option<i64> {
        self.auto_increment
            .get(&(key.to_string(), start, step))
            .copied()
    }

    pub(crate) fn remember_auto_increment(&mut self, key: &str, start: i64, step: i64, value: i64) {
        self.auto_increment
            .insert((key.to_string(), start, step), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = RenderState::new();
        assert!(state.is_empty());
        assert!(state.counter("x").is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = RenderState::new();
        state.counters.insert(
            "x".to_string(),
            CounterState {
                value: 3,
                step: 1,
                initial_start: 1,
            },
        );
        state.accumulators.insert(accumulator_key(1.0, 1.0, 2.0), 4.5);
        assert!(!state.is_empty());

        state.reset();
        assert!(state.is_empty());
    }

    #[test]
    fn test_accumulator_key_uses_shortest_number_form() {
        assert_eq!(accumulator_key(100.0, 1.0, 5.0), "100_1_5");
        assert_eq!(accumulator_key(-0.5, 1.25, 2.0), "-0.5_1.25_2");
    }

    #[test]
    fn test_call_cache_is_keyed_by_full_triple() {
        let mut cache = CallCache::default();
        cache.remember_auto_increment("x", 10, 5, 10);
        assert_eq!(cache.auto_increment("x", 10, 5), Some(10));
        assert_eq!(cache.auto_increment("x", 10, 1), None);
        assert_eq!(cache.auto_increment("y", 10, 5), None);
    }

    #[test]
    fn test_state_serializes_to_json() {
        let mut state = RenderState::new();
        state.counters.insert(
            "order".to_string(),
            CounterState {
                value: 7,
                step: 2,
                initial_start: 1,
            },
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["counters"]["order"]["value"], 7);
        assert_eq!(json["counters"]["order"]["initial_start"], 1);

        let back: RenderState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
