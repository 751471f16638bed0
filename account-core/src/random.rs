//! Pseudo-random sources for the simulated balance fetch

use parking_lot::Mutex;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of integers in an inclusive range
pub trait RandomSource: Send + Sync {
    /// Draw a value in `low..=high`
    fn random(&self, low: i64, high: i64) -> i64;
}

/// Thread-local RNG backed source
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn random(&self, low: i64, high: i64) -> i64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Replays queued values in order and counts every draw.
///
/// Once the queue is empty it falls back to `low`, which is the failure flag
/// for the success/failure draw.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    values: Mutex<VecDeque<i64>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Create source that replays `values`
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue one more value
    pub fn push(&self, value: i64) {
        self.values.lock().push_back(value);
    }

    /// Number of draws so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Values not yet drawn
    pub fn remaining(&self) -> usize {
        self.values.lock().len()
    }
}

impl RandomSource for ScriptedSource {
    fn random(&self, low: i64, _high: i64) -> i64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.values.lock().pop_front().unwrap_or(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_stays_in_range() {
        let source = ThreadRngSource;
        for _ in 0..1_000 {
            let value = source.random(0, 100);
            assert!((0..=100).contains(&value));
        }
        assert_eq!(source.random(5, 5), 5);
    }

    #[test]
    fn test_thread_rng_accepts_reversed_bounds() {
        let value = ThreadRngSource.random(10, 1);
        assert!((1..=10).contains(&value));
    }

    #[test]
    fn test_scripted_replays_in_order() {
        let source = ScriptedSource::new([77, 1]);
        assert_eq!(source.random(0, 100), 77);
        assert_eq!(source.random(0, 1), 1);
        assert_eq!(source.calls(), 2);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_scripted_falls_back_to_low() {
        let source = ScriptedSource::default();
        assert_eq!(source.random(0, 1), 0);
        source.push(9);
        assert_eq!(source.random(0, 100), 9);
        assert_eq!(source.calls(), 2);
    }
}
