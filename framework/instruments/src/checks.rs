use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Pass and fail counts for one named check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckCounts {
    pub passes: u64,
    pub fails: u64,
}

impl CheckCounts {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of evaluations that failed, `0.0` when the check never ran.
    pub fn failure_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.fails as f64 / total as f64,
        }
    }
}

#[derive(Debug, Default)]
struct CheckCounter {
    passes: AtomicU64,
    fails: AtomicU64,
}

/// Concurrent tally of named checks.
///
/// Every agent thread records into the same tally. Counters are atomics so no update is lost,
/// and the map lock is only taken for writing the first time a check name is seen.
#[derive(Debug, Default)]
pub struct CheckTally {
    counters: RwLock<BTreeMap<String, Arc<CheckCounter>>>,
}

impl CheckTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a check appear in the summary even if it is never evaluated.
    pub fn register(&self, name: &str) {
        self.counter(name);
    }

    pub fn record(&self, name: &str, passed: bool) {
        let counter = self.counter(name);
        if passed {
            counter.passes.fetch_add(1, Ordering::Relaxed);
        } else {
            counter.fails.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> Option<CheckCounts> {
        self.counters.read().get(name).map(|c| Self::load(c))
    }

    pub fn snapshot(&self) -> BTreeMap<String, CheckCounts> {
        self.counters
            .read()
            .iter()
            .map(|(name, c)| (name.clone(), Self::load(c)))
            .collect()
    }

    fn counter(&self, name: &str) -> Arc<CheckCounter> {
        if let Some(counter) = self.counters.read().get(name) {
            return counter.clone();
        }

        self.counters
            .write()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn load(counter: &CheckCounter) -> CheckCounts {
        CheckCounts {
            passes: counter.passes.load(Ordering::Relaxed),
            fails: counter.fails.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_check_starts_at_zero() {
        let tally = CheckTally::new();
        tally.register("status 200");

        assert_eq!(Some(CheckCounts::default()), tally.get("status 200"));
        assert_eq!(None, tally.get("body not empty"));
    }

    #[test]
    fn failure_rate_of_unused_check_is_zero() {
        assert_eq!(0.0, CheckCounts::default().failure_rate());
        let counts = CheckCounts {
            passes: 3,
            fails: 1,
        };
        assert_eq!(0.25, counts.failure_rate());
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let tally = Arc::new(CheckTally::new());

        let handles = (0..8)
            .map(|i| {
                let tally = tally.clone();
                std::thread::spawn(move || {
                    for j in 0..1000 {
                        tally.record("status 200", (i + j) % 2 == 0);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let counts = tally.get("status 200").unwrap();
        assert_eq!(8000, counts.total());
        assert_eq!(4000, counts.passes);
        assert_eq!(4000, counts.fails);
    }
}
