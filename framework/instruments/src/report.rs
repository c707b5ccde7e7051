mod in_memory_reporter;

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::checks::{CheckCounts, CheckTally};
use crate::stats::OperationStats;
use crate::OperationRecord;

pub use in_memory_reporter::InMemoryReporter;

pub trait ReportCollector {
    fn add_operation(&mut self, operation_record: &OperationRecord);

    /// Called once at the end of the run with the final check counts.
    fn finalize(&self, checks: &BTreeMap<String, CheckCounts>);
}

/// Choose which collectors the [Reporter] fans out to.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportConfig {
    in_memory: bool,
}

impl ReportConfig {
    /// Aggregate operations in memory and print summary tables at the end of the run.
    pub fn enable_in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors: Vec<Mutex<Box<dyn ReportCollector + Send>>> = Vec::new();
        if self.in_memory {
            collectors.push(Mutex::new(Box::new(InMemoryReporter::new())));
        }

        Reporter {
            collectors,
            operation_stats: Mutex::new(HashMap::new()),
            checks: CheckTally::new(),
        }
    }
}

/// Shared between every agent. Tracks operation latency and check results regardless of which
/// collectors are enabled so that the run summary can always be built.
pub struct Reporter {
    collectors: Vec<Mutex<Box<dyn ReportCollector + Send>>>,
    operation_stats: Mutex<HashMap<String, OperationStats>>,
    checks: CheckTally,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("collectors", &self.collectors.len())
            .field("checks", &self.checks)
            .finish()
    }
}

impl Reporter {
    pub fn add_operation(&self, operation_record: &OperationRecord) {
        self.operation_stats
            .lock()
            .entry(operation_record.operation_id.clone())
            .or_default()
            .record(operation_record);

        for collector in &self.collectors {
            collector.lock().add_operation(operation_record);
        }
    }

    pub fn register_check(&self, name: &str) {
        self.checks.register(name);
    }

    pub fn add_check(&self, name: &str, passed: bool) {
        self.checks.record(name, passed);
    }

    pub fn checks(&self) -> &CheckTally {
        &self.checks
    }

    pub fn operation_stats(&self) -> HashMap<String, OperationStats> {
        self.operation_stats.lock().clone()
    }

    pub fn finalize(&self) {
        let checks = self.checks.snapshot();
        for collector in &self.collectors {
            collector.lock().finalize(&checks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_are_tracked_without_collectors() {
        let reporter = ReportConfig::default().init();
        reporter.register_check("body not empty");
        reporter.add_check("status 200", false);

        let snapshot = reporter.checks().snapshot();
        assert_eq!(2, snapshot.len());
        assert_eq!(1, snapshot["status 200"].fails);
        assert_eq!(0, snapshot["body not empty"].total());

        // Nothing to print, must not panic.
        reporter.finalize();
    }
}
