mod checks;
mod report;
mod stats;

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub use checks::{CheckCounts, CheckTally};
pub use report::{InMemoryReporter, ReportCollector, ReportConfig, Reporter};
pub use stats::OperationStats;

/// A single timed operation, such as one HTTP request.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_id: String,
    pub started: Instant,
    pub elapsed: Option<Duration>,
    pub is_error: bool,
    pub attr: HashMap<String, String>,
}

impl OperationRecord {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            started: Instant::now(),
            elapsed: None,
            is_error: false,
            attr: HashMap::with_capacity(0),
        }
    }

    /// Attach an attribute, for example the path suffix that was requested.
    pub fn add_attr(&mut self, key: impl Into<String>, value: impl ToString) {
        self.attr.insert(key.into(), value.to_string());
    }

    /// Stop the clock on this operation.
    pub fn finish(&mut self, is_error: bool) {
        self.elapsed = Some(self.started.elapsed());
        self.is_error = is_error;
    }

    /// The recorded duration, or `None` if the operation has not finished.
    pub fn duration(&self) -> Option<Duration> {
        self.elapsed
    }
}

/// Finish the record based on the outcome of the operation and hand it to the reporter.
pub fn report_operation<T, E>(
    reporter: &Reporter,
    mut operation_record: OperationRecord,
    response: &Result<T, E>,
) {
    operation_record.finish(response.is_err());
    reporter.add_operation(&operation_record);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_operation_marks_errors() {
        let reporter = ReportConfig::default().init();

        let ok: Result<(), ()> = Ok(());
        report_operation(&reporter, OperationRecord::new("http_get"), &ok);
        let failed: Result<(), ()> = Err(());
        report_operation(&reporter, OperationRecord::new("http_get"), &failed);

        let stats = reporter.operation_stats();
        let get = stats.get("http_get").expect("stats for http_get");
        assert_eq!(2, get.count);
        assert_eq!(1, get.errors);
    }

    #[test]
    fn unfinished_record_has_no_duration() {
        let mut record = OperationRecord::new("http_get");
        assert!(record.duration().is_none());

        record.add_attr("suffix", "dev");
        record.finish(false);
        assert!(record.duration().is_some());
        assert_eq!(Some(&"dev".to_string()), record.attr.get("suffix"));
    }
}
