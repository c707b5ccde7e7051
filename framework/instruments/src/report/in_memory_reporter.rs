mod checks_table;
mod operations_table;

use std::collections::{BTreeMap, HashMap};

use tabled::settings::Style;
use tabled::Table;

use crate::checks::CheckCounts;
use crate::report::in_memory_reporter::checks_table::CheckRow;
use crate::report::in_memory_reporter::operations_table::OperationRow;
use crate::report::ReportCollector;
use crate::stats::OperationStats;
use crate::OperationRecord;

/// A very basic reporter that aggregates operations in memory and prints a summary of the
/// operations and checks at the end of the run.
/// Records are folded into per-operation statistics as they arrive and are not kept.
#[derive(Default)]
pub struct InMemoryReporter {
    operation_stats: HashMap<String, OperationStats>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn operation_rows(&self) -> Vec<OperationRow> {
        let mut rows = self
            .operation_stats
            .iter()
            .map(|(operation_id, stats)| OperationRow {
                operation_id: operation_id.clone(),
                total_operations: stats.count,
                errors: stats.errors,
                avg_time_ms: stats.mean_ms(),
                min_time_ms: stats.min_ms(),
                max_time_ms: stats.max_ms(),
                total_duration_ms: stats.total_duration_ms(),
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
        rows
    }

    fn print_summary_of_operations(&self) {
        println!("\nSummary of operations");
        let mut table = Table::new(self.operation_rows());
        table.with(Style::modern());
        println!("{table}");
    }

    fn print_summary_of_checks(&self, checks: &BTreeMap<String, CheckCounts>) {
        println!("\nSummary of checks");
        let rows = checks
            .iter()
            .map(|(name, counts)| CheckRow::new(name, counts))
            .collect::<Vec<_>>();
        let mut table = Table::new(rows);
        table.with(Style::modern());
        println!("{table}");
    }
}

impl ReportCollector for InMemoryReporter {
    fn add_operation(&mut self, operation_record: &OperationRecord) {
        match self.operation_stats.get_mut(&operation_record.operation_id) {
            Some(stats) => stats.record(operation_record),
            None => {
                let mut stats = OperationStats::default();
                stats.record(operation_record);
                self.operation_stats
                    .insert(operation_record.operation_id.clone(), stats);
            }
        }
    }

    fn finalize(&self, checks: &BTreeMap<String, CheckCounts>) {
        self.print_summary_of_operations();
        self.print_summary_of_checks(checks);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn rows_group_by_operation_id() {
        let mut reporter = InMemoryReporter::new();
        for (id, ms, is_error) in [
            ("http_get", 10, false),
            ("http_get", 20, false),
            ("http_get", 0, true),
            ("connect", 5, false),
        ] {
            let mut record = OperationRecord::new(id);
            record.elapsed = Some(Duration::from_millis(ms));
            record.is_error = is_error;
            reporter.add_operation(&record);
        }

        let rows = reporter.operation_rows();
        assert_eq!(2, rows.len());
        assert_eq!("connect", rows[0].operation_id);
        assert_eq!(3, rows[1].total_operations);
        assert_eq!(1, rows[1].errors);
        assert_eq!(Some(15.0), rows[1].avg_time_ms);
    }

    #[test]
    fn keeps_one_entry_per_operation_id() {
        let mut reporter = InMemoryReporter::new();
        for i in 0..10_000 {
            let mut record = OperationRecord::new("http_get");
            record.add_attr("path", format!("/pakaiwa/{i}"));
            record.finish(i % 10 == 0);
            reporter.add_operation(&record);
        }

        assert_eq!(1, reporter.operation_stats.len());
        let stats = &reporter.operation_stats["http_get"];
        assert_eq!(10_000, stats.count);
        assert_eq!(1_000, stats.errors);
    }

    #[test]
    fn finalize_with_only_errors_does_not_panic() {
        let mut reporter = InMemoryReporter::new();
        let mut record = OperationRecord::new("http_get");
        record.finish(true);
        reporter.add_operation(&record);

        reporter.finalize(&BTreeMap::new());
    }
}
