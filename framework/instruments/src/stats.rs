use std::time::Duration;

use crate::OperationRecord;

/// Running latency statistics for one operation id.
///
/// Latency figures only include operations that succeeded, errors are counted separately.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OperationStats {
    pub count: usize,
    pub errors: usize,
    total_micros: u128,
    min: Option<Duration>,
    max: Option<Duration>,
}

impl OperationStats {
    pub fn record(&mut self, operation_record: &OperationRecord) {
        self.count += 1;
        if operation_record.is_error {
            self.errors += 1;
            return;
        }

        let Some(elapsed) = operation_record.duration() else {
            return;
        };
        self.total_micros += elapsed.as_micros();
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = Some(self.max.map_or(elapsed, |m| m.max(elapsed)));
    }

    pub fn successes(&self) -> usize {
        self.count - self.errors
    }

    pub fn min_ms(&self) -> Option<f64> {
        self.min.map(as_ms)
    }

    pub fn max_ms(&self) -> Option<f64> {
        self.max.map(as_ms)
    }

    pub fn mean_ms(&self) -> Option<f64> {
        match self.successes() {
            0 => None,
            n => Some((self.total_micros as f64 / n as f64) / 1000.0),
        }
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.total_micros as f64 / 1000.0
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ms: u64, is_error: bool) -> OperationRecord {
        let mut record = OperationRecord::new("http_get");
        record.elapsed = Some(Duration::from_millis(ms));
        record.is_error = is_error;
        record
    }

    #[test]
    fn errors_are_excluded_from_latency() {
        let mut stats = OperationStats::default();
        stats.record(&record(10, false));
        stats.record(&record(30, false));
        stats.record(&record(5000, true));

        assert_eq!(3, stats.count);
        assert_eq!(1, stats.errors);
        assert_eq!(Some(10.0), stats.min_ms());
        assert_eq!(Some(30.0), stats.max_ms());
        assert_eq!(Some(20.0), stats.mean_ms());
    }

    #[test]
    fn only_errors_has_no_latency() {
        let mut stats = OperationStats::default();
        stats.record(&record(10, true));

        assert_eq!(None, stats.min_ms());
        assert_eq!(None, stats.mean_ms());
    }
}
