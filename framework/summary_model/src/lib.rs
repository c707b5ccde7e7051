use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Read, Write};
use std::path::Path;

/// Pass and fail counts of one named check across the whole run
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }
}

/// Latency of one operation type, successful operations only
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub errors: usize,
    pub min_ms: Option<f64>,
    pub mean_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner unless one was configured. Unique for each run.
    pub run_id: String,
    /// The name of the scenario that was run
    pub scenario_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The duration that the run was configured with, in milliseconds
    pub run_duration_ms: u64,
    /// The number of virtual users configured
    pub vu_count: usize,
    /// The number of virtual users still running at the end of the run
    ///
    /// Less than [RunSummary::vu_count] if an agent setup hook failed.
    pub vu_end_count: usize,
    /// Number of behaviour cycles completed by all virtual users
    pub total_iterations: u64,
    /// Results of each named check
    pub checks: BTreeMap<String, CheckSummary>,
    /// Latency per operation id
    pub latency: BTreeMap<String, LatencySummary>,
    /// Configuration values that identify what was tested, such as the target URL
    ///
    /// Secrets such as the auth token are never included.
    pub env: HashMap<String, String>,
    /// The version of Gust that was used for this run
    pub gust_version: String,
}

impl RunSummary {
    /// Create a new run summary
    pub fn new(
        run_id: String,
        scenario_name: String,
        started_at: i64,
        run_duration_ms: u64,
        vu_count: usize,
        gust_version: String,
    ) -> Self {
        Self {
            run_id,
            scenario_name,
            started_at,
            run_duration_ms,
            vu_count,
            vu_end_count: 0,
            total_iterations: 0,
            checks: BTreeMap::new(),
            latency: BTreeMap::new(),
            env: HashMap::with_capacity(0),
            gust_version,
        }
    }

    /// Set the number of virtual users still running at the end of the run
    pub fn set_vu_end_count(&mut self, vu_end_count: usize) {
        self.vu_end_count = vu_end_count;
    }

    /// Set the number of completed iterations
    pub fn set_total_iterations(&mut self, total_iterations: u64) {
        self.total_iterations = total_iterations;
    }

    /// Add the result of a check
    pub fn add_check(&mut self, name: String, summary: CheckSummary) {
        self.checks.insert(name, summary);
    }

    /// Add the latency figures of an operation
    pub fn add_latency(&mut self, operation_id: String, summary: LatencySummary) {
        self.latency.insert(operation_id, summary);
    }

    /// Add an environment variable
    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// Total number of failed check evaluations
    pub fn total_check_failures(&self) -> u64 {
        self.checks.values().map(|c| c.fails).sum()
    }

    /// The highest failure rate of any check, `0.0` if no check was evaluated
    pub fn check_failure_rate(&self) -> f64 {
        self.checks
            .values()
            .filter(|c| c.total() > 0)
            .map(|c| c.fails as f64 / c.total() as f64)
            .fold(0.0, f64::max)
    }

    /// Whether every check stayed at or below `max_failure_rate`
    pub fn passed(&self, max_failure_rate: f64) -> bool {
        self.check_failure_rate() <= max_failure_rate
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to uniquely identify the configuration used to run the scenario.
    /// It uses the
    ///     - Scenario name
    ///     - Run duration
    ///     - Virtual user count
    ///     - Selected environment variables
    ///     - Gust version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.scenario_name.as_bytes());
        Digest::update(&mut hasher, self.run_duration_ms.to_le_bytes());
        Digest::update(&mut hasher, self.vu_count.to_le_bytes());
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.gust_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: impl AsRef<Path>) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
