use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct GustScenarioCli {
    /// The number of virtual users to run
    #[clap(long)]
    pub agents: Option<usize>,

    /// How long to run the scenario for, for example `30s`, `500ms`, `2m` or `1m30s`
    #[clap(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// The reporter to use.
    #[arg(long, value_enum, default_value_t = ReporterOpt::InMemory)]
    pub reporter: ReporterOpt,

    /// Set the ID of this run
    ///
    /// If not set, a random ID is used.
    #[arg(long, short)]
    pub run_id: Option<String>,

    /// Append the run summary as a JSON line to this file
    #[arg(long)]
    pub summary_file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReporterOpt {
    /// Aggregate operations in memory and print summary tables when the run ends
    #[default]
    InMemory,
    /// Print nothing, the run summary is still returned
    Noop,
}

/// Parse a duration literal such as `30s`, `250ms`, `5m`, `1h` or `1m30s`.
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Duration cannot be empty");
    }

    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            anyhow::bail!("Expected a number in duration '{s}'");
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid number in duration '{s}': {e}"))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let part = match unit {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(60 * 60).map(Duration::from_secs),
            "" => anyhow::bail!("Missing unit in duration '{s}', use one of ms, s, m or h"),
            other => anyhow::bail!("Unknown unit '{other}' in duration '{s}', use one of ms, s, m or h"),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| anyhow::anyhow!("Duration too large: '{s}'"))?;
    }

    Ok(total)
}
