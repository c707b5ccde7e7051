use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gust_runner::{parse_duration, ReporterOpt};

use crate::config::RunConfig;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
pub struct HttpScenarioCli {
    /// Base URL of the endpoint under test. A path suffix is appended for every request.
    #[arg(long, default_value = "http://localhost:8080/pakaiwa")]
    pub base_url: String,

    /// Value of the `Authorization` header, for example `Bearer <token>`.
    #[arg(long, env = "GUST_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// Path suffixes to pick from at random, repeat the flag or separate values with commas.
    #[arg(long = "env", value_delimiter = ',', default_value = "dev,prd,aws")]
    pub envs: Vec<String>,

    /// The number of virtual users to run.
    #[arg(long, default_value_t = 100)]
    pub vus: usize,

    /// How long to run for, for example `30s`, `10s` or `1m30s`.
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub duration: Duration,

    /// Pause between two iterations of the same virtual user.
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    pub pause: Duration,

    /// Time allowed for a single request, including reading the body.
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub request_timeout: Duration,

    /// Seed for picking path suffixes, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// The reporter to use.
    #[arg(long, value_enum, default_value_t = ReporterOpt::InMemory)]
    pub reporter: ReporterOpt,

    /// Set the ID of this run
    ///
    /// If not set, a random ID is used.
    #[arg(long, short)]
    pub run_id: Option<String>,

    /// Append the run summary as a JSON line to this file.
    #[arg(long)]
    pub summary_file: Option<PathBuf>,

    /// Exit with an error if any check fails for more than this fraction of iterations, between 0 and 1.
    #[arg(long, value_parser = parse_failure_rate)]
    pub max_failure_rate: Option<f64>,
}

impl HttpScenarioCli {
    /// Turn the command line into a run configuration for the named scenario.
    pub fn into_run_config(self, scenario_name: &str) -> RunConfig {
        let mut config = RunConfig::new(self.base_url, self.auth_token, self.envs)
            .with_concurrency(self.vus)
            .with_duration(self.duration)
            .with_pause(self.pause)
            .with_request_timeout(self.request_timeout);
        config.seed = self.seed;
        config.scenario_name = scenario_name.to_string();
        config.reporter = self.reporter;
        config.no_progress = self.no_progress;
        config.run_id = self.run_id;
        config.summary_file = self.summary_file;
        config
    }
}

fn parse_failure_rate(s: &str) -> anyhow::Result<f64> {
    let rate: f64 = s
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid failure rate '{s}': {e}"))?;
    if !(0.0..=1.0).contains(&rate) {
        anyhow::bail!("Failure rate must be between 0 and 1, got {rate}");
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_the_full_profile() {
        let cli = HttpScenarioCli::try_parse_from(["gust", "--auth-token", "Bearer secret"]).unwrap();
        let config = cli.into_run_config("env_endpoint_get");

        assert_eq!("http://localhost:8080/pakaiwa", config.base_url);
        assert_eq!(vec!["dev", "prd", "aws"], config.path_suffixes);
        assert_eq!(100, config.concurrency);
        assert_eq!(Duration::from_secs(30), config.duration);
        assert_eq!(Duration::from_secs(1), config.pause);
        assert_eq!(Duration::from_secs(30), config.request_timeout);
        assert_eq!("env_endpoint_get", config.scenario_name);
    }

    #[test]
    fn smoke_profile_from_flags() {
        let cli = HttpScenarioCli::try_parse_from([
            "gust",
            "--auth-token",
            "Bearer secret",
            "--env",
            "dev",
            "--vus",
            "10",
            "--duration",
            "10s",
            "--seed",
            "3",
            "--max-failure-rate",
            "0.1",
        ])
        .unwrap();
        assert_eq!(Some(0.1), cli.max_failure_rate);

        let config = cli.into_run_config("env_endpoint_get");
        assert_eq!(vec!["dev"], config.path_suffixes);
        assert_eq!(10, config.concurrency);
        assert_eq!(Duration::from_secs(10), config.duration);
        assert_eq!(Some(3), config.seed);
    }

    #[test]
    fn envs_can_be_repeated() {
        let cli = HttpScenarioCli::try_parse_from([
            "gust",
            "--auth-token",
            "t",
            "--env",
            "dev",
            "--env",
            "aws",
        ])
        .unwrap();
        assert_eq!(vec!["dev", "aws"], cli.envs);
    }

    #[test]
    fn reject_failure_rate_out_of_range() {
        assert!(parse_failure_rate("1.5").is_err());
        assert!(parse_failure_rate("-0.1").is_err());
        assert!(parse_failure_rate("abc").is_err());
        assert_eq!(0.0, parse_failure_rate("0").unwrap());
    }
}
