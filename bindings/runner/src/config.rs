use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gust_runner::ReporterOpt;
use rand::seq::SliceRandom;
use rand::Rng;
use url::Url;

/// Default pause between two iterations of the same virtual user.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Default time allowed for a single request, including reading the body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to drive one load run. Read once at startup and never modified.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of concurrent virtual users.
    pub concurrency: usize,
    /// How long new iterations are started for.
    pub duration: Duration,
    /// Base of every target URL, such as `http://localhost:8080/pakaiwa`.
    pub base_url: String,
    /// Sent as-is in the `Authorization` header, for example `Bearer <token>`.
    pub auth_token: String,
    /// Candidates for the last path segment, one is picked at random per iteration.
    pub path_suffixes: Vec<String>,
    pub pause: Duration,
    pub request_timeout: Duration,
    /// Seed for suffix selection. Each virtual user derives its own generator from it.
    pub seed: Option<u64>,
    pub scenario_name: String,
    pub reporter: ReporterOpt,
    pub no_progress: bool,
    pub run_id: Option<String>,
    /// Append the run summary to this JSONL file.
    pub summary_file: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        path_suffixes: Vec<String>,
    ) -> Self {
        Self {
            concurrency: 1,
            duration: Duration::from_secs(10),
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            path_suffixes,
            pause: DEFAULT_PAUSE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            seed: None,
            scenario_name: "http_get".to_string(),
            reporter: ReporterOpt::InMemory,
            no_progress: false,
            run_id: None,
            summary_file: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("concurrency must be at least 1")]
    ZeroConcurrency,
    #[display("at least one path suffix is required")]
    EmptyPathSuffixes,
    #[display("duration must be greater than zero")]
    ZeroDuration,
    #[display("request timeout must be greater than zero")]
    ZeroRequestTimeout,
    #[display("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[display("path suffix '{suffix}' does not form a valid URL: {reason}")]
    InvalidPathSuffix { suffix: String, reason: String },
    #[display("auth token cannot be sent as a header value")]
    InvalidAuthToken,
}

/// A validated [RunConfig] with every target URL resolved.
#[derive(Debug)]
pub struct RunHandle {
    config: Arc<RunConfig>,
    targets: Vec<Url>,
}

impl RunHandle {
    pub fn config(&self) -> &Arc<RunConfig> {
        &self.config
    }

    /// Target URLs in the same order as [RunConfig::path_suffixes].
    pub fn targets(&self) -> &[Url] {
        &self.targets
    }

    /// Pick a target uniformly at random. Repeats are allowed.
    pub fn pick_target<R: Rng + ?Sized>(&self, rng: &mut R) -> &Url {
        self.targets
            .choose(rng)
            .expect("configure rejects an empty suffix list")
    }
}

/// Validate the configuration and resolve the target URLs.
pub fn configure(config: RunConfig) -> Result<RunHandle, ConfigError> {
    if config.concurrency == 0 {
        return Err(ConfigError::ZeroConcurrency);
    }
    if config.path_suffixes.is_empty() {
        return Err(ConfigError::EmptyPathSuffixes);
    }
    if config.duration.is_zero() {
        return Err(ConfigError::ZeroDuration);
    }
    if config.request_timeout.is_zero() {
        return Err(ConfigError::ZeroRequestTimeout);
    }
    if http_client_instrumented::prelude::HeaderValue::from_str(&config.auth_token).is_err() {
        return Err(ConfigError::InvalidAuthToken);
    }

    let parsed = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: config.base_url.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    let base = config.base_url.trim_end_matches('/');
    let targets = config
        .path_suffixes
        .iter()
        .map(|suffix| {
            Url::parse(&format!("{base}/{suffix}")).map_err(|e| ConfigError::InvalidPathSuffix {
                suffix: suffix.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RunHandle {
        config: Arc::new(config),
        targets,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn envs() -> Vec<String> {
        vec!["dev".to_string(), "prd".to_string(), "aws".to_string()]
    }

    fn valid_config() -> RunConfig {
        RunConfig::new("http://localhost:8080/pakaiwa", "Bearer secret", envs())
    }

    #[test]
    fn targets_follow_suffix_order() {
        let handle = configure(valid_config()).unwrap();

        let targets = handle
            .targets()
            .iter()
            .map(Url::as_str)
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                "http://localhost:8080/pakaiwa/dev",
                "http://localhost:8080/pakaiwa/prd",
                "http://localhost:8080/pakaiwa/aws",
            ],
            targets
        );
    }

    #[test]
    fn trailing_slash_on_base_url_is_tolerated() {
        let mut config = valid_config();
        config.base_url = "http://localhost:8080/pakaiwa/".to_string();
        config.path_suffixes = vec!["dev".to_string()];

        let handle = configure(config).unwrap();
        assert_eq!("http://localhost:8080/pakaiwa/dev", handle.targets()[0].as_str());
    }

    #[test]
    fn reject_zero_concurrency() {
        let config = valid_config().with_concurrency(0);
        assert_eq!(ConfigError::ZeroConcurrency, configure(config).unwrap_err());
    }

    #[test]
    fn reject_empty_suffixes() {
        let config = RunConfig::new("http://localhost:8080/pakaiwa", "Bearer secret", vec![]);
        assert_eq!(ConfigError::EmptyPathSuffixes, configure(config).unwrap_err());
    }

    #[test]
    fn reject_zero_duration() {
        let config = valid_config().with_duration(Duration::ZERO);
        assert_eq!(ConfigError::ZeroDuration, configure(config).unwrap_err());
    }

    #[test]
    fn reject_zero_request_timeout() {
        let config = valid_config().with_request_timeout(Duration::ZERO);
        assert_eq!(ConfigError::ZeroRequestTimeout, configure(config).unwrap_err());
    }

    #[test]
    fn reject_invalid_base_url() {
        let mut config = valid_config();
        config.base_url = "localhost:8080/pakaiwa".to_string();
        assert!(matches!(
            configure(config).unwrap_err(),
            ConfigError::InvalidBaseUrl { .. }
        ));

        let mut config = valid_config();
        config.base_url = "ftp://localhost/pakaiwa".to_string();
        assert!(matches!(
            configure(config).unwrap_err(),
            ConfigError::InvalidBaseUrl { .. }
        ));
    }

    #[test]
    fn reject_auth_token_with_newline() {
        let mut config = valid_config();
        config.auth_token = "Bearer a\nb".to_string();
        assert_eq!(ConfigError::InvalidAuthToken, configure(config).unwrap_err());
    }

    #[test]
    fn zero_pause_is_allowed() {
        assert!(configure(valid_config().with_pause(Duration::ZERO)).is_ok());
    }

    #[test]
    fn picks_are_roughly_uniform() {
        let handle = configure(valid_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let draws = 30_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..draws {
            *counts
                .entry(handle.pick_target(&mut rng).path().to_string())
                .or_default() += 1;
        }

        assert_eq!(3, counts.len());
        for count in counts.values() {
            let share = *count as f64 / draws as f64;
            assert!((share - 1.0 / 3.0).abs() < 0.02, "share was {share}");
        }
    }

    #[test]
    fn same_seed_gives_same_picks() {
        let handle = configure(valid_config()).unwrap();
        let mut first = StdRng::seed_from_u64(7);
        let mut second = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            assert_eq!(
                handle.pick_target(&mut first),
                handle.pick_target(&mut second)
            );
        }
    }
}
