use std::fmt;

use gust_runner::prelude::Reporter;
use http_client_instrumented::prelude::{HttpResponseSummary, TransportError};

/// The named assertions evaluated against every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Status200,
    BodyNotEmpty,
}

impl Check {
    pub const ALL: [Check; 2] = [Check::Status200, Check::BodyNotEmpty];

    pub fn name(&self) -> &'static str {
        match self {
            Check::Status200 => "status 200",
            Check::BodyNotEmpty => "body not empty",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one iteration, consumed as soon as its checks are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationResult {
    /// `None` when no response was received.
    pub http_status: Option<u16>,
    pub body_length: usize,
}

impl IterationResult {
    pub fn transport_failure() -> Self {
        Self {
            http_status: None,
            body_length: 0,
        }
    }

    pub fn passed(&self, check: Check) -> bool {
        match check {
            Check::Status200 => self.http_status == Some(200),
            Check::BodyNotEmpty => self.http_status.is_some() && self.body_length > 0,
        }
    }

    /// Count the result of every check.
    pub fn record(&self, reporter: &Reporter) {
        for check in Check::ALL {
            reporter.add_check(check.name(), self.passed(check));
        }
    }
}

impl From<&Result<HttpResponseSummary, TransportError>> for IterationResult {
    fn from(result: &Result<HttpResponseSummary, TransportError>) -> Self {
        match result {
            Ok(response) => Self {
                http_status: Some(response.status),
                body_length: response.body_len,
            },
            Err(_) => Self::transport_failure(),
        }
    }
}
