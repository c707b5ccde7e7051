/// A request that did not produce an HTTP response.
///
/// These are recorded as failed iterations, they never stop a run.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("Failed to connect: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl TransportError {
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Request(err)
        }
    }

    pub(crate) fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Body(err)
        }
    }
}
