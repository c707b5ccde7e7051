use std::sync::Arc;

use gust_runner::prelude::UserValuesConstraint;
use http_client_instrumented::prelude::HttpClientInstrumented;

use crate::config::RunHandle;

/// HTTP specific runner context values.
#[derive(Debug, Default)]
pub struct HttpRunnerContext {
    pub(crate) handle: Option<Arc<RunHandle>>,
    pub(crate) client: Option<HttpClientInstrumented>,
}

impl UserValuesConstraint for HttpRunnerContext {}

impl HttpRunnerContext {
    pub(crate) fn new(handle: Arc<RunHandle>) -> Self {
        Self {
            handle: Some(handle),
            client: None,
        }
    }

    pub fn handle(&self) -> anyhow::Result<&Arc<RunHandle>> {
        self.handle
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No run configuration, was the scenario started with `run`?"))
    }

    pub fn client(&self) -> anyhow::Result<&HttpClientInstrumented> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("HTTP client is not set, did the setup hook run?"))
    }
}
