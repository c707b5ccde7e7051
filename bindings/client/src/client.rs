use std::sync::Arc;
use std::time::Duration;

use gust_instruments::{report_operation, OperationRecord, Reporter};
use reqwest::header::HeaderMap;
use url::Url;

use crate::error::TransportError;

/// Operation id used when reporting GET requests.
pub const HTTP_GET_OPERATION: &str = "http_get";

/// What the checks need to know about a response. The body itself is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponseSummary {
    pub status: u16,
    pub body_len: usize,
}

/// An HTTP client that reports the duration and outcome of every request.
///
/// Cheap to clone, clones share the same connection pool and reporter.
#[derive(Debug, Clone)]
pub struct HttpClientInstrumented {
    client: reqwest::Client,
    reporter: Arc<Reporter>,
}

impl HttpClientInstrumented {
    /// Create a client that sends `default_headers` with every request and gives up on a request
    /// after `request_timeout`.
    pub fn new(
        default_headers: HeaderMap,
        request_timeout: Duration,
        reporter: Arc<Reporter>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(request_timeout)
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self { client, reporter })
    }

    /// Send a GET request and read the full body.
    ///
    /// Any HTTP status is a successful response here, deciding whether the status is acceptable is
    /// left to the caller. Only failures to get a complete response are errors.
    pub async fn get(&self, url: Url) -> Result<HttpResponseSummary, TransportError> {
        let mut operation_record = OperationRecord::new(HTTP_GET_OPERATION);
        operation_record.add_attr("path", url.path());

        let result = self.get_inner(url).await;
        if let Ok(response) = &result {
            operation_record.add_attr("status", response.status);
        }
        report_operation(&self.reporter, operation_record, &result);

        result
    }

    async fn get_inner(&self, url: Url) -> Result<HttpResponseSummary, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TransportError::from_send)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(TransportError::from_body)?;

        log::trace!("Received {status} with {} byte body", body.len());

        Ok(HttpResponseSummary {
            status,
            body_len: body.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::{HeaderMap as RequestHeaders, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use gust_instruments::ReportConfig;
    use reqwest::header::{HeaderValue, AUTHORIZATION};

    use super::*;

    async fn start_server() -> SocketAddr {
        async fn echo_auth(headers: RequestHeaders) -> (StatusCode, String) {
            match headers.get("authorization") {
                Some(value) => (StatusCode::OK, value.to_str().unwrap_or_default().to_string()),
                None => (StatusCode::UNAUTHORIZED, String::new()),
            }
        }

        let app = Router::new()
            .route("/pakaiwa/:env", get(echo_auth))
            .route("/empty", get(|| async { StatusCode::OK }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(headers: HeaderMap, reporter: Arc<Reporter>) -> HttpClientInstrumented {
        HttpClientInstrumented::new(headers, Duration::from_secs(5), reporter).unwrap()
    }

    #[tokio::test]
    async fn get_sends_default_headers_and_reports() {
        let addr = start_server().await;
        let reporter = Arc::new(ReportConfig::default().init());
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));

        let url = Url::parse(&format!("http://{addr}/pakaiwa/dev")).unwrap();
        let response = client(headers, reporter.clone()).get(url).await.unwrap();

        assert_eq!(200, response.status);
        assert_eq!("Bearer token".len(), response.body_len);

        let stats = reporter.operation_stats();
        assert_eq!(1, stats[HTTP_GET_OPERATION].count);
        assert_eq!(0, stats[HTTP_GET_OPERATION].errors);
    }

    #[tokio::test]
    async fn non_success_status_is_a_response() {
        let addr = start_server().await;
        let reporter = Arc::new(ReportConfig::default().init());

        let url = Url::parse(&format!("http://{addr}/pakaiwa/dev")).unwrap();
        let response = client(HeaderMap::new(), reporter).get(url).await.unwrap();

        assert_eq!(401, response.status);
        assert_eq!(0, response.body_len);
    }

    #[tokio::test]
    async fn empty_body_is_reported_as_zero_length() {
        let addr = start_server().await;
        let reporter = Arc::new(ReportConfig::default().init());

        let url = Url::parse(&format!("http://{addr}/empty")).unwrap();
        let response = client(HeaderMap::new(), reporter).get(url).await.unwrap();

        assert_eq!(
            HttpResponseSummary {
                status: 200,
                body_len: 0
            },
            response
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Bind and drop to find a port with nothing listening on it.
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let reporter = Arc::new(ReportConfig::default().init());

        let url = Url::parse(&format!("http://{addr}/pakaiwa/dev")).unwrap();
        let result = client(HeaderMap::new(), reporter.clone()).get(url).await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
        assert_eq!(1, reporter.operation_stats()[HTTP_GET_OPERATION].errors);
    }
}
