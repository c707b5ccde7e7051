mod client;
mod error;

pub mod prelude {
    pub use crate::client::{HttpClientInstrumented, HttpResponseSummary, HTTP_GET_OPERATION};
    pub use crate::error::TransportError;

    // Re-exported so that users of this wrapper don't need to depend on the client crate directly.
    pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
}
