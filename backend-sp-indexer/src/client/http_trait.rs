use async_trait::async_trait;

use crate::error::Result;

/// Minimal async HTTP client trait that can be implemented with any HTTP library.
///
/// This allows consumers to bring their own HTTP client implementation
/// (hyper, surf, platform fetch APIs, ...). Only GET is needed to talk to the
/// indexer.
///
/// Implementations must report a `429 Too Many Requests` answer as
/// [`Error::RateLimited`](crate::error::Error::RateLimited), carrying the
/// `Retry-After` delay when the server sent one, and any other non-2xx answer
/// as [`Error::HttpStatus`](crate::error::Error::HttpStatus).
///
/// ```ignore
/// use async_trait::async_trait;
/// use backend_sp_indexer::{HttpClient, error::Result};
///
/// #[derive(Clone)]
/// struct MyHttpClient;
///
/// #[async_trait]
/// impl HttpClient for MyHttpClient {
///     async fn get(&self, url: &str, query_params: &[(&str, String)]) -> Result<String> {
///         // Build URL with query params and return the response body
///         Ok("response".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync + Clone {
    /// Perform a GET request with optional query parameters, returning the body.
    async fn get(&self, url: &str, query_params: &[(&str, String)]) -> Result<String>;
}
