use std::time::Duration;

use again::RetryPolicy;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;

/// Response statuses that trigger another attempt.
///
/// 104 is not an HTTP status (it is the errno for a connection reset) and
/// never matches a real response.
pub const RETRY_STATUS_CODES: [u16; 8] = [104, 408, 425, 429, 500, 502, 503, 504];

/// Retries allowed after the first attempt.
pub const MAX_RETRIES: usize = 4;

/// Shared HTTP client used by every height source.
///
/// Requests answered with one of [RETRY_STATUS_CODES] are re-sent up to
/// [MAX_RETRIES] times with no delay. Connection errors are handed straight
/// back to the caller. Once the retry budget is spent the last response is
/// returned untouched so the caller sees its status.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: usize,
}

/// Outcome of a single attempt that did not produce a final response
#[derive(Debug)]
enum Attempt {
    Retryable(Response),
    Transport(reqwest::Error),
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default retry budget
    pub fn new() -> Self {
        Self::with_max_retries(MAX_RETRIES)
    }

    /// Creates a client with a custom retry budget
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            client: Client::new(),
            max_retries,
        }
    }

    /// Sends a GET request
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.send(Method::GET, url, None).await
    }

    /// Sends a POST request with a JSON body
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Response, reqwest::Error> {
        self.send(Method::POST, url, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, reqwest::Error> {
        let client = &self.client;
        let attempt = move || {
            let method = method.clone();
            async move {
                let mut request = client.request(method, url);
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await.map_err(Attempt::Transport)?;
                if is_retryable(response.status()) {
                    tracing::debug!(
                        target: "polygon_exporter::client",
                        "retryable status {} from {}",
                        response.status(),
                        url
                    );
                    return Err(Attempt::Retryable(response));
                }

                Ok(response)
            }
        };

        let policy = RetryPolicy::fixed(Duration::ZERO).with_max_retries(self.max_retries);
        match policy
            .retry_if(attempt, |err: &Attempt| matches!(err, Attempt::Retryable(_)))
            .await
        {
            Ok(response) | Err(Attempt::Retryable(response)) => Ok(response),
            Err(Attempt::Transport(err)) => Err(err),
        }
    }
}

/// Whether a response status is worth another attempt
pub fn is_retryable(status: StatusCode) -> bool {
    RETRY_STATUS_CODES.contains(&status.as_u16())
}
