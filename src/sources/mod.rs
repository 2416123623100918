//! Upstream height sources.
//!
//! Each source issues one logical request per poll and extracts a height from
//! the JSON body. The `fetch` methods report why a reading is missing through
//! [FetchError]; the `latest_*` methods fold every failure into the `0.0`
//! sentinel.

use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use thiserror::Error;

pub mod bor;
pub use bor::BorSource;

pub mod heimdall;
pub use heimdall::HeimdallSource;

pub mod staking;
pub use staking::StakingSource;

/// Reason a source produced no reading
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source has no endpoint configured
    #[error("source disabled")]
    Disabled,
    /// DNS, connect or body read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The upstream answered with something other than 200
    #[error("unexpected status {0}")]
    Status(StatusCode),
    /// The body was not valid JSON or did not match the expected shape
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    /// The body parsed but a value inside it was unusable
    #[error("malformed payload: {0}")]
    Shape(String),
}

impl FetchError {
    /// Whether the upstream answered 200 with an unusable body
    pub fn is_payload(&self) -> bool {
        matches!(self, FetchError::Decode(_) | FetchError::Shape(_))
    }
}

/// Replaces a failed fetch with the sentinel reading, logging the cause.
/// Payload errors are logged at `error`, transport and status errors at `warn`.
pub fn or_sentinel<T: Default>(source: &str, result: Result<T, FetchError>) -> T {
    match result {
        Ok(value) => value,
        Err(FetchError::Disabled) => {
            tracing::debug!(target: "polygon_exporter::sources", "{} source disabled", source);
            T::default()
        }
        Err(err) if err.is_payload() => {
            tracing::error!(target: "polygon_exporter::sources", "{} payload error: {}", source, err);
            T::default()
        }
        Err(err) => {
            tracing::warn!(target: "polygon_exporter::sources", "{} fetch failed: {}", source, err);
            T::default()
        }
    }
}

/// Checks the status and decodes the JSON body of an upstream response
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Joins an endpoint and a path without doubling the separator
pub(crate) fn join(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

/// Deserializes a JSON number, or a string holding one, into an `f64`
pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
    }

    match Numeric::deserialize(deserializer)? {
        Numeric::Number(value) => Ok(value),
        Numeric::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|err| serde::de::Error::custom(format!("invalid number {text:?}: {err}"))),
    }
}
