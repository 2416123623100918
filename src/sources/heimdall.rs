use serde::Deserialize;

use crate::client::HttpClient;

use super::{join, number, or_sentinel, read_json, FetchError};

/// Path of the latest checkpoint resource
pub const LATEST_CHECKPOINT_PATH: &str = "/checkpoints/latest";

/// Reads the latest checkpoint from a Heimdall REST endpoint
#[derive(Debug, Clone)]
pub struct HeimdallSource {
    endpoint: Option<String>,
    client: HttpClient,
}

/// Response of `GET /checkpoints/latest`
#[derive(Debug, Deserialize)]
struct CheckpointResponse {
    /// Heimdall block height the response was served at
    #[serde(deserialize_with = "number")]
    height: f64,
    result: Checkpoint,
}

#[derive(Debug, Deserialize)]
struct Checkpoint {
    #[serde(deserialize_with = "number")]
    id: f64,
}

impl HeimdallSource {
    pub fn new(endpoint: Option<String>, client: HttpClient) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// `(heimdall height, checkpoint number)`, or `(0.0, 0.0)` if unavailable
    pub async fn latest_checkpoint(&self) -> (f64, f64) {
        or_sentinel("heimdall", self.fetch().await)
    }

    pub async fn fetch(&self) -> Result<(f64, f64), FetchError> {
        let endpoint = self.endpoint().ok_or(FetchError::Disabled)?;
        let url = join(endpoint, LATEST_CHECKPOINT_PATH);
        let response = self.client.get(&url).await?;
        let checkpoint: CheckpointResponse = read_json(response).await?;
        Ok((checkpoint.height, checkpoint.result.id))
    }
}
