use serde::Deserialize;

use crate::client::HttpClient;

use super::{join, number, or_sentinel, read_json, FetchError};

/// Reads the last checkpoint a validator signed from the staking API
#[derive(Debug, Clone)]
pub struct StakingSource {
    endpoint: Option<String>,
    validator: Option<String>,
    client: HttpClient,
}

#[derive(Debug, Deserialize)]
struct SignedCheckpoints {
    result: Vec<SignedCheckpoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedCheckpoint {
    #[serde(deserialize_with = "number")]
    checkpoint_number: f64,
}

impl StakingSource {
    pub fn new(endpoint: Option<String>, validator: Option<String>, client: HttpClient) -> Self {
        Self {
            endpoint,
            validator,
            client,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn validator(&self) -> Option<&str> {
        self.validator.as_deref()
    }

    /// Last signed checkpoint number, or `0.0` if unavailable
    pub async fn latest_signed(&self) -> f64 {
        or_sentinel("staking", self.fetch().await)
    }

    pub async fn fetch(&self) -> Result<f64, FetchError> {
        let (Some(endpoint), Some(validator)) = (self.endpoint(), self.validator()) else {
            return Err(FetchError::Disabled);
        };

        let url = join(endpoint, &signed_checkpoints_path(validator));
        let response = self.client.get(&url).await?;
        let signed: SignedCheckpoints = read_json(response).await?;
        signed
            .result
            .first()
            .map(|checkpoint| checkpoint.checkpoint_number)
            .ok_or_else(|| FetchError::Shape("no signed checkpoints in result".to_string()))
    }
}

/// Path listing the most recent checkpoint signed by `validator`
pub fn signed_checkpoints_path(validator: &str) -> String {
    format!("/api/v2/validators/{validator}/checkpoints-signed?limit=1&offset=0")
}
