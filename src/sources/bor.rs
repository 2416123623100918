use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::HttpClient;

use super::{or_sentinel, read_json, FetchError};

/// JSON-RPC method used to read the chain head
pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Reads the latest block height from a Bor JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct BorSource {
    endpoint: Option<String>,
    client: HttpClient,
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    result: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    number: String,
}

impl BorSource {
    pub fn new(endpoint: Option<String>, client: HttpClient) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Latest block height, or `0.0` if it could not be read
    pub async fn latest_height(&self) -> f64 {
        or_sentinel("bor", self.fetch().await)
    }

    /// Fetches the latest block and decodes its hex number
    pub async fn fetch(&self) -> Result<f64, FetchError> {
        let endpoint = self.endpoint().ok_or(FetchError::Disabled)?;
        let response = self.client.post_json(endpoint, &request_body()).await?;
        let block: BlockResponse = read_json(response).await?;
        let number = parse_quantity(&block.result.number)?;
        Ok(number as f64)
    }
}

/// `eth_getBlockByNumber("latest", true)` request body
pub fn request_body() -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": GET_BLOCK_BY_NUMBER,
        "params": ["latest", true],
        "id": 1,
    })
}

/// Parses a hex encoded quantity, with or without the `0x` prefix
pub fn parse_quantity(hex: &str) -> Result<u64, FetchError> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);

    u64::from_str_radix(digits, 16)
        .map_err(|err| FetchError::Shape(format!("invalid block number {hex:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x1a").unwrap(), 26);
        assert_eq!(parse_quantity("0X1A").unwrap(), 26);
        assert_eq!(parse_quantity("ff").unwrap(), 255);
        assert_eq!(parse_quantity("0x3b9aca00").unwrap(), 1_000_000_000);
    }

    #[test]
    fn rejects_bad_quantities() {
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn builds_rpc_request() {
        let body = request_body();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "eth_getBlockByNumber");
        assert_eq!(body["params"], json!(["latest", true]));
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn disabled_source_returns_sentinel() {
        let source = BorSource::new(None, HttpClient::new());
        assert!(matches!(source.fetch().await, Err(FetchError::Disabled)));
        assert_eq!(source.latest_height().await, 0.0);
    }

    #[tokio::test]
    async fn unreachable_source_returns_sentinel() {
        let source = BorSource::new(Some("http://127.0.0.1:1".to_string()), HttpClient::new());
        assert!(matches!(source.fetch().await, Err(FetchError::Transport(_))));
        assert_eq!(source.latest_height().await, 0.0);
    }
}
