//! Pass-through to an external analytics service.

use chrono::{DateTime, Utc};
use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{api::client, prelude::*};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RelayError {
    #[display("relay URL is not configured")]
    MissingUrl,

    #[display("upstream responded with {_0}")]
    UpstreamStatus(#[error(not(source))] StatusCode),

    #[display("failed to call the upstream: {_0}")]
    Request(reqwest::Error),
}

pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new() -> Result<Self> {
        Ok(Self { inner: client::try_new()? })
    }

    /// Fetch the URL and return its body as JSON.
    #[instrument(skip_all)]
    pub async fn relay(&self, url: Option<&str>) -> Result<Value, RelayError> {
        let url = url.map(str::trim).filter(|url| !url.is_empty()).ok_or(RelayError::MissingUrl)?;
        info!(url, "relaying…");
        let response = self
            .inner
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(RelayError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus(status));
        }
        let body = response.text().await.map_err(RelayError::Request)?;
        debug!(len = body.len(), "received");
        Ok(parse_body(&body))
    }
}

/// Parse the body as JSON, falling back to its non-blank lines under `output`.
pub fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| {
        let lines: Vec<&str> = body.lines().filter(|line| !line.trim().is_empty()).collect();
        json!({ "output": lines })
    })
}

/// What the dashboard receives from the relay.
#[derive(Serialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl From<Result<Value, RelayError>> for Envelope {
    fn from(result: Result<Value, RelayError>) -> Self {
        let timestamp = Utc::now();
        match result {
            Ok(data) => Self { success: true, data: Some(data), error: None, timestamp },
            Err(error) => {
                Self { success: false, data: None, error: Some(error.to_string()), timestamp }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_body() {
        // language=json
        let body = r#"{"recommendation": "defer", "confidence": 0.82}"#;
        assert_eq!(parse_body(body), json!({ "recommendation": "defer", "confidence": 0.82 }));
    }

    #[test]
    fn test_parse_plain_text_body() {
        let body = "forecast ready\n\n  \nnext window: 02:00\n";
        assert_eq!(parse_body(body), json!({ "output": ["forecast ready", "next window: 02:00"] }));
    }

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_body(""), json!({ "output": [] }));
    }

    #[tokio::test]
    async fn test_missing_url() -> Result {
        let client = Client::new()?;
        assert!(matches!(client.relay(None).await, Err(RelayError::MissingUrl)));
        assert!(matches!(client.relay(Some("  ")).await, Err(RelayError::MissingUrl)));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_url() -> Result {
        let result = Client::new()?.relay(Some("not a url")).await;
        assert!(matches!(result, Err(RelayError::Request(_))));
        Ok(())
    }

    #[test]
    fn test_failure_envelope() -> Result {
        let envelope = Envelope::from(Err(RelayError::MissingUrl));
        let value = serde_json::to_value(&envelope)?;
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("relay URL is not configured"));
        assert!(value.get("data").is_none());
        Ok(())
    }

    #[test]
    fn test_success_envelope() -> Result {
        let envelope = Envelope::from(Ok(json!({ "output": ["ok"] })));
        let value = serde_json::to_value(&envelope)?;
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["output"][0], json!("ok"));
        assert!(value["timestamp"].is_string());
        Ok(())
    }
}
