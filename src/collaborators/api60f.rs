//! HTTP client for the API-60F correction service

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::Api60fCorrector;
use crate::comparison::CorrectionRequest;
use crate::error::CollaboratorError;

#[derive(Debug, Deserialize)]
struct CorrectionResponse {
    api60f: Option<f64>,
}

pub struct HttpApi60fCorrector {
    client: Client,
    url: String,
}

impl HttpApi60fCorrector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Api60fCorrector for HttpApi60fCorrector {
    async fn correct(&self, temp_f: f64, api: f64) -> Result<f64, CollaboratorError> {
        let body = CorrectionRequest { temp_f, api };
        debug!("Requesting API-60F correction {:?} from {}", body, self.url);

        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: CorrectionResponse = res.json().await?;

        parsed
            .api60f
            .filter(|v| v.is_finite())
            .ok_or_else(|| CollaboratorError::Decode("response carries no numeric api60f".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let body = CorrectionRequest { temp_f: 68.0, api: 30.1 };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "temp_f": 68.0, "api": 30.1 }));
    }

    #[test]
    fn test_response_parsing() {
        let parsed: CorrectionResponse = serde_json::from_str(r#"{"api60f": 29.87}"#).unwrap();
        assert_eq!(parsed.api60f, Some(29.87));
        let parsed: CorrectionResponse = serde_json::from_str(r#"{"error": "out of range"}"#).unwrap();
        assert_eq!(parsed.api60f, None);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let corrector = HttpApi60fCorrector::new("http://127.0.0.1:9/api60f", Duration::from_millis(200)).unwrap();
        assert!(corrector.correct(68.0, 30.0).await.is_err());
    }
}
