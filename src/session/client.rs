use crate::config::SessionConfig;
use crate::models::{UploadMediaRequest, UploadMediaResponse};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not reach the server: {0}")]
    Unreachable(String),

    #[error("server rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response from the server: {0}")]
    InvalidResponse(String),
}

/// Sends a captured payload to the backend.
#[async_trait]
pub trait UploadClient: Send + Sync {
    async fn upload(&self, request: &UploadMediaRequest) -> Result<UploadMediaResponse, NetworkError>;
}

/// `POST /upload-media` over HTTP.
pub struct HttpUploadClient {
    http: reqwest::Client,
    url: String,
}

impl HttpUploadClient {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            http,
            url: config.upload_url(),
        }
    }
}

#[async_trait]
impl UploadClient for HttpUploadClient {
    async fn upload(&self, request: &UploadMediaRequest) -> Result<UploadMediaResponse, NetworkError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(NetworkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<UploadMediaResponse>()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))
    }
}
