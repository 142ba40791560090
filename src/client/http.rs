//! HTTP implementation of the backend collaborators

use super::{ApiFailure, BackendError, ChunkStream, DocumentBackend, QueryRequest, UploadReceipt};
use crate::session::SessionId;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// reqwest-backed client for the document-analysis backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// `base_url` without a trailing slash, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str) -> Self {
        // No overall request timeout: the answer body is an unbounded
        // stream and must not be cut off mid-answer.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn classify_error(status: StatusCode, body: &str) -> BackendError {
        // The backend reports failures as `{"detail": "..."}`; fall back to
        // the raw body when it doesn't.
        let detail = serde_json::from_str::<ApiFailure>(body)
            .map(|f| f.detail)
            .unwrap_or_else(|_| body.to_string());
        BackendError::transport(format!("HTTP {status}: {detail}"))
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::classify_error(status, &body))
    }

    fn send_error(err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::transport(format!("request timed out: {err}"))
        } else if err.is_connect() {
            BackendError::transport(format!("connection failed: {err}"))
        } else {
            BackendError::transport(format!("request failed: {err}"))
        }
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn upload(
        &self,
        session: &SessionId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, BackendError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| BackendError::validation(format!("invalid media type: {e}")))?;
        let form = Form::new().part("file", part);

        tracing::info!(%session, filename, "uploading document");
        let response = self
            .client
            .post(format!("{}/upload/{}", self.base_url, session))
            .multipart(form)
            .send()
            .await
            .map_err(Self::send_error)?;

        let response = Self::check_status(response).await?;
        response
            .json::<UploadReceipt>()
            .await
            .map_err(|e| BackendError::protocol(format!("malformed upload response: {e}")))
    }

    async fn query(&self, session: &SessionId, query: &str) -> Result<ChunkStream, BackendError> {
        tracing::debug!(%session, "issuing query");
        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(&QueryRequest {
                query,
                session_id: session.as_str(),
            })
            .send()
            .await
            .map_err(Self::send_error)?;

        let response = Self::check_status(response).await?;
        Ok(Box::pin(response.bytes_stream().map_err(|e| {
            BackendError::transport(format!("error reading answer stream: {e}"))
        })))
    }
}
