//! Backend collaborators
//!
//! The upload and query/stream endpoints of the document-analysis backend,
//! behind a trait so the runtime can be driven against a scripted stub in
//! tests.

mod error;
mod http;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpBackend;

use crate::session::SessionId;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Lazy sequence of raw body chunks from one streaming call. Finite, not
/// restartable; tests feed a literal list of chunks instead of a socket.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

/// Successful upload response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub initial_summary: String,
}

/// Failure body the backend returns with a non-success status.
#[derive(Debug, Deserialize)]
pub struct ApiFailure {
    pub detail: String,
}

/// Outbound query, bound to the session that owns the document.
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub session_id: &'a str,
}

/// Common interface to the document-analysis backend.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Upload a PDF for analysis. The caller has already validated the media
    /// type.
    async fn upload(
        &self,
        session: &SessionId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, BackendError>;

    /// Issue one query; the answer arrives as an unbounded chunk stream
    /// terminated by the server closing the connection.
    async fn query(&self, session: &SessionId, query: &str) -> Result<ChunkStream, BackendError>;
}
