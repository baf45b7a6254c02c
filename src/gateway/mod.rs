pub mod client;

pub use client::Gateway;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: String,
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadResponse {
    pub task_id: String,
    pub message: Option<String>,
    pub filename: Option<String>,
}

/// Processing state reported by `GET /status/{task_id}`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
    /// `not_found` or anything else the backend invents.
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusResponse {
    pub status: TaskStatus,
    pub progress: Option<f64>,
    pub processed_chunks: Option<u64>,
    pub total_chunks: Option<u64>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl GatewayError {
    /// True when the backend answered and refused the request (4xx).
    pub fn is_rejection(&self) -> bool {
        matches!(self, GatewayError::Api { status, .. } if (400..500).contains(status))
    }
}
