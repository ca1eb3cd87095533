use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failure raised by an external model provider call (network, auth,
/// rate limit, or an unusable response body).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Retriever-side failure. Kept separate from [`ProviderError`] so mock
/// retrievers in tests do not need to fabricate provider internals.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RetrievalError(pub String);

/// Per-turn pipeline failures, tagged by the step that raised them.
///
/// `Configuration` is fatal to pipeline construction and must be resolved
/// by reconfiguring; the step variants abort the current turn only.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("utterance must not be empty")]
    EmptyUtterance,
    #[error("query contextualization failed: {0}")]
    Contextualization(#[source] ProviderError),
    #[error("passage retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("answer synthesis failed: {0}")]
    Synthesis(#[source] ProviderError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match &err {
            PipelineError::Configuration(msg) => ApiError::ServiceUnavailable(msg.clone()),
            PipelineError::EmptyUtterance => ApiError::BadRequest(err.to_string()),
            PipelineError::Contextualization(_)
            | PipelineError::Retrieval(_)
            | PipelineError::Synthesis(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
