use async_trait::async_trait;
use senti_common::{BatchResult, FeedbackRecord, Model, PredictionResult};
use senti_http::HttpError;

/// Acknowledgement body returned by the feedback endpoint. Its shape is not
/// interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackAck(pub serde_json::Value);

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The backend answered with a non-success status. `message` is the
    /// response body text, or `API <status>` when the body was empty.
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid client setup: {0}")]
    Config(String),
}

impl ApiError {
    /// Text suitable for a user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Request { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Api {
                status, message, ..
            } => ApiError::Request {
                status: status.as_u16(),
                message,
            },
            HttpError::Network(m) => ApiError::Network(m),
            HttpError::Decode(m, snippet) => ApiError::Decode(format!("{m} (body: {snippet})")),
            HttpError::Url(m) | HttpError::Build(m) => ApiError::Config(m),
        }
    }
}

/// The three backend operations the front end depends on.
///
/// None of them retries: a failure is surfaced once to the caller.
#[async_trait]
pub trait SentimentApi: Send + Sync {
    /// Classify one text. The result carries the prediction id used later for
    /// feedback.
    async fn predict_single(&self, text: &str, model: Model) -> Result<PredictionResult, ApiError>;

    /// Classify up to a handful of already-validated, non-blank lines.
    /// Per-line results come back in submission order.
    async fn predict_batch(&self, lines: &[String], model: Model) -> Result<BatchResult, ApiError>;

    /// Record whether a single-mode prediction was correct.
    async fn submit_feedback(&self, record: &FeedbackRecord) -> Result<FeedbackAck, ApiError>;
}
