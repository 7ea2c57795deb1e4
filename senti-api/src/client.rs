use crate::traits::{ApiError, FeedbackAck, SentimentApi};
use crate::wire::{BatchBody, BatchResponse, FeedbackBody, PredictBody, PredictResponse};
use async_trait::async_trait;
use senti_common::{BatchResult, FeedbackRecord, Model, PredictionResult};
use senti_http::HttpClient;
use std::time::Duration;

const PREDICT_PATH: &str = "predict";
const BATCH_PATH: &str = "batch_predict";
const FEEDBACK_PATH: &str = "feedback";

/// [`SentimentApi`] over HTTP.
#[derive(Clone)]
pub struct HttpSentimentApi {
    client: HttpClient,
}

impl HttpSentimentApi {
    /// Create a client for an already resolved base URL.
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let client = HttpClient::new(base)?;
        Ok(Self { client })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn base(&self) -> &str {
        self.client.base().as_str()
    }
}

#[async_trait]
impl SentimentApi for HttpSentimentApi {
    async fn predict_single(&self, text: &str, model: Model) -> Result<PredictionResult, ApiError> {
        tracing::debug!(%model, chars = text.chars().count(), "api.predict");
        let resp: PredictResponse = self
            .client
            .post_json(PREDICT_PATH, &PredictBody { text, model })
            .await?;
        Ok(resp.into())
    }

    async fn predict_batch(&self, lines: &[String], model: Model) -> Result<BatchResult, ApiError> {
        tracing::debug!(%model, lines = lines.len(), "api.batch_predict");
        let resp: BatchResponse = self
            .client
            .post_json(BATCH_PATH, &BatchBody { texts: lines, model })
            .await?;

        if resp.results.len() != lines.len() {
            tracing::warn!(
                sent = lines.len(),
                received = resp.results.len(),
                "api.batch_predict.misaligned"
            );
            return Err(ApiError::Decode(format!(
                "batch_predict returned {} results for {} lines",
                resp.results.len(),
                lines.len()
            )));
        }

        Ok(resp.into())
    }

    async fn submit_feedback(&self, record: &FeedbackRecord) -> Result<FeedbackAck, ApiError> {
        tracing::debug!(
            id = record.prediction_id(),
            correct = record.is_correct(),
            corrected = ?record.corrected_label(),
            "api.feedback"
        );
        let ack = self
            .client
            .post_for_ack(FEEDBACK_PATH, &FeedbackBody::from(record))
            .await?;
        Ok(FeedbackAck(ack))
    }
}
