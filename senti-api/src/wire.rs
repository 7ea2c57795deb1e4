//! JSON shapes exchanged with the backend.

use senti_common::{
    BatchLine, BatchResult, FeedbackRecord, Model, PredictionResult, Probabilities, Sentiment,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct PredictBody<'a> {
    pub text: &'a str,
    pub model: Model,
}

#[derive(Serialize)]
pub(crate) struct BatchBody<'a> {
    pub texts: &'a [String],
    pub model: Model,
}

#[derive(Serialize)]
pub(crate) struct FeedbackBody<'a> {
    pub id: &'a str,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_label: Option<Sentiment>,
}

impl<'a> From<&'a FeedbackRecord> for FeedbackBody<'a> {
    fn from(rec: &'a FeedbackRecord) -> Self {
        Self {
            id: rec.prediction_id(),
            correct: rec.is_correct(),
            corrected_label: rec.corrected_label(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    pub id: String,
    pub label: Sentiment,
    #[serde(default)]
    pub probs: Probabilities,
}

impl From<PredictResponse> for PredictionResult {
    fn from(r: PredictResponse) -> Self {
        PredictionResult {
            id: Some(r.id),
            label: r.label,
            probabilities: r.probs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverallResponse {
    pub label: Sentiment,
    #[serde(default)]
    pub probs: Probabilities,
}

/// Per-line ids are issued by the backend but never used for feedback.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchItemResponse {
    #[serde(default)]
    #[allow(dead_code)]
    pub id: Option<String>,
    pub text: String,
    pub label: Sentiment,
    #[serde(default)]
    pub probs: Probabilities,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponse {
    pub overall: OverallResponse,
    pub results: Vec<BatchItemResponse>,
}

impl From<BatchResponse> for BatchResult {
    fn from(r: BatchResponse) -> Self {
        BatchResult {
            overall: PredictionResult {
                id: None,
                label: r.overall.label,
                probabilities: r.overall.probs,
            },
            per_line: r
                .results
                .into_iter()
                .map(|item| BatchLine {
                    text: item.text,
                    label: item.label,
                    probabilities: item.probs,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn correct_feedback_omits_corrected_label() {
        let rec = FeedbackRecord::correct("abc");
        let body = serde_json::to_value(FeedbackBody::from(&rec)).unwrap();
        assert_eq!(body, json!({"id": "abc", "correct": true}));
    }

    #[test]
    fn corrected_feedback_sends_label() {
        let rec = FeedbackRecord::corrected("abc", Sentiment::Neutral);
        let body = serde_json::to_value(FeedbackBody::from(&rec)).unwrap();
        assert_eq!(
            body,
            json!({"id": "abc", "correct": false, "corrected_label": "neutral"})
        );
    }

    #[test]
    fn batch_body_uses_wire_model_id() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(BatchBody {
            texts: &texts,
            model: Model::Bertweet2L,
        })
        .unwrap();
        assert_eq!(body, json!({"texts": ["a", "b"], "model": "bertweet2L"}));
    }

    #[test]
    fn batch_response_keeps_line_order() {
        let raw = json!({
            "overall": {"label": "neutral", "probs": {"positive": 0.4, "neutral": 0.5, "negative": 0.1}},
            "results": [
                {"id": "1", "text": "great", "label": "positive", "probs": {"positive": 0.9}},
                {"id": "2", "text": "awful", "label": "negative", "probs": {"negative": 0.8}}
            ]
        });
        let parsed: BatchResponse = serde_json::from_value(raw).unwrap();
        let result = BatchResult::from(parsed);
        assert_eq!(result.overall.id, None);
        assert_eq!(result.overall.label, Sentiment::Neutral);
        let texts: Vec<&str> = result.per_line.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["great", "awful"]);
        assert_eq!(result.per_line[1].label, Sentiment::Negative);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let raw = json!({"id": "x", "label": "ecstatic", "probs": {}});
        assert!(serde_json::from_value::<PredictResponse>(raw).is_err());
    }
}
