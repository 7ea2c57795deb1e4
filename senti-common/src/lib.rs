//! Common types and utilities shared across Senti crates.
//!
//! This crate defines the sentiment domain model, the shared error type and
//! observability helpers used throughout the Senti workspace. It is
//! intentionally lightweight so that every crate (HTTP client, controller,
//! terminal view) can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`Model`]: the closed set of backend classifiers and their label sets
//! - [`Sentiment`]: predicted / corrected labels
//! - [`Mode`]: single sentence or batch submission
//! - [`PredictionResult`], [`BatchResult`], [`FeedbackRecord`]: transient session entities
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`SentiError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use senti_common::{Model, Sentiment};
//!
//! let model: Model = "roberta2L".parse().unwrap();
//! assert!(model.is_binary());
//! assert_eq!(model.labels(), &[Sentiment::Positive, Sentiment::Negative]);
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// Backend classifiers the demo can route a request to.
///
/// The wire identifier is what the backend expects in the `model` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "roberta")]
    Roberta,
    #[serde(rename = "bertweet")]
    Bertweet,
    /// 2-label RoBERTa checkpoint
    #[serde(rename = "roberta2L")]
    Roberta2L,
    /// 2-label BERTweet checkpoint
    #[serde(rename = "bertweet2L")]
    Bertweet2L,
}

impl Model {
    pub const ALL: [Model; 4] = [
        Model::Roberta,
        Model::Bertweet,
        Model::Roberta2L,
        Model::Bertweet2L,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Model::Roberta => "roberta",
            Model::Bertweet => "bertweet",
            Model::Roberta2L => "roberta2L",
            Model::Bertweet2L => "bertweet2L",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Model::Roberta => "RoBERTa 3-class",
            Model::Bertweet => "BERTweet 3-class",
            Model::Roberta2L => "RoBERTa 2-class",
            Model::Bertweet2L => "BERTweet 2-class",
        }
    }

    /// Binary models have no neutral class.
    pub fn is_binary(&self) -> bool {
        matches!(self, Model::Roberta2L | Model::Bertweet2L)
    }

    /// Labels this model can predict, which are also the labels a user may
    /// pick as a correction.
    ///
    /// ```
    /// use senti_common::{Model, Sentiment};
    ///
    /// assert_eq!(Model::Bertweet.labels().len(), 3);
    /// assert!(!Model::Bertweet2L.labels().contains(&Sentiment::Neutral));
    /// ```
    pub fn labels(&self) -> &'static [Sentiment] {
        if self.is_binary() {
            &[Sentiment::Positive, Sentiment::Negative]
        } else {
            &Sentiment::ALL
        }
    }

    /// Next model in selector order (wraps around).
    pub fn next(self) -> Model {
        let idx = Model::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Model::ALL[(idx + 1) % Model::ALL.len()]
    }

    /// Previous model in selector order (wraps around).
    pub fn prev(self) -> Model {
        let idx = Model::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Model::ALL[(idx + Model::ALL.len() - 1) % Model::ALL.len()]
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = SentiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Model::ALL
            .iter()
            .copied()
            .find(|m| m.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SentiError::UnknownModel(trimmed.to_string()))
    }
}

/// A sentiment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Canonical display order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    fn rank(label: &str) -> Option<usize> {
        Sentiment::ALL.iter().position(|s| s.as_str() == label)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = SentiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(SentiError::UnknownLabel(other.to_string())),
        }
    }
}

/// Submission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Single,
    Batch,
}

impl Mode {
    pub fn toggled(self) -> Mode {
        match self {
            Mode::Single => Mode::Batch,
            Mode::Batch => Mode::Single,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Single => "single",
            Mode::Batch => "batch",
        }
    }
}

/// Per-class probabilities exactly as reported by the backend.
///
/// Values are never renormalised. [`Probabilities::ordered`] yields the known
/// classes in canonical order followed by any other labels alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Probabilities(BTreeMap<String, f64>);

impl Probabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// ```
    /// use senti_common::Probabilities;
    ///
    /// let probs: Probabilities =
    ///     [("negative", 0.2), ("positive", 0.5), ("neutral", 0.3)].into_iter().collect();
    /// let order: Vec<&str> = probs.ordered().into_iter().map(|(l, _)| l).collect();
    /// assert_eq!(order, ["positive", "neutral", "negative"]);
    /// ```
    pub fn ordered(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        out.sort_by_key(|(label, _)| (Sentiment::rank(label).unwrap_or(usize::MAX), *label));
        out
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Probabilities {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Outcome of classifying one text.
///
/// `id` is only issued for single-mode predictions; it is the handle later
/// used for feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub id: Option<String>,
    pub label: Sentiment,
    pub probabilities: Probabilities,
}

/// One classified line of a batch submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLine {
    pub text: String,
    pub label: Sentiment,
    pub probabilities: Probabilities,
}

/// Batch outcome: an aggregate (never carrying an id) plus one entry per
/// submitted line, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub overall: PredictionResult,
    pub per_line: Vec<BatchLine>,
}

/// User verdict on a single-mode prediction.
///
/// A corrected label is present exactly when the prediction was marked
/// incorrect; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    prediction_id: String,
    correct: bool,
    corrected_label: Option<Sentiment>,
}

impl FeedbackRecord {
    /// ```
    /// use senti_common::FeedbackRecord;
    ///
    /// let rec = FeedbackRecord::correct("abc");
    /// assert!(rec.is_correct());
    /// assert_eq!(rec.corrected_label(), None);
    /// ```
    pub fn correct(prediction_id: impl Into<String>) -> Self {
        Self {
            prediction_id: prediction_id.into(),
            correct: true,
            corrected_label: None,
        }
    }

    pub fn corrected(prediction_id: impl Into<String>, label: Sentiment) -> Self {
        Self {
            prediction_id: prediction_id.into(),
            correct: false,
            corrected_label: Some(label),
        }
    }

    pub fn prediction_id(&self) -> &str {
        &self.prediction_id
    }

    pub fn is_correct(&self) -> bool {
        self.correct
    }

    pub fn corrected_label(&self) -> Option<Sentiment> {
        self.corrected_label
    }
}

/// Error types used across the Senti workspace.
#[derive(thiserror::Error, Debug)]
pub enum SentiError {
    /// A model identifier outside the supported set.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A sentiment label outside positive/neutral/negative.
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`SentiError`].
pub type Result<T> = std::result::Result<T, SentiError>;
