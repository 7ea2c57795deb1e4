//! Client for the sentiment backend.
//!
//! This crate exposes the [`traits::SentimentApi`] interface used by the
//! page controller runtime, and [`client::HttpSentimentApi`], the
//! implementation that talks to the backend's three REST endpoints:
//!
//! - `POST {base}/predict`
//! - `POST {base}/batch_predict`
//! - `POST {base}/feedback`
//!
//! # Examples
//! ```no_run
//! use senti_api::{HttpSentimentApi, SentimentApi};
//! use senti_common::Model;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), senti_api::ApiError> {
//! let api = HttpSentimentApi::new("http://localhost:8000")?;
//! let result = api.predict_single("I love this!", Model::Roberta).await?;
//! println!("{} {:?}", result.label, result.probabilities.ordered());
//! # Ok(())
//! # }
//! ```
pub mod client;
pub mod traits;
mod wire;

pub use client::HttpSentimentApi;
pub use traits::{ApiError, FeedbackAck, SentimentApi};
