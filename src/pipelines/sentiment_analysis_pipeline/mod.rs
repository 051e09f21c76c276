//! Sentiment analysis pipeline for classifying the tone of financial text.
//!
//! This module provides functionality for labelling text as positive, neutral
//! or negative with a pre-trained FinBERT classifier, along with the softmax
//! probability of the chosen label.
//!
//! ## Main Types
//!
//! - [`SentimentAnalysisPipeline`] - Loaded tokenizer, model and device
//! - [`SentimentAnalysisPipelineBuilder`] - Builder pattern for pipeline configuration
//! - [`SentimentAnalysisModel`] - Trait for sentiment analysis model implementations
//! - [`SentimentClassifier`] - What the service layers depend on
//! - [`analyze`] - Classification with the neutral fallback
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use finbert_sentiment::pipelines::sentiment_analysis_pipeline::*;
//!
//! # async fn run() -> finbert_sentiment::core::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::finbert("ProsusAI/finbert")
//!     .build()
//!     .await?;
//!
//! let (label, confidence) = analyze("Company XYZ reports record profits", &pipeline);
//! println!("Sentiment: {label} (confidence: {confidence:.2})");
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod builder;
pub mod labels;
pub mod model;
pub mod pipeline;

pub use analyzer::{analyze, classify_text, ClassifierInfo, SentimentClassifier};
pub use builder::SentimentAnalysisPipelineBuilder;
pub use labels::{LabelMap, SentimentLabel};
pub use model::{Prediction, SentimentAnalysisModel};
pub use pipeline::SentimentAnalysisPipeline;

pub use crate::models::implementations::finbert::{FinBertModel, FinBertOptions};
