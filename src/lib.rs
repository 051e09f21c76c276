pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod service;

// Re-export core types
pub use crate::core::{Result, SentimentError, Settings};

// Re-export the pipeline surface for easier access
pub use pipelines::sentiment_analysis_pipeline::{
    analyze, classify_text, FinBertModel, Prediction, SentimentAnalysisPipeline,
    SentimentAnalysisPipelineBuilder, SentimentClassifier, SentimentLabel,
};
