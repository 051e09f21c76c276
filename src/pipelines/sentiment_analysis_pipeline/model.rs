use candle_core::Device;
use tokenizers::Tokenizer;

use super::labels::SentimentLabel;
use crate::core::Result;

/// Label and softmax probability of the winning class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: SentimentLabel,
    pub confidence: f32,
}

#[allow(async_fn_in_trait)]
pub trait SentimentAnalysisModel {
    type Options: std::fmt::Debug + std::fmt::Display + Clone;

    async fn new(options: Self::Options, device: Device) -> Result<Self>
    where
        Self: Sized;

    async fn get_tokenizer(options: Self::Options) -> Result<Tokenizer>;

    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<Prediction>;

    fn device(&self) -> &Device;
}
