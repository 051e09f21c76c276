use tokenizers::Tokenizer;

use super::analyzer::{ClassifierInfo, SentimentClassifier};
use super::model::{Prediction, SentimentAnalysisModel};
use crate::core::Result;
use crate::pipelines::utils::device_name;

/// A loaded tokenizer, model and device.
///
/// Built once at startup and shared read-only afterwards; nothing in the
/// pipeline mutates after [`SentimentAnalysisPipelineBuilder::build`](super::SentimentAnalysisPipelineBuilder::build)
/// returns.
pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) model_id: String,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Predict sentiment with structured result containing label and confidence score
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        self.model.predict_with_score(&self.tokenizer, text)
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

impl<M> SentimentClassifier for SentimentAnalysisPipeline<M>
where
    M: SentimentAnalysisModel + Send + Sync,
{
    fn classify(&self, text: &str) -> Result<Prediction> {
        self.predict(text)
    }

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_id: self.model_id.clone(),
            device: device_name(self.device()).to_string(),
        }
    }
}
