//! FinBERT sequence classifier.
//!
//! The encoder is `candle-transformers`' BERT; on top of it sit the two
//! layers every `BertForSequenceClassification` checkpoint carries: the
//! pooler (`bert.pooler.dense`, tanh over the `[CLS]` state) and the
//! classification head (`classifier`).

use std::fmt;

use candle_core::{Device, IndexOp, Module, Tensor, D};
use candle_nn::{linear, ops::softmax, Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::Tokenizer;

use crate::core::{Result, SentimentError, DEFAULT_MODEL_ID};
use crate::loaders::{ClassifierConfigLoader, TokenizerLoader, WeightsLoader};
use crate::pipelines::sentiment_analysis_pipeline::labels::LabelMap;
use crate::pipelines::sentiment_analysis_pipeline::model::{Prediction, SentimentAnalysisModel};

/// Which FinBERT checkpoint to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinBertOptions {
    pub model_id: String,
}

impl Default for FinBertOptions {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

impl From<String> for FinBertOptions {
    fn from(model_id: String) -> Self {
        Self { model_id }
    }
}

impl fmt::Display for FinBertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model_id)
    }
}

/// BERT encoder, pooler and three-way classification head.
pub struct FinBertModel {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    labels: LabelMap,
    device: Device,
}

impl FinBertModel {
    pub async fn new(options: FinBertOptions, device: Device) -> Result<Self> {
        let config = ClassifierConfigLoader::new(&options.model_id).load().await?;
        let labels = LabelMap::from_id2label_or_default(&config.id2label);
        let vb = WeightsLoader::new(&options.model_id).load(&device).await?;

        Self::load(vb, &config.bert, labels, device)
    }

    /// Assemble the classifier from already opened weights.
    pub fn load(vb: VarBuilder, config: &Config, labels: LabelMap, device: Device) -> Result<Self> {
        let bert = BertModel::load(vb.pp("bert"), config)?;
        let pooler = linear(
            config.hidden_size,
            config.hidden_size,
            vb.pp("bert").pp("pooler").pp("dense"),
        )?;
        let classifier = linear(config.hidden_size, labels.len(), vb.pp("classifier"))
            .map_err(|e| {
                SentimentError::ModelFormat(format!(
                    "Checkpoint has no {}-way classification head: {e}",
                    labels.len()
                ))
            })?;

        Ok(Self {
            bert,
            pooler,
            classifier,
            labels,
            device,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Raw class logits, shape `(batch, num_labels)`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .bert
            .forward(input_ids, &token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        Ok(self.classifier.forward(&pooled)?)
    }

    pub fn predict(&self, tokenizer: &Tokenizer, text: &str) -> Result<Prediction> {
        let encoding = tokenizer.encode(text, true).map_err(|e| {
            SentimentError::Tokenization(format!(
                "Tokenization failed on '{}': {}",
                &text.chars().take(50).collect::<String>(),
                e
            ))
        })?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = self.forward(&input_ids, &attention_mask)?;
        let probs = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

        prediction_from_probs(&probs, &self.labels)
    }
}

/// Pick the most probable class. Ties go to the lowest index.
pub fn prediction_from_probs(probs: &[f32], labels: &LabelMap) -> Result<Prediction> {
    if probs.len() != labels.len() {
        return Err(SentimentError::Inference(format!(
            "Model produced {} class scores, expected {}",
            probs.len(),
            labels.len()
        )));
    }

    let (index, score) = probs
        .iter()
        .copied()
        .enumerate()
        .fold(None::<(usize, f32)>, |best, (i, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((i, p)),
        })
        .ok_or_else(|| SentimentError::Inference("Model produced no class scores".into()))?;

    if !score.is_finite() {
        return Err(SentimentError::Inference(format!(
            "Non-finite class probability {score}"
        )));
    }

    let label = labels.get(index).ok_or_else(|| {
        SentimentError::Inference(format!("Predicted class {index} has no label"))
    })?;

    Ok(Prediction {
        label,
        confidence: score.clamp(0.0, 1.0),
    })
}

impl SentimentAnalysisModel for FinBertModel {
    type Options = FinBertOptions;

    async fn new(options: Self::Options, device: Device) -> Result<Self> {
        FinBertModel::new(options, device).await
    }

    async fn get_tokenizer(options: Self::Options) -> Result<Tokenizer> {
        TokenizerLoader::new(&options.model_id).load().await
    }

    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<Prediction> {
        self.predict(tokenizer, text)
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
