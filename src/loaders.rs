//! Checkpoint loading utilities for Hugging Face Hub integration.
//!
//! This module provides loaders for the three components of a BERT sequence
//! classifier:
//! - the model configuration (`config.json`), including `id2label`
//! - the tokenizer (`tokenizer.json`, or a WordPiece tokenizer rebuilt from `vocab.txt`)
//! - the weights (`model.safetensors`, or `pytorch_model.bin`)
//!
//! ## Main Types
//!
//! - [`HfLoader`] - Resolves one file of a checkpoint, from a local directory or the Hub
//! - [`TokenizerLoader`] - Loads a tokenizer configured for classification input
//! - [`ClassifierConfigLoader`] - Loads the encoder config and label metadata
//! - [`WeightsLoader`] - Memory-maps or reads the weights into a [`VarBuilder`]
//!
//! A model id that names an existing directory is read from disk; anything
//! else is treated as a Hub repository and cached by `hf-hub`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::Config as BertConfig;
use serde::Deserialize;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::{
    DecoderWrapper, ModelWrapper, NormalizerWrapper, PaddingParams, PaddingStrategy,
    PostProcessorWrapper, PreTokenizerWrapper, Tokenizer, TokenizerBuilder, TruncationParams,
};

use crate::core::{Result, SentimentError};

/// Longest input, in tokens, the encoder accepts. Longer text is truncated.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub async fn load(&self) -> Result<PathBuf> {
        let local_dir = Path::new(&self.repo);
        if local_dir.is_dir() {
            let path = local_dir.join(&self.filename);
            if path.is_file() {
                return Ok(path);
            }
            return Err(SentimentError::ModelNotFound(format!(
                "'{}' not found in local model directory '{}'",
                self.filename, self.repo
            )));
        }

        let hf_api = hf_hub::api::tokio::ApiBuilder::new()
            .with_progress(false)
            .build()?;
        let path = hf_api.model(self.repo.clone()).get(&self.filename).await?;
        tracing::debug!(repo = %self.repo, file = %self.filename, "resolved checkpoint file");
        Ok(path)
    }
}

#[derive(Clone)]
pub struct TokenizerLoader {
    pub repo: String,
}

impl TokenizerLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    /// Load the tokenizer with truncation at [`MAX_SEQUENCE_LENGTH`] and
    /// batch-longest padding enabled.
    pub async fn load(&self) -> Result<Tokenizer> {
        let mut tokenizer = match HfLoader::new(&self.repo, "tokenizer.json").load().await {
            Ok(path) => Tokenizer::from_file(&path).map_err(|e| {
                SentimentError::Tokenization(format!(
                    "Failed to load tokenizer from '{}': {e}",
                    path.display()
                ))
            })?,
            Err(err) => {
                tracing::debug!("tokenizer.json unavailable ({err}), building from vocab.txt");
                let vocab_path = HfLoader::new(&self.repo, "vocab.txt").load().await?;
                wordpiece_tokenizer(&vocab_path)?
            }
        };

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| SentimentError::Tokenization(format!("Invalid truncation: {e}")))?;

        let (pad_id, pad_token) = match tokenizer.token_to_id("[PAD]") {
            Some(id) => (id, "[PAD]".to_string()),
            None => (0, "[PAD]".to_string()),
        };
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token,
            ..Default::default()
        }));

        Ok(tokenizer)
    }
}

/// Rebuild an uncased BERT WordPiece tokenizer from a bare `vocab.txt`.
fn wordpiece_tokenizer(vocab_path: &Path) -> Result<Tokenizer> {
    let vocab_file = vocab_path.to_str().ok_or_else(|| {
        SentimentError::Tokenization(format!("Non UTF-8 vocab path {}", vocab_path.display()))
    })?;
    let vocab = WordPiece::read_file(vocab_file)
        .map_err(|e| SentimentError::Tokenization(format!("Failed to read vocab: {e}")))?;

    let special = |token: &str| -> Result<(String, u32)> {
        vocab
            .get(token)
            .map(|&id| (token.to_string(), id))
            .ok_or_else(|| {
                SentimentError::Tokenization(format!("Vocabulary has no {token} token"))
            })
    };
    let sep = special("[SEP]")?;
    let cls = special("[CLS]")?;

    let wordpiece = WordPiece::builder()
        .vocab(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| SentimentError::Tokenization(format!("Failed to build WordPiece: {e}")))?;

    let tokenizer = TokenizerBuilder::<
        ModelWrapper,
        NormalizerWrapper,
        PreTokenizerWrapper,
        PostProcessorWrapper,
        DecoderWrapper,
    >::new()
    .with_model(wordpiece.into())
    .with_normalizer(Some(BertNormalizer::default().into()))
    .with_pre_tokenizer(Some(BertPreTokenizer.into()))
    .with_post_processor(Some(BertProcessing::new(sep, cls).into()))
    .build()
    .map_err(|e| SentimentError::Tokenization(format!("Failed to assemble tokenizer: {e}")))?;

    Ok(Tokenizer::from(tokenizer))
}

/// Encoder configuration together with the classification head metadata.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub bert: BertConfig,
    pub id2label: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

pub struct ClassifierConfigLoader {
    pub config_file_loader: HfLoader,
}

impl ClassifierConfigLoader {
    pub fn new(repo: &str) -> Self {
        Self {
            config_file_loader: HfLoader::new(repo, "config.json"),
        }
    }

    pub async fn load(&self) -> Result<ClassifierConfig> {
        let config_path = self.config_file_loader.load().await?;
        let content = tokio::fs::read_to_string(&config_path).await?;
        parse_classifier_config(&content)
    }
}

pub fn parse_classifier_config(content: &str) -> Result<ClassifierConfig> {
    let bert: BertConfig = serde_json::from_str(content)
        .map_err(|e| SentimentError::ModelFormat(format!("Failed to parse model config: {e}")))?;
    let class_cfg: ClassifierConfigJson = serde_json::from_str(content)?;
    Ok(ClassifierConfig {
        bert,
        id2label: class_cfg.id2label,
    })
}

pub struct WeightsLoader {
    pub repo: String,
}

impl WeightsLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    pub async fn load(&self, device: &Device) -> Result<VarBuilder<'static>> {
        let weights_path = match HfLoader::new(&self.repo, "model.safetensors").load().await {
            Ok(path) => path,
            Err(_) => HfLoader::new(&self.repo, "pytorch_model.bin")
                .load()
                .await
                .map_err(|e| {
                    SentimentError::ModelNotFound(format!(
                        "Model weights not found in '{}'. Expected `model.safetensors` or `pytorch_model.bin`: {e}",
                        self.repo
                    ))
                })?,
        };

        let dtype = DType::F32;
        let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
            // SAFETY: the checkpoint file is not modified while the process holds the mapping.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], dtype, device)? }
        } else if weights_path.extension().is_some_and(|e| e == "bin") {
            VarBuilder::from_pth(&weights_path, dtype, device)?
        } else {
            return Err(SentimentError::ModelFormat(format!(
                "Unsupported weight file format: {}",
                weights_path.display()
            )));
        };

        Ok(vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINBERT_CONFIG: &str = r#"{
        "architectures": ["BertForSequenceClassification"],
        "attention_probs_dropout_prob": 0.1,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.1,
        "hidden_size": 768,
        "id2label": {"0": "positive", "1": "negative", "2": "neutral"},
        "initializer_range": 0.02,
        "intermediate_size": 3072,
        "label2id": {"positive": 0, "negative": 1, "neutral": 2},
        "layer_norm_eps": 1e-12,
        "max_position_embeddings": 512,
        "model_type": "bert",
        "num_attention_heads": 12,
        "num_hidden_layers": 12,
        "pad_token_id": 0,
        "type_vocab_size": 2,
        "vocab_size": 30522
    }"#;

    #[test]
    fn parses_finbert_config() {
        let config = parse_classifier_config(FINBERT_CONFIG).unwrap();
        assert_eq!(config.bert.hidden_size, 768);
        assert_eq!(config.id2label.len(), 3);
        assert_eq!(config.id2label["1"], "negative");
    }

    #[test]
    fn rejects_non_bert_config() {
        let err = parse_classifier_config(r#"{"id2label": {}}"#).unwrap_err();
        assert!(matches!(err, SentimentError::ModelFormat(_)));
    }

    #[tokio::test]
    async fn local_directory_missing_file_is_model_not_found() {
        let dir = std::env::temp_dir();
        let loader = HfLoader::new(dir.to_str().unwrap(), "definitely-not-a-checkpoint.bin");
        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, SentimentError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn builds_wordpiece_tokenizer_from_vocab() {
        let dir = std::env::temp_dir().join(format!("finbert-vocab-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let vocab = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "profits", "record", "rise"];
        std::fs::write(dir.join("vocab.txt"), vocab.join("\n")).unwrap();

        let tokenizer = TokenizerLoader::new(dir.to_str().unwrap())
            .load()
            .await
            .unwrap();
        let encoding = tokenizer.encode("Record PROFITS rise", true).unwrap();
        assert_eq!(encoding.get_ids(), &[2, 5, 4, 6, 3]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
