use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    // Model loading
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid model format: {0}")]
    ModelFormat(String),

    #[error("Model metadata missing: {0}")]
    ModelMetadata(String),

    // Tokenization
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    // Inference
    #[error("Inference failed: {0}")]
    Inference(String),

    // Device
    #[error("Device error: {0}")]
    Device(String),

    // Network/Download
    #[error("Download failed: {0}")]
    Download(String),

    // Settings
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Message queue
    #[error("Transport error: {0}")]
    Transport(String),

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SentimentError>;

impl From<hf_hub::api::tokio::ApiError> for SentimentError {
    fn from(value: hf_hub::api::tokio::ApiError) -> Self {
        SentimentError::Download(value.to_string())
    }
}
