pub mod config;
pub mod error;

pub use config::{HttpSettings, KafkaSettings, ModelSettings, Settings, DEFAULT_MODEL_ID};
pub use error::{Result, SentimentError};
