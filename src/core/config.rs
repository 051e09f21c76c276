//! Service settings.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. Every field has a default so the service
//! starts against a local Kafka broker and the public FinBERT checkpoint
//! without any configuration.

use std::time::Duration;

use crate::core::error::{Result, SentimentError};
use crate::pipelines::utils::DeviceRequest;

pub const DEFAULT_MODEL_ID: &str = "ProsusAI/finbert";

#[derive(Debug, Clone)]
pub struct Settings {
    pub model: ModelSettings,
    pub http: HttpSettings,
    pub kafka: KafkaSettings,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Hugging Face repository id, or a local directory holding the checkpoint.
    pub model_id: String,
    pub device: DeviceRequest,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub bootstrap_servers: String,
    pub group_id: String,
    pub consumer_topic: String,
    pub producer_topic: String,
    pub auto_offset_reset: String,
    pub poll_timeout: Duration,
}

impl Settings {
    /// Load settings from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let device = get("MODEL_DEVICE", "auto").parse::<DeviceRequest>()?;

        let port = get("PORT", "8082")
            .parse::<u16>()
            .map_err(|e| SentimentError::Config(format!("Invalid PORT value: {e}")))?;

        let allowed_origins = get(
            "ALLOWED_ORIGINS",
            "http://localhost:8080,http://localhost:8081,http://0.0.0.0:8080",
        )
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

        let poll_timeout_ms = get("KAFKA_POLL_TIMEOUT_MS", "1000")
            .parse::<u64>()
            .map_err(|e| {
                SentimentError::Config(format!("Invalid KAFKA_POLL_TIMEOUT_MS value: {e}"))
            })?;

        let auto_offset_reset = get("KAFKA_AUTO_OFFSET_RESET", "earliest");
        if !matches!(auto_offset_reset.as_str(), "earliest" | "latest" | "error") {
            return Err(SentimentError::Config(format!(
                "Invalid KAFKA_AUTO_OFFSET_RESET value '{auto_offset_reset}' (use earliest, latest or error)"
            )));
        }

        Ok(Self {
            model: ModelSettings {
                model_id: get("FINBERT_MODEL_PATH", DEFAULT_MODEL_ID),
                device,
            },
            http: HttpSettings {
                host: get("HOST", "0.0.0.0"),
                port,
                allowed_origins,
            },
            kafka: KafkaSettings {
                bootstrap_servers: get("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
                group_id: get("KAFKA_GROUP_ID", "sentiment-analysis"),
                consumer_topic: get("KAFKA_CONSUMER_TOPIC", "news-text"),
                producer_topic: get("KAFKA_PRODUCER_TOPIC", "news-sentiment"),
                auto_offset_reset,
                poll_timeout: Duration::from_millis(poll_timeout_ms),
            },
        })
    }
}

impl HttpSettings {
    /// Host and port to listen on. The host may be an IP literal or a name
    /// the resolver knows, e.g. `localhost`.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
