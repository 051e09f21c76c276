use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finbert_sentiment::core::Settings;
use finbert_sentiment::pipelines::utils::DeviceRequest;
use finbert_sentiment::service::http;
use finbert_sentiment::{SentimentAnalysisPipelineBuilder, SentimentClassifier};

#[derive(Parser)]
#[command(name = "finbert-sentiment", version, about = "FinBERT sentiment over HTTP or Kafka")]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ModelArgs {
    /// Hugging Face model id or local checkpoint directory (overrides FINBERT_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<String>,

    /// auto, cpu, cuda or cuda:N (overrides MODEL_DEVICE)
    #[arg(long, global = true)]
    device: Option<DeviceRequest>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve POST /analyze
    Serve {
        /// Listen address (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Consume text from Kafka and publish sentiment
    Consume {
        /// Input topic (overrides KAFKA_CONSUMER_TOPIC)
        #[arg(long)]
        input_topic: Option<String>,

        /// Output topic (overrides KAFKA_PRODUCER_TOPIC)
        #[arg(long)]
        output_topic: Option<String>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,finbert_sentiment=debug"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load settings")?;
    init_tracing();

    if let Some(model) = cli.model.model {
        settings.model.model_id = model;
    }
    if let Some(device) = cli.model.device {
        settings.model.device = device;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "finbert-sentiment starting up");

    let pipeline = SentimentAnalysisPipelineBuilder::finbert(settings.model.model_id.clone())
        .device_request(settings.model.device.clone())
        .build()
        .await
        .with_context(|| format!("failed to load model '{}'", settings.model.model_id))?;
    let classifier: Arc<dyn SentimentClassifier> = Arc::new(pipeline);

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.http.host = host;
            }
            if let Some(port) = port {
                settings.http.port = port;
            }
            http::serve(classifier, &settings.http)
                .await
                .context("HTTP server failed")?;
        }
        Command::Consume {
            input_topic,
            output_topic,
        } => {
            if let Some(topic) = input_topic {
                settings.kafka.consumer_topic = topic;
            }
            if let Some(topic) = output_topic {
                settings.kafka.producer_topic = topic;
            }
            consume(classifier, &settings).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "kafka")]
async fn consume(classifier: Arc<dyn SentimentClassifier>, settings: &Settings) -> Result<()> {
    let stats = finbert_sentiment::service::queue::kafka::consume(classifier, &settings.kafka)
        .await
        .context("Kafka consumer failed")?;
    info!(published = stats.published, "consumer finished");
    Ok(())
}

#[cfg(not(feature = "kafka"))]
async fn consume(_classifier: Arc<dyn SentimentClassifier>, _settings: &Settings) -> Result<()> {
    anyhow::bail!("built without the `kafka` feature; rebuild with --features kafka")
}
