//! Kafka transport for the queue surface.

use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::Message;

use super::{run_consumer, ConsumerStats, MessageSink, MessageSource, SentimentMessage};
use crate::core::{KafkaSettings, Result, SentimentError};
use crate::pipelines::sentiment_analysis_pipeline::SentimentClassifier;
use crate::service::shutdown_signal;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to Kafka and run the consumer loop until Ctrl-C or SIGTERM.
pub async fn consume(
    classifier: Arc<dyn SentimentClassifier>,
    settings: &KafkaSettings,
) -> Result<ConsumerStats> {
    let mut source = KafkaSource::connect(settings)?;
    let sink = KafkaSink::connect(settings)?;
    tracing::info!(topic = %settings.producer_topic, "publishing sentiment");

    let stats = run_consumer(
        &mut source,
        &sink,
        classifier,
        settings.poll_timeout,
        shutdown_signal(),
    )
    .await;
    Ok(stats)
}

fn transport(err: KafkaError) -> SentimentError {
    SentimentError::Transport(err.to_string())
}

/// Subscribed consumer on the input topic. Dropping it closes the connection.
pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    pub fn connect(settings: &KafkaSettings) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &settings.bootstrap_servers)
            .set("group.id", &settings.group_id)
            .set("auto.offset.reset", &settings.auto_offset_reset)
            .create()
            .map_err(transport)?;
        consumer
            .subscribe(&[settings.consumer_topic.as_str()])
            .map_err(transport)?;

        tracing::info!(
            servers = %settings.bootstrap_servers,
            group = %settings.group_id,
            topic = %settings.consumer_topic,
            "subscribed to input topic"
        );
        Ok(Self { consumer })
    }
}

impl MessageSource for KafkaSource {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_elapsed) => Ok(None),
            Ok(Err(err)) => Err(transport(err)),
            Ok(Ok(message)) => match message.payload() {
                Some(payload) => Ok(Some(payload.to_vec())),
                None => {
                    tracing::debug!(
                        topic = message.topic(),
                        partition = message.partition(),
                        offset = message.offset(),
                        "ignoring message without payload"
                    );
                    Ok(None)
                }
            },
        }
    }
}

/// Producer on the output topic. Delivery reports are logged asynchronously.
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaSink {
    pub fn connect(settings: &KafkaSettings) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &settings.bootstrap_servers)
            .create()
            .map_err(transport)?;
        Ok(Self {
            producer,
            topic: settings.producer_topic.clone(),
        })
    }
}

impl MessageSink for KafkaSink {
    async fn publish(&self, message: &SentimentMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        let record = FutureRecord::<(), _>::to(&self.topic).payload(&payload);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(err, _record)| transport(err))?;

        let topic = self.topic.clone();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(delivered)) => {
                    tracing::debug!(topic = %topic, "Message delivered: {delivered:?}")
                }
                Ok(Err((err, _message))) => tracing::error!("Message delivery failed: {err}"),
                Err(_canceled) => tracing::error!("Message delivery canceled"),
            }
        });
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        // rdkafka's flush blocks the calling thread
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(FLUSH_TIMEOUT)))
            .await
            .map_err(|e| SentimentError::Transport(format!("flush task failed: {e}")))?
            .map_err(transport)
    }
}
