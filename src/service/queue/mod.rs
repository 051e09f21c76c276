//! Queue surface: consume raw text, publish sentiment.
//!
//! The loop is written against [`MessageSource`] and [`MessageSink`]; the
//! Kafka implementations live in [`kafka`] behind the `kafka` feature.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::pipelines::sentiment_analysis_pipeline::{analyze, SentimentClassifier, SentimentLabel};

#[cfg(feature = "kafka")]
pub mod kafka;

/// Record published for every consumed text message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentMessage {
    pub text: String,
    pub sentiment: SentimentLabel,
    pub confidence: f32,
}

#[allow(async_fn_in_trait)]
pub trait MessageSource {
    /// Wait up to `timeout` for the next payload; `Ok(None)` if nothing arrived.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>>;
}

#[allow(async_fn_in_trait)]
pub trait MessageSink {
    async fn publish(&self, message: &SentimentMessage) -> Result<()>;

    /// Push out anything still buffered. Called once when the loop stops.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub published: u64,
    /// Payloads that were not valid UTF-8.
    pub skipped: u64,
    pub transport_errors: u64,
    pub publish_errors: u64,
}

/// Poll, analyze and publish until `shutdown` resolves.
///
/// Transport and publish errors are logged and the loop keeps going; after a
/// transport error it waits `poll_timeout` before polling again. A
/// message that is not UTF-8 is logged and dropped without producing output.
pub async fn run_consumer<S, K, C, F>(
    source: &mut S,
    sink: &K,
    classifier: Arc<C>,
    poll_timeout: Duration,
    shutdown: F,
) -> ConsumerStats
where
    S: MessageSource,
    K: MessageSink,
    C: SentimentClassifier + ?Sized + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = ConsumerStats::default();

    loop {
        let polled = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down consumer.");
                break;
            }
            polled = source.poll(poll_timeout) => polled,
        };

        let payload = match polled {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(err) => {
                stats.transport_errors += 1;
                tracing::error!("Consumer error: {err}");
                // wait before polling a failing broker again
                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!("Shutting down consumer.");
                        break;
                    }
                    _ = tokio::time::sleep(poll_timeout) => {}
                }
                continue;
            }
        };
        stats.received += 1;

        let text = match String::from_utf8(payload) {
            Ok(text) => text,
            Err(err) => {
                stats.skipped += 1;
                tracing::warn!("Dropping message that is not valid UTF-8: {err}");
                continue;
            }
        };

        let classifier = Arc::clone(&classifier);
        let analyzed = tokio::task::spawn_blocking(move || {
            let (sentiment, confidence) = analyze(&text, classifier.as_ref());
            SentimentMessage {
                text,
                sentiment,
                confidence,
            }
        })
        .await;
        let message = match analyzed {
            Ok(message) => message,
            Err(err) => {
                stats.skipped += 1;
                tracing::error!("Analysis task failed: {err}");
                continue;
            }
        };

        match sink.publish(&message).await {
            Ok(()) => stats.published += 1,
            Err(err) => {
                stats.publish_errors += 1;
                tracing::error!("Failed to produce message: {err}");
            }
        }
    }

    if let Err(err) = sink.flush().await {
        tracing::warn!("Failed to flush producer: {err}");
    }
    tracing::info!(
        received = stats.received,
        published = stats.published,
        skipped = stats.skipped,
        transport_errors = stats.transport_errors,
        publish_errors = stats.publish_errors,
        "consumer stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_format() {
        let message = SentimentMessage {
            text: "Shares slump".into(),
            sentiment: SentimentLabel::Negative,
            confidence: 0.5,
        };
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"text":"Shares slump","sentiment":"negative","confidence":0.5}"#
        );
    }
}
