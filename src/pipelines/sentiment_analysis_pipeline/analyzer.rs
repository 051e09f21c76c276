use serde::Serialize;

use super::labels::SentimentLabel;
use super::model::Prediction;
use crate::core::Result;

/// Anything that can turn one piece of text into a [`Prediction`].
///
/// Implemented by [`SentimentAnalysisPipeline`](super::SentimentAnalysisPipeline);
/// the request mapper and both service surfaces only see this trait.
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction>;

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierInfo {
    pub model_id: String,
    pub device: String,
}

impl Default for ClassifierInfo {
    fn default() -> Self {
        Self {
            model_id: "unknown".to_string(),
            device: "cpu".to_string(),
        }
    }
}

impl<C: SentimentClassifier + ?Sized> SentimentClassifier for std::sync::Arc<C> {
    fn classify(&self, text: &str) -> Result<Prediction> {
        (**self).classify(text)
    }

    fn info(&self) -> ClassifierInfo {
        (**self).info()
    }
}

/// Classify `text`, keeping the distinction between "nothing to classify"
/// (`Ok(None)`), a failed model call (`Err`) and a real prediction.
pub fn classify_text<C>(text: &str, classifier: &C) -> Result<Option<Prediction>>
where
    C: SentimentClassifier + ?Sized,
{
    if text.trim().is_empty() {
        return Ok(None);
    }
    let mut prediction = classifier.classify(text)?;
    prediction.confidence = prediction.confidence.clamp(0.0, 1.0);
    Ok(Some(prediction))
}

/// Classify `text`, degrading to `(neutral, 0.0)` for blank input and for
/// any tokenization or inference failure.
pub fn analyze<C>(text: &str, classifier: &C) -> (SentimentLabel, f32)
where
    C: SentimentClassifier + ?Sized,
{
    match classify_text(text, classifier) {
        Ok(Some(prediction)) => (prediction.label, prediction.confidence),
        Ok(None) => {
            tracing::warn!("Empty text provided for sentiment analysis.");
            (SentimentLabel::Neutral, 0.0)
        }
        Err(err) => {
            tracing::error!("Error during sentiment analysis: {err}");
            (SentimentLabel::Neutral, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SentimentError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Calls counted so blank input can be shown to skip the model.
    struct CountingClassifier {
        calls: AtomicUsize,
        result: fn(&str) -> Result<Prediction>,
    }

    impl CountingClassifier {
        fn new(result: fn(&str) -> Result<Prediction>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SentimentClassifier for CountingClassifier {
        fn classify(&self, text: &str) -> Result<Prediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)(text)
        }
    }

    fn by_keyword(text: &str) -> Result<Prediction> {
        let label = if text.contains("profit") {
            SentimentLabel::Positive
        } else if text.contains("loss") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        Ok(Prediction {
            label,
            confidence: 0.87,
        })
    }

    fn always_fails(_: &str) -> Result<Prediction> {
        Err(SentimentError::Inference("forward pass exploded".into()))
    }

    fn overconfident(_: &str) -> Result<Prediction> {
        Ok(Prediction {
            label: SentimentLabel::Positive,
            confidence: 1.000_001,
        })
    }

    #[test]
    fn blank_text_is_neutral_without_model_call() {
        let classifier = CountingClassifier::new(by_keyword);
        assert_eq!(analyze("", &classifier), (SentimentLabel::Neutral, 0.0));
        assert_eq!(analyze("   ", &classifier), (SentimentLabel::Neutral, 0.0));
        assert_eq!(analyze("\n\t", &classifier), (SentimentLabel::Neutral, 0.0));
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn prediction_passes_through() {
        let classifier = CountingClassifier::new(by_keyword);
        let (label, confidence) = analyze("Company XYZ reports record profits", &classifier);
        assert_eq!(label, SentimentLabel::Positive);
        assert!((0.0..=1.0).contains(&confidence));
        assert_eq!(classifier.calls(), 1);
    }

    #[test]
    fn failure_degrades_to_neutral() {
        let classifier = CountingClassifier::new(always_fails);
        assert_eq!(
            analyze("Shares plunge after guidance cut", &classifier),
            (SentimentLabel::Neutral, 0.0)
        );
        assert!(classify_text("Shares plunge", &classifier).is_err());
    }

    #[test]
    fn classify_text_distinguishes_empty_from_neutral() {
        let classifier = CountingClassifier::new(by_keyword);
        assert_eq!(classify_text(" ", &classifier).unwrap(), None);
        let prediction = classify_text("Board meeting scheduled", &classifier)
            .unwrap()
            .unwrap();
        assert_eq!(prediction.label, SentimentLabel::Neutral);
    }

    #[test]
    fn confidence_is_clamped() {
        let classifier = CountingClassifier::new(overconfident);
        let (_, confidence) = analyze("anything", &classifier);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn repeated_calls_agree() {
        let classifier = CountingClassifier::new(by_keyword);
        let text = "Quarterly loss widens";
        assert_eq!(analyze(text, &classifier), analyze(text, &classifier));
    }

    #[test]
    fn works_through_arc_dyn() {
        let classifier: std::sync::Arc<dyn SentimentClassifier> =
            std::sync::Arc::new(CountingClassifier::new(by_keyword));
        assert_eq!(analyze("net loss", &classifier).0, SentimentLabel::Negative);
        assert_eq!(classifier.info(), ClassifierInfo::default());
    }
}
