//! Company news records in, sentiment records out.

use serde::{Deserialize, Serialize};

use crate::pipelines::sentiment_analysis_pipeline::{analyze, SentimentClassifier, SentimentLabel};

/// One company news article as delivered by the news feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub category: Option<String>,
    /// Publication time, unix seconds.
    #[serde(default)]
    pub datetime: Option<i64>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
    /// Ticker of the company the article is about.
    #[serde(default)]
    pub related: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewsItem {
    /// The headline if non-empty, else the summary if non-empty.
    pub fn analyzable_text(&self) -> Option<&str> {
        [self.headline.as_deref(), self.summary.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub date: Option<i64>,
    pub sentiment: SentimentLabel,
    pub confidence: f32,
    pub ticker: Option<String>,
    pub id: Option<i64>,
}

/// Analyze every item that has text, one model call per item.
///
/// Items without a headline or summary produce no record; the rest keep
/// their input order.
pub fn map_all<C>(items: &[NewsItem], classifier: &C) -> Vec<SentimentResult>
where
    C: SentimentClassifier + ?Sized,
{
    items
        .iter()
        .filter_map(|item| {
            let Some(text) = item.analyzable_text() else {
                tracing::debug!(id = ?item.id, "skipping news item without text");
                return None;
            };
            let (sentiment, confidence) = analyze(text, classifier);
            Some(SentimentResult {
                date: item.datetime,
                sentiment,
                confidence,
                ticker: item.related.clone(),
                id: item.id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Result;
    use crate::pipelines::sentiment_analysis_pipeline::Prediction;

    struct HeadlineEcho;

    impl SentimentClassifier for HeadlineEcho {
        fn classify(&self, text: &str) -> Result<Prediction> {
            let label = if text.contains("profits") {
                SentimentLabel::Positive
            } else if text.contains("lawsuit") {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Neutral
            };
            Ok(Prediction {
                label,
                confidence: 0.9,
            })
        }
    }

    fn item(headline: Option<&str>, summary: Option<&str>, id: i64) -> NewsItem {
        NewsItem {
            headline: headline.map(String::from),
            summary: summary.map(String::from),
            id: Some(id),
            datetime: Some(1_633_036_800 + id),
            related: Some(format!("T{id}")),
            ..Default::default()
        }
    }

    #[test]
    fn headline_wins_over_summary() {
        let news = item(Some("Headline"), Some("Summary"), 1);
        assert_eq!(news.analyzable_text(), Some("Headline"));

        let news = item(Some(""), Some("Summary"), 1);
        assert_eq!(news.analyzable_text(), Some("Summary"));

        let news = item(None, Some(""), 1);
        assert_eq!(news.analyzable_text(), None);
    }

    #[test]
    fn scenario_one_valid_one_empty() {
        let items = vec![
            NewsItem {
                headline: Some("Company XYZ reports record profits".into()),
                datetime: Some(1_633_036_800),
                id: Some(1),
                related: Some("XYZ".into()),
                ..Default::default()
            },
            NewsItem::default(),
        ];

        let results = map_all(&items, &HeadlineEcho);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.id, Some(1));
        assert_eq!(result.ticker.as_deref(), Some("XYZ"));
        assert_eq!(result.date, Some(1_633_036_800));
        assert!(SentimentLabel::ALL.contains(&result.sentiment));
    }

    #[test]
    fn all_empty_batch_yields_nothing() {
        let items = vec![NewsItem::default(); 5];
        assert!(map_all(&items, &HeadlineEcho).is_empty());
    }

    #[test]
    fn output_matches_items_with_text_in_order() {
        let items = vec![
            item(Some("record profits"), None, 1),
            item(None, None, 2),
            item(None, Some("lawsuit filed"), 3),
            item(Some(""), Some(""), 4),
            item(Some("   "), None, 5),
        ];
        let expected = items.iter().filter(|i| i.analyzable_text().is_some()).count();

        let results = map_all(&items, &HeadlineEcho);
        assert_eq!(results.len(), expected);
        assert_eq!(
            results.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![Some(1), Some(3), Some(5)]
        );

        for result in &results {
            let source = items.iter().find(|i| i.id == result.id).unwrap();
            assert_eq!(result.date, source.datetime);
            assert_eq!(result.ticker, source.related);
        }

        assert_eq!(results[0].sentiment, SentimentLabel::Positive);
        assert_eq!(results[1].sentiment, SentimentLabel::Negative);
        // whitespace-only headline is kept but never reaches the model
        assert_eq!(results[2].sentiment, SentimentLabel::Neutral);
        assert_eq!(results[2].confidence, 0.0);
    }

    #[test]
    fn result_serializes_missing_fields_as_null() {
        let result = SentimentResult {
            date: None,
            sentiment: SentimentLabel::Neutral,
            confidence: 0.0,
            ticker: None,
            id: Some(7),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": null,
                "sentiment": "neutral",
                "confidence": 0.0,
                "ticker": null,
                "id": 7
            })
        );
    }
}
