use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Result, SentimentError};

/// The three classes a financial sentiment head produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Ok(SentimentLabel::Positive),
            "neutral" | "neu" => Ok(SentimentLabel::Neutral),
            "negative" | "neg" => Ok(SentimentLabel::Negative),
            other => Err(SentimentError::ModelMetadata(format!(
                "Unknown sentiment label '{other}'"
            ))),
        }
    }
}

/// Class index to label table for a classification head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<SentimentLabel>,
}

impl Default for LabelMap {
    /// Positive, neutral, negative.
    fn default() -> Self {
        Self {
            labels: SentimentLabel::ALL.to_vec(),
        }
    }
}

impl LabelMap {
    /// Build the table from a checkpoint's `id2label` metadata.
    ///
    /// Every index in `0..3` must be present exactly once and every label must
    /// name one of the three sentiments.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Result<Self> {
        if id2label.len() != SentimentLabel::ALL.len() {
            return Err(SentimentError::ModelMetadata(format!(
                "Expected {} labels in id2label, found {}",
                SentimentLabel::ALL.len(),
                id2label.len()
            )));
        }

        let mut slots: [Option<SentimentLabel>; 3] = [None; 3];
        for (id, name) in id2label {
            let index: usize = id.trim().parse().map_err(|_| {
                SentimentError::ModelMetadata(format!("Non-numeric label id '{id}'"))
            })?;
            let slot = slots.get_mut(index).ok_or_else(|| {
                SentimentError::ModelMetadata(format!("Label id {index} out of range"))
            })?;
            *slot = Some(name.parse()?);
        }

        let labels: Vec<SentimentLabel> = slots.into_iter().flatten().collect();
        let distinct = SentimentLabel::ALL
            .iter()
            .all(|label| labels.contains(label));
        if labels.len() != SentimentLabel::ALL.len() || !distinct {
            return Err(SentimentError::ModelMetadata(format!(
                "id2label must name each sentiment once, got {id2label:?}"
            )));
        }

        Ok(Self { labels })
    }

    /// Like [`LabelMap::from_id2label`], but falls back to the default order
    /// when the metadata is missing or unusable.
    pub fn from_id2label_or_default(id2label: &HashMap<String, String>) -> Self {
        if id2label.is_empty() {
            tracing::warn!("checkpoint has no id2label metadata, using default label order");
            return Self::default();
        }
        match Self::from_id2label(id2label) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!("{err}; using default label order");
                Self::default()
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<SentimentLabel> {
        self.labels.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
