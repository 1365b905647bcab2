use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw product review as ingested from the input source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Caller-supplied identifier. Batch runs fall back to `row-<n>` when absent.
    pub id: Option<String>,
    pub text: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Review {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            product_id: None,
            product_name: None,
            date: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_product(mut self, product_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self.product_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Identifier used for this review inside a batch run.
    ///
    /// `position` is the zero-based input index; keys derived from it are
    /// 1-based (`row-1` is the first review).
    #[must_use]
    pub fn key(&self, position: usize) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("row-{}", position + 1),
        }
    }

    /// Returns `true` if the review text is empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Parse an exact sentiment label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a model response matched the expected format or was salvaged
/// with default values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseQuality {
    Full,
    Fallback,
}

/// Structured analysis derived from one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub review_id: String,
    pub sentiment: Sentiment,
    /// Canonical topic names from the active vocabulary.
    pub topics: BTreeSet<String>,
    pub summary: String,
    pub parse: ParseQuality,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
}

impl AnalysisResult {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.parse == ParseQuality::Fallback
    }

    /// Topics joined with `;` for flat exports.
    #[must_use]
    pub fn topics_joined(&self) -> String {
        self.topics
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefers_explicit_id() {
        let review = Review::new("great").with_id("r-42");
        assert_eq!(review.key(0), "r-42");
    }

    #[test]
    fn key_falls_back_to_one_based_row() {
        assert_eq!(Review::new("great").key(0), "row-1");
        assert_eq!(Review::new("great").key(9), "row-10");
    }

    #[test]
    fn key_ignores_blank_id() {
        let review = Review::new("great").with_id("   ");
        assert_eq!(review.key(2), "row-3");
    }

    #[test]
    fn blank_detection() {
        assert!(Review::new("").is_blank());
        assert!(Review::new(" \n\t ").is_blank());
        assert!(!Review::new("ok").is_blank());
    }

    #[test]
    fn sentiment_from_label_is_case_insensitive() {
        assert_eq!(Sentiment::from_label("POSITIVE"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label(" neutral "), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::from_label("Negative"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("mixed"), None);
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
    }

    #[test]
    fn topics_joined_is_sorted() {
        let result = AnalysisResult {
            review_id: "1".to_string(),
            sentiment: Sentiment::Positive,
            topics: ["quality".to_string(), "delivery".to_string()]
                .into_iter()
                .collect(),
            summary: "ok".to_string(),
            parse: ParseQuality::Full,
            product_id: None,
            product_name: None,
        };
        assert_eq!(result.topics_joined(), "delivery;quality");
    }
}
