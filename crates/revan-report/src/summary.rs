//! Aggregate statistics over a finalized batch run.

use std::collections::{BTreeMap, HashMap};

use revan_core::{BatchRun, FailureKind, RunStatus, Sentiment};
use serde::Serialize;
use uuid::Uuid;

/// Label used for results that carry neither a product name nor id.
const UNKNOWN_PRODUCT: &str = "(unknown)";

/// Sentiment counts for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductBreakdown {
    pub product: String,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl ProductBreakdown {
    fn new(product: String) -> Self {
        Self {
            product,
            positive: 0,
            neutral: 0,
            negative: 0,
        }
    }

    fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Summary statistics for one [`BatchRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub total: usize,
    pub analyzed: usize,
    pub failed: usize,
    /// Results whose model response needed the fallback parse.
    pub fallback_parses: usize,
    /// One entry per sentiment, always all three, in `Sentiment::ALL` order.
    pub sentiment_counts: Vec<(Sentiment, usize)>,
    /// Most frequent first; ties broken by topic name.
    pub topic_counts: Vec<(String, usize)>,
    pub failure_counts: Vec<(FailureKind, usize)>,
    /// Sorted by product label.
    pub products: Vec<ProductBreakdown>,
}

impl BatchSummary {
    #[must_use]
    pub fn from_run(run: &BatchRun) -> Self {
        let mut sentiments: HashMap<Sentiment, usize> = HashMap::new();
        let mut topics: HashMap<&str, usize> = HashMap::new();
        let mut products: BTreeMap<&str, ProductBreakdown> = BTreeMap::new();

        for result in run.results() {
            *sentiments.entry(result.sentiment).or_default() += 1;
            for topic in &result.topics {
                *topics.entry(topic.as_str()).or_default() += 1;
            }
            let label = result
                .product_name
                .as_deref()
                .or(result.product_id.as_deref())
                .unwrap_or(UNKNOWN_PRODUCT);
            products
                .entry(label)
                .or_insert_with(|| ProductBreakdown::new(label.to_string()))
                .add(result.sentiment);
        }

        let sentiment_counts = Sentiment::ALL
            .iter()
            .map(|s| (*s, sentiments.get(s).copied().unwrap_or(0)))
            .collect();

        let mut topic_counts: Vec<(String, usize)> = topics
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        topic_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut failures: BTreeMap<FailureKind, usize> = BTreeMap::new();
        for failure in run.failures() {
            *failures.entry(failure.kind).or_default() += 1;
        }

        Self {
            run_id: run.id(),
            status: run.status(),
            total: run.total(),
            analyzed: run.results().len(),
            failed: run.failures().len(),
            fallback_parses: run.results().iter().filter(|r| r.is_fallback()).count(),
            sentiment_counts,
            topic_counts,
            failure_counts: failures.into_iter().collect(),
            products: products.into_values().collect(),
        }
    }

    #[must_use]
    pub fn sentiment_count(&self, sentiment: Sentiment) -> usize {
        self.sentiment_counts
            .iter()
            .find(|(s, _)| *s == sentiment)
            .map_or(0, |(_, n)| *n)
    }

    #[must_use]
    pub fn unique_topics(&self) -> usize {
        self.topic_counts.len()
    }
}

#[cfg(test)]
mod tests {
    use revan_core::{AnalysisResult, BatchRecorder, ParseQuality, ReviewFailure};

    use super::*;

    fn result(id: &str, sentiment: Sentiment, topics: &[&str], product: Option<&str>) -> AnalysisResult {
        AnalysisResult {
            review_id: id.to_string(),
            sentiment,
            topics: topics.iter().map(|t| (*t).to_string()).collect(),
            summary: format!("summary of {id}"),
            parse: ParseQuality::Full,
            product_id: None,
            product_name: product.map(str::to_string),
        }
    }

    fn sample_run() -> BatchRun {
        let recorder = BatchRecorder::new();
        recorder.record_success(0, result("a", Sentiment::Positive, &["delivery", "quality"], Some("Lamp")));
        recorder.record_success(1, result("b", Sentiment::Positive, &["quality"], Some("Lamp")));
        recorder.record_success(2, result("c", Sentiment::Negative, &["pricing"], Some("Kettle")));
        let mut fallback = result("d", Sentiment::Neutral, &[], None);
        fallback.parse = ParseQuality::Fallback;
        recorder.record_success(3, fallback);
        recorder.record_failure(
            4,
            ReviewFailure {
                review_id: "e".to_string(),
                kind: FailureKind::Timeout,
                reason: "request timed out".to_string(),
            },
        );
        recorder.finish(RunStatus::Completed)
    }

    #[test]
    fn counts_results_and_failures() {
        let summary = BatchSummary::from_run(&sample_run());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.analyzed, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fallback_parses, 1);
        assert_eq!(summary.failure_counts, [(FailureKind::Timeout, 1)]);
    }

    #[test]
    fn all_sentiments_are_present() {
        let summary = BatchSummary::from_run(&sample_run());
        assert_eq!(
            summary.sentiment_counts,
            [
                (Sentiment::Positive, 2),
                (Sentiment::Neutral, 1),
                (Sentiment::Negative, 1)
            ]
        );
        assert_eq!(summary.sentiment_count(Sentiment::Negative), 1);
    }

    #[test]
    fn topics_sorted_by_count_then_name() {
        let summary = BatchSummary::from_run(&sample_run());
        assert_eq!(
            summary.topic_counts,
            [
                ("quality".to_string(), 2),
                ("delivery".to_string(), 1),
                ("pricing".to_string(), 1)
            ]
        );
        assert_eq!(summary.unique_topics(), 3);
    }

    #[test]
    fn groups_products_by_name() {
        let summary = BatchSummary::from_run(&sample_run());
        let labels: Vec<&str> = summary.products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(labels, ["(unknown)", "Kettle", "Lamp"]);
        let lamp = &summary.products[2];
        assert_eq!((lamp.positive, lamp.neutral, lamp.negative), (2, 0, 0));
        assert_eq!(lamp.total(), 2);
    }

    #[test]
    fn empty_run_has_zeroed_sentiments() {
        let run = BatchRecorder::new().finish(RunStatus::Completed);
        let summary = BatchSummary::from_run(&run);
        assert_eq!(summary.total, 0);
        assert!(summary.sentiment_counts.iter().all(|(_, n)| *n == 0));
        assert!(summary.topic_counts.is_empty());
        assert!(summary.products.is_empty());
    }

    #[test]
    fn serializes_to_json() {
        let summary = BatchSummary::from_run(&sample_run());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["sentiment_counts"][0][0], "positive");
    }
}
