//! Per-review analysis: prompt, call, parse.

use revan_core::{
    AnalysisMode, AnalysisResult, AppConfig, ParseQuality, Review, Sentiment, TopicVocabulary,
};

use crate::backend::ModelBackend;
use crate::error::AnalyzerError;
use crate::parse::{
    parse_combined, parse_sentiment_answer, parse_summary_answer, parse_topic_answer,
    ParsedAnalysis,
};
use crate::prompt::{combined_prompt, sentiment_prompt, summary_prompt, topic_prompt};

const DEFAULT_SUMMARY_MAX_CHARS: usize = 200;

/// Turns one [`Review`] into an [`AnalysisResult`] using a [`ModelBackend`].
pub struct Analyzer<B> {
    backend: B,
    vocabulary: TopicVocabulary,
    mode: AnalysisMode,
    summary_max_chars: usize,
}

impl<B: ModelBackend> Analyzer<B> {
    /// Analyzer with the built-in vocabulary, combined prompts and a
    /// 200-character summary cap.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            vocabulary: TopicVocabulary::default(),
            mode: AnalysisMode::Combined,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
        }
    }

    #[must_use]
    pub fn from_config(backend: B, config: &AppConfig, vocabulary: TopicVocabulary) -> Self {
        Self::new(backend)
            .with_vocabulary(vocabulary)
            .with_mode(config.analysis_mode)
            .with_summary_max_chars(config.summary_max_chars)
    }

    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: TopicVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_summary_max_chars(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars.max(1);
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn vocabulary(&self) -> &TopicVocabulary {
        &self.vocabulary
    }

    /// Analyze one review, recording it under `review_id`.
    ///
    /// Blank reviews are rejected before the backend is called. Answers that
    /// do not match the expected format produce a fallback result rather
    /// than an error.
    ///
    /// # Errors
    ///
    /// - [`AnalyzerError::EmptyInput`] for empty or whitespace-only text.
    /// - [`AnalyzerError::EmptyResponse`] if the model answers with nothing.
    /// - Any transport error surfaced by the backend.
    pub async fn analyze(
        &self,
        review: &Review,
        review_id: &str,
    ) -> Result<AnalysisResult, AnalyzerError> {
        if review.is_blank() {
            return Err(AnalyzerError::EmptyInput);
        }
        let text = review.text.trim();

        let parsed = match self.mode {
            AnalysisMode::Combined => {
                let raw = self
                    .backend
                    .generate(&combined_prompt(text, &self.vocabulary))
                    .await?;
                parse_combined(&raw, &self.vocabulary, self.summary_max_chars)?
            }
            AnalysisMode::PerField => self.analyze_per_field(text).await?,
        };

        if parsed.quality == ParseQuality::Fallback {
            tracing::warn!(
                review = review_id,
                mode = %self.mode,
                "model answer did not match the expected format, using fallback values"
            );
        } else {
            tracing::debug!(
                review = review_id,
                sentiment = %parsed.sentiment,
                topics = parsed.topics.len(),
                "review analyzed"
            );
        }

        Ok(AnalysisResult {
            review_id: review_id.to_owned(),
            sentiment: parsed.sentiment,
            topics: parsed.topics,
            summary: parsed.summary,
            parse: parsed.quality,
            product_id: review.product_id.clone(),
            product_name: review.product_name.clone(),
        })
    }

    /// Three round trips, one per field. Any unrecognised field downgrades
    /// the whole result to a fallback parse while keeping the fields that
    /// did parse.
    async fn analyze_per_field(&self, text: &str) -> Result<ParsedAnalysis, AnalyzerError> {
        let sentiment_raw = self.backend.generate(&sentiment_prompt(text)).await?;
        let topic_raw = self
            .backend
            .generate(&topic_prompt(text, &self.vocabulary))
            .await?;
        let summary_raw = self.backend.generate(&summary_prompt(text)).await?;

        let sentiment = parse_sentiment_answer(&sentiment_raw)?;
        let topics = parse_topic_answer(&topic_raw, &self.vocabulary)?;
        let summary = parse_summary_answer(&summary_raw, self.summary_max_chars)?;

        let quality = if sentiment.is_some() && topics.is_some() {
            ParseQuality::Full
        } else {
            ParseQuality::Fallback
        };

        Ok(ParsedAnalysis {
            sentiment: sentiment.unwrap_or(Sentiment::Neutral),
            topics: topics.unwrap_or_default(),
            summary,
            quality,
        })
    }
}
