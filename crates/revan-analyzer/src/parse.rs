//! Parsing of free-text model answers into structured fields.
//!
//! The model is asked for a fixed format but is not bound by it. Anything
//! that does not match falls back to `Neutral`, no topics and the raw text
//! as summary, flagged as [`ParseQuality::Fallback`]. Only an empty answer is
//! an error.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use revan_core::{ParseQuality, Sentiment, TopicVocabulary};

use crate::error::AnalyzerError;

static SENTIMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(positive|neutral|negative)\b").expect("valid regex")
});

static FIELD_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:sentiment|main\s+topics?|topics?|summary|answer)\s*:\s*")
        .expect("valid regex")
});

/// Labels models use to say "no topic".
const NO_TOPIC: &[&str] = &["none", "n/a", "na", "nothing"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedAnalysis {
    pub sentiment: Sentiment,
    pub topics: BTreeSet<String>,
    pub summary: String,
    pub quality: ParseQuality,
}

/// Parse a combined `Sentiment | topics | summary` answer.
pub(crate) fn parse_combined(
    raw: &str,
    vocabulary: &TopicVocabulary,
    summary_max_chars: usize,
) -> Result<ParsedAnalysis, AnalyzerError> {
    let line = first_line(raw).ok_or(AnalyzerError::EmptyResponse)?;
    let line = line.trim_matches('`').trim().trim_matches('|').trim();

    if let Some(parsed) = parse_fields(line, vocabulary, summary_max_chars) {
        return Ok(parsed);
    }
    let fallback = fallback(raw, summary_max_chars);
    if fallback.summary.is_empty() {
        return Err(AnalyzerError::EmptyResponse);
    }
    Ok(fallback)
}

fn parse_fields(
    line: &str,
    vocabulary: &TopicVocabulary,
    summary_max_chars: usize,
) -> Option<ParsedAnalysis> {
    // The summary is free text and may itself contain pipes.
    let fields: Vec<&str> = line.splitn(3, '|').map(str::trim).collect();
    let [sentiment_field, topics_field, summary_field] = fields.as_slice() else {
        return None;
    };

    let sentiment = find_sentiment(sentiment_field)?;
    let summary = bound_summary(strip_field_label(summary_field), summary_max_chars);
    if summary.is_empty() {
        return None;
    }

    Some(ParsedAnalysis {
        sentiment,
        topics: parse_topics(topics_field, vocabulary),
        summary,
        quality: ParseQuality::Full,
    })
}

/// Sentiment from a per-field answer. `None` means unrecognised.
pub(crate) fn parse_sentiment_answer(raw: &str) -> Result<Option<Sentiment>, AnalyzerError> {
    let line = first_line(raw).ok_or(AnalyzerError::EmptyResponse)?;
    Ok(find_sentiment(line))
}

/// Topics from a per-field answer. `None` means no usable label was found.
pub(crate) fn parse_topic_answer(
    raw: &str,
    vocabulary: &TopicVocabulary,
) -> Result<Option<BTreeSet<String>>, AnalyzerError> {
    let line = first_line(raw).ok_or(AnalyzerError::EmptyResponse)?;
    let topics = parse_topics(strip_field_label(line), vocabulary);
    Ok((!topics.is_empty()).then_some(topics))
}

/// Summary from a per-field answer, bounded.
pub(crate) fn parse_summary_answer(
    raw: &str,
    summary_max_chars: usize,
) -> Result<String, AnalyzerError> {
    let line = first_line(raw).ok_or(AnalyzerError::EmptyResponse)?;
    let summary = bound_summary(strip_field_label(line), summary_max_chars);
    if summary.is_empty() {
        return Err(AnalyzerError::EmptyResponse);
    }
    Ok(summary)
}

fn fallback(raw: &str, summary_max_chars: usize) -> ParsedAnalysis {
    ParsedAnalysis {
        sentiment: Sentiment::Neutral,
        topics: BTreeSet::new(),
        summary: bound_summary(raw, summary_max_chars),
        quality: ParseQuality::Fallback,
    }
}

fn first_line(raw: &str) -> Option<&str> {
    raw.lines().map(str::trim).find(|l| !l.is_empty())
}

fn strip_field_label(field: &str) -> &str {
    match FIELD_LABEL_RE.find(field) {
        Some(m) => &field[m.end()..],
        None => field,
    }
}

fn find_sentiment(field: &str) -> Option<Sentiment> {
    SENTIMENT_RE
        .find(field)
        .and_then(|m| Sentiment::from_label(m.as_str()))
}

fn parse_topics(field: &str, vocabulary: &TopicVocabulary) -> BTreeSet<String> {
    field
        .split([',', ';'])
        .map(str::trim)
        .filter(|label| !NO_TOPIC.contains(&label.to_ascii_lowercase().as_str()))
        .filter_map(|label| vocabulary.normalize(label))
        .map(ToString::to_string)
        .collect()
}

/// Collapse whitespace, strip wrapping quotes, keep the first sentence and
/// cap the result at `max_chars` characters.
pub(crate) fn bound_summary(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let unquoted = collapsed
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '`'))
        .trim();
    let sentence = first_sentence(unquoted);

    if sentence.chars().count() <= max_chars {
        return sentence.to_string();
    }
    let mut truncated: String = sentence.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push('…');
    truncated
}

fn first_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    return &text[..i + c.len_utf8()];
                }
            }
        }
    }
    text
}
