//! Prompt templates sent to the model.

use revan_core::{TopicVocabulary, OTHER_TOPIC};

/// Word limit requested for summaries.
pub(crate) const SUMMARY_WORDS: usize = 15;

fn topic_list(vocabulary: &TopicVocabulary) -> String {
    vocabulary.names().collect::<Vec<_>>().join(", ")
}

/// Single-round-trip prompt asking for `Sentiment | topics | summary`.
pub(crate) fn combined_prompt(text: &str, vocabulary: &TopicVocabulary) -> String {
    format!(
        "Analyze this product review. Respond with exactly one line in this format:\n\
         <Sentiment> | <topic1,topic2> | <summary>\n\n\
         Sentiment must be one of: Positive, Neutral, Negative.\n\
         Topics must be chosen from: {topics}. Use \"{OTHER_TOPIC}\" if none fit.\n\
         The summary must be one concise sentence of at most {SUMMARY_WORDS} words.\n\n\
         Review: \"{text}\"\n\n\
         Answer:",
        topics = topic_list(vocabulary),
    )
}

pub(crate) fn sentiment_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of this product review and respond with only one word: \
         Positive, Neutral, or Negative.\n\n\
         Review: \"{text}\"\n\n\
         Sentiment:"
    )
}

pub(crate) fn topic_prompt(text: &str, vocabulary: &TopicVocabulary) -> String {
    format!(
        "Identify the main topics discussed in this product review. Respond with a \
         comma-separated list chosen from: {topics}. Use \"{OTHER_TOPIC}\" if none fit.\n\n\
         Review: \"{text}\"\n\n\
         Main Topics:",
        topics = topic_list(vocabulary),
    )
}

pub(crate) fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize this product review in one concise sentence (maximum {SUMMARY_WORDS} words):\n\n\
         Review: \"{text}\"\n\n\
         Summary:"
    )
}
