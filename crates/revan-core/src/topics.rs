use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Reserved bucket for labels outside the vocabulary.
pub const OTHER_TOPIC: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicsFile {
    pub topics: Vec<TopicDef>,
}

/// Bounded set of canonical topic names with their accepted aliases.
#[derive(Debug, Clone)]
pub struct TopicVocabulary {
    topics: Vec<TopicDef>,
    lookup: HashMap<String, String>,
}

fn builtin_topics() -> Vec<TopicDef> {
    let def = |name: &str, aliases: &[&str]| TopicDef {
        name: name.to_string(),
        aliases: aliases.iter().map(ToString::to_string).collect(),
    };
    vec![
        def("quality", &["product quality", "build quality"]),
        def("delivery", &["shipping", "delivery/shipping", "packaging"]),
        def("pricing", &["price", "value", "price/value", "cost"]),
        def("customer_service", &["support", "service"]),
        def("design", &["appearance", "design/appearance", "look"]),
        def("functionality", &["function", "features", "performance"]),
        def("durability", &["reliability", "longevity"]),
    ]
}

impl Default for TopicVocabulary {
    fn default() -> Self {
        // Covered by `builtin_topics_build_a_lookup`.
        Self::new(builtin_topics()).expect("built-in topic vocabulary is valid")
    }
}

impl TopicVocabulary {
    /// Build a validated vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for empty names, a redefinition of
    /// the reserved `other` bucket, or a label claimed by two topics.
    pub fn new(topics: Vec<TopicDef>) -> Result<Self, ConfigError> {
        if topics.is_empty() {
            return Err(ConfigError::Validation(
                "topic vocabulary must contain at least one topic".to_string(),
            ));
        }
        let lookup = build_lookup(&topics)?;
        Ok(Self { topics, lookup })
    }

    /// Canonical topic names in declaration order (excluding `other`).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.name.as_str())
    }

    /// Map a free-text label to its canonical topic name.
    ///
    /// Returns `None` for labels that are empty after cleanup, and
    /// [`OTHER_TOPIC`] for labels outside the vocabulary.
    #[must_use]
    pub fn normalize(&self, label: &str) -> Option<&str> {
        let key = label_key(label);
        if key.is_empty() {
            return None;
        }
        Some(
            self.lookup
                .get(&key)
                .map_or(OTHER_TOPIC, String::as_str),
        )
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        name == OTHER_TOPIC || self.topics.iter().any(|t| t.name == name)
    }
}

/// Load and validate a topic vocabulary from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_topics(path: &Path) -> Result<TopicVocabulary, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TopicsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_topics(&content)
}

/// Parse and validate a topic vocabulary from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_topics(yaml: &str) -> Result<TopicVocabulary, ConfigError> {
    let file: TopicsFile = serde_yaml::from_str(yaml)?;
    TopicVocabulary::new(file.topics)
}

fn build_lookup(topics: &[TopicDef]) -> Result<HashMap<String, String>, ConfigError> {
    let mut lookup = HashMap::new();
    for topic in topics {
        let name_key = label_key(&topic.name);
        if name_key.is_empty() {
            return Err(ConfigError::Validation(
                "topic name must be non-empty".to_string(),
            ));
        }
        if name_key == OTHER_TOPIC {
            return Err(ConfigError::Validation(format!(
                "'{OTHER_TOPIC}' is reserved and cannot be redefined"
            )));
        }

        let keys = std::iter::once(name_key).chain(topic.aliases.iter().map(|a| label_key(a)));
        for key in keys {
            if key.is_empty() {
                continue;
            }
            // An alias that cleans up to its own topic's name is harmless.
            if let Some(existing) = lookup.insert(key.clone(), topic.name.clone()) {
                if existing != topic.name {
                    return Err(ConfigError::Validation(format!(
                        "label '{key}' maps to both '{existing}' and '{}'",
                        topic.name
                    )));
                }
            }
        }
    }
    Ok(lookup)
}

/// Lowercase a label, turn separators into single spaces and tighten `/`.
fn label_key(label: &str) -> String {
    let cleaned: String = label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '/' { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" / ", "/")
}
