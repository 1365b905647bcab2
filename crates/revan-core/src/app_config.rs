use std::path::PathBuf;

/// How reviews are turned into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// One round trip per review returning `Sentiment | topics | summary`.
    Combined,
    /// Separate sentiment, topic and summary prompts per review.
    PerField,
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Combined => write!(f, "combined"),
            AnalysisMode::PerField => write!(f, "per-field"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub ollama_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub request_timeout_secs: u64,
    pub analysis_mode: AnalysisMode,
    pub summary_max_chars: usize,
    pub max_concurrent_reviews: usize,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// `0` disables the batch-fatal threshold.
    pub abort_after_consecutive_failures: u32,
    pub topics_path: Option<PathBuf>,
}
