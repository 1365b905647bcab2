//! Core data model and configuration for the review analyzer.
//!
//! Defines the review, analysis result and batch run types shared by the
//! analyzer, report and CLI crates, plus env-driven application config and
//! the topic vocabulary.

pub mod app_config;
pub mod config;
pub mod review;
pub mod run;
pub mod topics;

use thiserror::Error;

pub use app_config::{AnalysisMode, AppConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use review::{AnalysisResult, ParseQuality, Review, Sentiment};
pub use run::{BatchRecorder, BatchRun, FailureKind, ReviewFailure, RunStatus};
pub use topics::{load_topics, TopicDef, TopicVocabulary, OTHER_TOPIC};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read topics file {path}: {source}")]
    TopicsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse topics file: {0}")]
    TopicsFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
