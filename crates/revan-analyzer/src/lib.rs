//! LLM-backed review analysis for the review analyzer.
//!
//! Sends each review to a model endpoint (Ollama by default), parses the
//! free-text answer into sentiment, topics and a bounded summary, and runs
//! whole batches with bounded parallelism, per-review failure recording,
//! cooperative cancellation and a consecutive-failure abort threshold.

pub mod analyzer;
pub mod backend;
pub mod error;
pub mod ollama;
pub mod pipeline;

mod parse;
mod prompt;
mod retry;

pub use analyzer::Analyzer;
pub use backend::ModelBackend;
pub use error::{AnalyzerError, BatchError};
pub use ollama::OllamaClient;
pub use pipeline::{run_batch, BatchOptions, CancelToken};
