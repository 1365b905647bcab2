//! Presentation layer for batch runs.
//!
//! Loads reviews from CSV, aggregates a finalized [`revan_core::BatchRun`]
//! into a [`BatchSummary`], renders it as a markdown report, and exports
//! results and failures as CSV.

pub mod error;
pub mod export;
pub mod ingest;
pub mod render;
pub mod summary;

pub use error::ReportError;
pub use export::{write_failures_csv, write_results_csv};
pub use ingest::{load_reviews, load_reviews_from_path};
pub use render::render_text;
pub use summary::{BatchSummary, ProductBreakdown};
