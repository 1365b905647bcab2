//! Batch run bookkeeping.
//!
//! A [`BatchRecorder`] accumulates per-review outcomes while a batch is in
//! flight; [`BatchRecorder::finish`] seals it into an immutable [`BatchRun`].
//! Both output lists are ordered by input position regardless of the order
//! in which workers completed.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::review::AnalysisResult;

/// Classified reason a review did not produce an [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Review text was empty or whitespace-only; the model was never called.
    EmptyInput,
    /// The model endpoint could not be reached.
    Unreachable,
    /// The model endpoint did not answer within the request timeout.
    Timeout,
    /// The configured model is not installed on the server.
    ModelNotFound,
    /// The model endpoint answered with a non-success HTTP status.
    HttpStatus,
    /// The model answered with an empty completion.
    EmptyResponse,
    /// The response envelope could not be decoded.
    MalformedResponse,
    /// Not started because the run was cancelled.
    Cancelled,
    /// Not started because the run hit its consecutive-failure threshold.
    Aborted,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::EmptyInput => "empty_input",
            FailureKind::Unreachable => "unreachable",
            FailureKind::Timeout => "timeout",
            FailureKind::ModelNotFound => "model_not_found",
            FailureKind::HttpStatus => "http_status",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Aborted => "aborted",
        }
    }

    /// Failures that no other review in the batch can avoid and count
    /// toward the batch-fatal threshold: the endpoint is down or the model
    /// is missing.
    #[must_use]
    pub fn counts_toward_abort(self) -> bool {
        matches!(
            self,
            FailureKind::Unreachable | FailureKind::Timeout | FailureKind::ModelNotFound
        )
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFailure {
    pub review_id: String,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
    Aborted,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Finalized outcome of one batch. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRun {
    id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    status: RunStatus,
    results: Vec<AnalysisResult>,
    failures: Vec<ReviewFailure>,
}

impl BatchRun {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    #[must_use]
    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    #[must_use]
    pub fn failures(&self) -> &[ReviewFailure] {
        &self.failures
    }

    /// Number of reviews accounted for (results + failures).
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

#[derive(Debug)]
enum Outcome {
    Analyzed(AnalysisResult),
    Failed(ReviewFailure),
}

/// Append-only accumulator shared by the workers of one batch.
///
/// Workers record outcomes through `&self`; the internal mutex is never held
/// across an await point.
#[derive(Debug)]
pub struct BatchRecorder {
    id: Uuid,
    started_at: DateTime<Utc>,
    outcomes: Mutex<Vec<(usize, Outcome)>>,
}

impl Default for BatchRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            outcomes: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Record a successful analysis for the review at input `index`.
    pub fn record_success(&self, index: usize, result: AnalysisResult) {
        self.push(index, Outcome::Analyzed(result));
    }

    /// Record a failure for the review at input `index`.
    pub fn record_failure(&self, index: usize, failure: ReviewFailure) {
        self.push(index, Outcome::Failed(failure));
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seal the recorder into a [`BatchRun`], ordering both lists by input index.
    #[must_use]
    pub fn finish(self, status: RunStatus) -> BatchRun {
        let mut outcomes = self
            .outcomes
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        outcomes.sort_by_key(|(index, _)| *index);

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                Outcome::Analyzed(result) => results.push(result),
                Outcome::Failed(failure) => failures.push(failure),
            }
        }

        BatchRun {
            id: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            status,
            results,
            failures,
        }
    }

    fn push(&self, index: usize, outcome: Outcome) {
        let mut outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug_assert!(
            outcomes.iter().all(|(i, _)| *i != index),
            "review index {index} recorded twice"
        );
        outcomes.push((index, outcome));
    }
}
