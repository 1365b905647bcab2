//! The seam between review analysis and the text-generation service.

use async_trait::async_trait;

use crate::error::AnalyzerError;

/// A text-generation endpoint: prompt in, free-form text out.
///
/// [`crate::OllamaClient`] is the production implementation; tests plug in
/// scripted backends to drive the analyzer and batch pipeline deterministically.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run one prompt-and-response round trip.
    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError>;

    /// Check that the endpoint is reachable.
    async fn health(&self) -> Result<(), AnalyzerError> {
        Ok(())
    }
}

#[async_trait]
impl<T: ModelBackend + ?Sized> ModelBackend for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError> {
        (**self).generate(prompt).await
    }

    async fn health(&self) -> Result<(), AnalyzerError> {
        (**self).health().await
    }
}

#[async_trait]
impl<'a, T: ModelBackend + ?Sized> ModelBackend for &'a T {
    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError> {
        (**self).generate(prompt).await
    }

    async fn health(&self) -> Result<(), AnalyzerError> {
        (**self).health().await
    }
}
