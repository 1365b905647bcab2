//! Single-review handlers: `health` and `analyze`.

use revan_analyzer::{ModelBackend, OllamaClient};
use revan_core::{AppConfig, Review};

/// Check the model endpoint.
///
/// # Errors
///
/// Returns an error if the endpoint cannot be reached, answers with a
/// failure status, or does not have the configured model.
pub(crate) async fn run_health(config: &AppConfig) -> anyhow::Result<()> {
    let client = OllamaClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build Ollama client: {e}"))?;

    match client.health().await {
        Ok(()) => {
            println!("healthy: {} (model {})", config.ollama_url, client.model());
            Ok(())
        }
        Err(e) => {
            println!("unhealthy: {} ({})", config.ollama_url, e.kind());
            Err(e.into())
        }
    }
}

/// Analyze one review passed on the command line.
///
/// # Errors
///
/// Returns an error for empty text or if the model call fails.
pub(crate) async fn run_analyze(config: &AppConfig, text: &str, json: bool) -> anyhow::Result<()> {
    let analyzer = crate::build_analyzer(config)?;
    let result = analyzer.analyze(&Review::new(text), "cli").await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("sentiment: {}", result.sentiment);
    println!(
        "topics:    {}",
        if result.topics.is_empty() {
            "-".to_string()
        } else {
            result.topics_joined()
        }
    );
    println!("summary:   {}", result.summary);
    if result.is_fallback() {
        println!("(model answer did not match the expected format; fallback values used)");
    }
    Ok(())
}
