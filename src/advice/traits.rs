use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// A chat-completion backend for advice generation.
///
/// Object-safe so the pipeline can run against OpenRouter in production
/// and a canned implementation in tests.
#[async_trait]
pub trait AdviceLlm: Send + Sync {
    /// Send a single-turn prompt and return the raw reply text.
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String>;

    fn name(&self) -> &str;
}
