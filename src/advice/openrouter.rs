// OpenRouter chat-completions client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::traits::AdviceLlm;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl AdviceLlm for OpenRouterClient {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 200,
            "temperature": 0.7,
        });

        let response = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .context("OpenRouter request failed")?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("OpenRouter authentication failed (401), check OPENROUTER_API_KEY");
            anyhow::bail!("OpenRouter authentication failed");
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("OpenRouter rate limit exceeded (429)");
            anyhow::bail!("OpenRouter rate limited");
        }
        if !status.is_success() {
            anyhow::bail!("OpenRouter returned status {status}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .context("OpenRouter response had no content")?;

        debug!(model = %self.model, chars = reply.len(), "Received advice completion");
        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
