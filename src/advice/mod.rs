// Safety advice generation.
//
// AI-first: when an LLM backend is configured the generator prompts it
// with the threat text, parses the reply into discrete recommendations,
// and filters out boilerplate. Any failure on that path (no backend,
// timeout, unusable reply) falls through to the static per-category
// table. Output is always 1..=3 items.

pub mod fallback;
pub mod openrouter;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::rules::ThreatLevel;

pub use openrouter::OpenRouterClient;
pub use traits::AdviceLlm;

/// Reply lines shorter than this are formatting noise, not advice.
const MIN_ADVICE_LEN: usize = 10;
/// Items at or below this length are held to the genericity filter.
const MEANINGFUL_LEN: usize = 20;
const MAX_ADVICE_ITEMS: usize = 3;

/// Phrases that mark an advice item as boilerplate.
const GENERIC_PHRASES: &[&str] = &[
    "stay informed",
    "follow instructions",
    "keep emergency contacts",
    "monitor local",
    "contact authorities",
    "stay safe",
];

const LINE_PREFIXES: &[&str] = &["•", "-", "*", "1.", "2.", "3.", "4.", "5."];

/// Headers and intro lines the parser skips.
const SKIP_PREFIXES: &[&str] = &["safety", "recommendations", "advice", "here are"];

/// Generated advice plus which path produced it.
#[derive(Debug, Clone)]
pub struct Advice {
    pub items: Vec<String>,
    pub ai_generated: bool,
}

pub struct AdviceGenerator {
    llm: Option<Arc<dyn AdviceLlm>>,
    timeout: Duration,
}

impl AdviceGenerator {
    pub fn new(llm: Option<Arc<dyn AdviceLlm>>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Generator with no LLM backend; always serves the static table.
    pub fn static_only() -> Self {
        Self {
            llm: None,
            timeout: Duration::from_secs(0),
        }
    }

    /// Generate safety advice for one assessed threat.
    pub async fn generate(
        &self,
        category: &str,
        level: ThreatLevel,
        city: Option<&str>,
        title: &str,
        description: &str,
    ) -> Advice {
        // Titles this short carry no context worth prompting over.
        if let Some(llm) = &self.llm {
            if title.trim().len() > 5 {
                match self.generate_ai(llm.as_ref(), city, title, description).await {
                    Ok(items) if !items.is_empty() => {
                        info!(count = items.len(), "Using AI-generated advice");
                        return Advice {
                            items,
                            ai_generated: true,
                        };
                    }
                    Ok(_) => debug!("AI reply produced no usable advice, using static table"),
                    Err(e) => warn!(error = %e, "AI advice generation failed, using static table"),
                }
            }
        }

        Advice {
            items: fallback::static_advice(category, level, city),
            ai_generated: false,
        }
    }

    async fn generate_ai(
        &self,
        llm: &dyn AdviceLlm,
        city: Option<&str>,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Vec<String>> {
        let prompt = build_prompt(title, description);
        let reply = llm.complete(&prompt, self.timeout).await?;

        let parsed = parse_reply(&reply);
        let mut items = filter_generic(parsed);

        if let Some(city) = city {
            if !items.is_empty() && items.len() < MAX_ADVICE_ITEMS {
                items.push(format!(
                    "Monitor local {city} authorities for area-specific guidance and updates"
                ));
            }
        }

        items.truncate(MAX_ADVICE_ITEMS);
        Ok(items)
    }
}

fn build_prompt(title: &str, description: &str) -> String {
    format!(
        "You are an expert safety advisor AI. Given the following text about a potential \
         threat or safety concern, provide specific, actionable safety advice for the public.\n\
         \n\
         Text: {title}\n\
         Additional Details: {description}\n\
         \n\
         Please provide exactly 3 practical safety recommendations that are:\n\
         1. Specific to this situation\n\
         2. Immediately actionable\n\
         3. Easy to understand\n\
         \n\
         Format your response as a simple list without bullet points or numbers - just one \
         recommendation per line:"
    )
}

/// Split a reply into advice items: drop headers and intro lines, strip
/// bullet and number prefixes, and keep lines long enough to mean
/// something. A reply that parses to nothing is returned whole as a
/// single item.
fn parse_reply(reply: &str) -> Vec<String> {
    let mut items = Vec::new();

    for line in reply.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if SKIP_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }

        let mut cleaned = line;
        for prefix in LINE_PREFIXES {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                cleaned = rest.trim_start();
                break;
            }
        }

        if cleaned.len() > MIN_ADVICE_LEN {
            items.push(cleaned.to_string());
        }
    }

    if items.is_empty() {
        let whole = reply.trim();
        if !whole.is_empty() {
            items.push(whole.to_string());
        }
    }

    items.truncate(MAX_ADVICE_ITEMS);
    items
}

/// Drop boilerplate items, but always keep at least the first item so a
/// fully generic reply still yields something.
fn filter_generic(items: Vec<String>) -> Vec<String> {
    let mut kept = Vec::new();
    for item in items {
        let lower = item.to_lowercase();
        let is_generic = GENERIC_PHRASES.iter().any(|p| lower.contains(p));
        let is_meaningful = item.len() > MEANINGFUL_LEN && !is_generic;
        if is_meaningful || kept.is_empty() {
            kept.push(item);
        }
    }
    kept
}
