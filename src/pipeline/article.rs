// Single-article assessment: categorize, run the ensemble, resolve the
// final level, and attach safety advice.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task;
use tracing::debug;

use crate::advice::AdviceGenerator;
use crate::ensemble::predict_threat;
use crate::models::ModelRegistry;
use crate::rules::{categorize, resolve_level};
use crate::types::{record_id, Article, MlSummary, ThreatRecord};

/// Assess one article end to end. Fails on articles with no title —
/// there is nothing to analyze.
pub async fn assess_article(
    registry: &Arc<ModelRegistry>,
    advice: &AdviceGenerator,
    article: &Article,
    city: Option<&str>,
) -> Result<ThreatRecord> {
    let title = article.title.trim();
    if title.is_empty() {
        anyhow::bail!("Article has no title");
    }

    let (category, rule_level) = categorize(title, &article.description);

    let text = format!("{}. {}", title, article.description);
    let snapshot = Arc::clone(registry);
    let assessment = task::spawn_blocking(move || predict_threat(&snapshot, &text))
        .await
        .context("Inference task panicked")?;

    let level = resolve_level(&assessment, rule_level);

    let generated = advice
        .generate(category, level, city, title, &article.description)
        .await;

    debug!(
        title = %title,
        category,
        level = %level,
        confidence = assessment.final_confidence,
        "Article assessed"
    );

    Ok(ThreatRecord {
        id: record_id(article),
        title: title.to_string(),
        description: article.description.clone(),
        url: article.url.clone(),
        source: article.source.clone(),
        published_at: article.published_at.clone(),
        category: category.to_string(),
        level,
        confidence: (assessment.final_confidence * 100.0).round() / 100.0,
        ml_detected: assessment.is_threat,
        ml_analysis: MlSummary::from_assessment(&assessment),
        safety_advice: generated.items,
        ai_advice_used: generated.ai_generated,
        advice_source: if generated.ai_generated {
            "AI-Enhanced".to_string()
        } else {
            "Static".to_string()
        },
    })
}
