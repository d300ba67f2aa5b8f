// Multi-city heatmap aggregation.
//
// Lighter than the full listing: 7-day window, at most 10 articles per
// city, no advice generation. Cities are summarized concurrently under
// one overall deadline; cities that miss it are dropped from the map
// rather than failing the request.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::ensemble::predict_threat;
use crate::models::ModelRegistry;
use crate::news::NewsSource;
use crate::rules::ThreatLevel;
use crate::types::CityThreatSummary;

use super::batch::fetch_with_fallback;
use super::MAX_WORKERS;

const SUMMARY_DAYS_BACK: u32 = 7;
const SUMMARY_NEWS_TIMEOUT: Duration = Duration::from_secs(3);
const SUMMARY_MAX_ARTICLES: usize = 10;
const HEATMAP_DEADLINE: Duration = Duration::from_secs(15);

/// Per-article level bands for the quick summary; looser than the full
/// listing's 0.8/0.6 so sparse fallback-only signals still register.
const SUMMARY_HIGH: f64 = 0.7;
const SUMMARY_MEDIUM: f64 = 0.5;

/// Summarize one city's recent threat picture.
pub async fn city_summary(
    registry: &Arc<ModelRegistry>,
    news: &dyn NewsSource,
    city: &str,
) -> CityThreatSummary {
    let articles = fetch_with_fallback(news, city, SUMMARY_DAYS_BACK, SUMMARY_NEWS_TIMEOUT).await;
    if articles.is_empty() {
        return CityThreatSummary::empty();
    }

    let mut titles = Vec::new();
    let mut high = 0u32;
    let mut medium = 0u32;
    let mut low = 0u32;

    for article in articles.iter().take(SUMMARY_MAX_ARTICLES) {
        let title = article.title.trim();
        if title.is_empty() {
            continue;
        }

        let text = format!("{}. {}", title, article.description);
        let snapshot = Arc::clone(registry);
        let assessment = match tokio::task::spawn_blocking(move || predict_threat(&snapshot, &text)).await {
            Ok(a) => a,
            Err(e) => {
                warn!(city, error = %e, "Inference task panicked");
                continue;
            }
        };
        if assessment.is_threat && assessment.final_confidence >= SUMMARY_HIGH {
            high += 1;
        } else if assessment.is_threat && assessment.final_confidence >= SUMMARY_MEDIUM {
            medium += 1;
        } else {
            low += 1;
        }

        titles.push(title.to_string());
    }

    let threat_count = titles.len();
    titles.truncate(5);

    CityThreatSummary {
        threat_level: overall_level(high, medium),
        threat_count,
        recent_threats: titles,
        high_risk_count: high,
        medium_risk_count: medium,
        low_risk_count: low,
    }
}

/// City-wide level from the per-article counts.
fn overall_level(high: u32, medium: u32) -> ThreatLevel {
    if high >= 3 {
        ThreatLevel::High
    } else if high >= 1 || medium >= 3 {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Summarize many cities concurrently. Cities still running at the
/// deadline are dropped; the order of the returned pairs follows
/// completion, not the input.
pub async fn city_summaries(
    registry: &Arc<ModelRegistry>,
    news: &dyn NewsSource,
    cities: &[String],
) -> Vec<(String, CityThreatSummary)> {
    info!(cities = cities.len(), "Generating heatmap summaries");

    let deadline = Instant::now() + HEATMAP_DEADLINE;
    // City names are moved into the stream rather than borrowed, for the
    // same rustc #89976 lifetime-generality limitation as in batch.rs.
    let mut pending = stream::iter(cities.to_vec())
        .map(|city| async move {
            let summary = city_summary(registry, news, &city).await;
            (city, summary)
        })
        .buffer_unordered(MAX_WORKERS);

    let mut summaries = Vec::new();
    loop {
        match timeout_at(deadline, pending.next()).await {
            Ok(Some(entry)) => summaries.push(entry),
            Ok(None) => break,
            Err(_) => {
                warn!(done = summaries.len(), total = cities.len(), "Heatmap deadline hit");
                break;
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::MockNews;

    #[test]
    fn overall_level_bands() {
        assert_eq!(overall_level(3, 0), ThreatLevel::High);
        assert_eq!(overall_level(4, 5), ThreatLevel::High);
        assert_eq!(overall_level(1, 0), ThreatLevel::Medium);
        assert_eq!(overall_level(0, 3), ThreatLevel::Medium);
        assert_eq!(overall_level(0, 2), ThreatLevel::Low);
        assert_eq!(overall_level(0, 0), ThreatLevel::Low);
    }

    #[tokio::test]
    async fn summary_counts_add_up() {
        let registry = Arc::new(ModelRegistry::empty());
        let summary = city_summary(&registry, &MockNews, "Delhi").await;
        let counted = summary.high_risk_count + summary.medium_risk_count + summary.low_risk_count;
        assert_eq!(counted as usize, summary.threat_count);
        assert!(summary.recent_threats.len() <= 5);
        assert!(summary.threat_count <= SUMMARY_MAX_ARTICLES);
    }

    #[tokio::test]
    async fn summaries_cover_all_cities() {
        let registry = Arc::new(ModelRegistry::empty());
        let cities: Vec<String> = ["Delhi", "Mumbai", "Pune"].iter().map(|s| s.to_string()).collect();
        let summaries = city_summaries(&registry, &MockNews, &cities).await;
        assert_eq!(summaries.len(), 3);
        let mut names: Vec<&str> = summaries.iter().map(|(c, _)| c.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Delhi", "Mumbai", "Pune"]);
    }
}
