// City batch analysis: fetch news, assess articles concurrently under a
// deadline, and return a sorted, paginated threat listing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::advice::AdviceGenerator;
use crate::ensemble::predict_threat;
use crate::models::ModelRegistry;
use crate::news::{mock::mock_articles, NewsSource};
use crate::types::{Article, ThreatRecord};

use super::MAX_WORKERS;

/// How long the news fetch may take before the canned articles step in.
const NEWS_TIMEOUT: Duration = Duration::from_secs(5);
/// Overall deadline for one city listing; completed assessments are kept.
const BATCH_DEADLINE: Duration = Duration::from_secs(20);
/// Hard cap on articles assessed per request.
const MAX_ARTICLES: usize = 30;

const QUICK_BATCH_MAX_CITIES: usize = 5;
const QUICK_BATCH_MAX_ARTICLES: usize = 5;

/// A sorted, paginated threat listing for one city.
#[derive(Debug, Serialize)]
pub struct CityAnalysis {
    pub city: String,
    pub threats: Vec<ThreatRecord>,
    pub total_threats: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

/// Fetch articles for a city, falling back to the canned table when the
/// live source fails or returns nothing.
pub async fn fetch_with_fallback(
    news: &dyn NewsSource,
    city: &str,
    days_back: u32,
    timeout: Duration,
) -> Vec<Article> {
    match news.fetch(city, days_back, timeout).await {
        Ok(articles) if !articles.is_empty() => articles,
        Ok(_) => {
            info!(city, "News source returned no articles, using mock data");
            mock_articles(city)
        }
        Err(e) => {
            warn!(city, error = %e, "News fetch failed, using mock data");
            mock_articles(city)
        }
    }
}

/// Analyze a city's recent news into a threat listing.
pub async fn analyze_city(
    registry: &Arc<ModelRegistry>,
    news: &dyn NewsSource,
    advice: &AdviceGenerator,
    city: &str,
    limit: usize,
    page: usize,
) -> CityAnalysis {
    let articles = fetch_with_fallback(news, city, 30, NEWS_TIMEOUT).await;

    // Assess up to 2x the page size so sorting has material to work with,
    // without unbounded work on large feeds.
    let cap = (limit * 2).min(MAX_ARTICLES);
    let to_process: Vec<Article> = articles.into_iter().take(cap).collect();
    info!(city, count = to_process.len(), limit, page, "Assessing articles");

    let deadline = Instant::now() + BATCH_DEADLINE;
    // Articles are moved into the stream rather than borrowed: a closure
    // returning a future that borrows its argument cannot be proven
    // lifetime-general (rustc #89976) once this stream sits inside an
    // axum handler future.
    let mut pending = stream::iter(to_process)
        .map(|article| async move { super::assess_article(registry, advice, &article, Some(city)).await })
        .buffer_unordered(MAX_WORKERS);

    let mut records: Vec<ThreatRecord> = Vec::new();
    loop {
        match timeout_at(deadline, pending.next()).await {
            Ok(Some(Ok(record))) => records.push(record),
            Ok(Some(Err(e))) => warn!(city, error = %e, "Skipping article"),
            Ok(None) => break,
            Err(_) => {
                warn!(city, done = records.len(), "Deadline hit, returning partial results");
                break;
            }
        }
    }

    sort_records(&mut records);

    let total = records.len();
    let total_pages = total.div_ceil(limit.max(1));
    let start = (page.saturating_sub(1)) * limit;
    let end = (start + limit).min(total);
    let threats = if start < total {
        records[start..end].to_vec()
    } else {
        Vec::new()
    };

    CityAnalysis {
        city: city.to_string(),
        threats,
        total_threats: total,
        page,
        limit,
        total_pages,
        has_more: end < total,
    }
}

/// Highest level first, ties broken by confidence descending. The final
/// id tie-break keeps the order deterministic regardless of which
/// concurrent assessment finished first.
fn sort_records(records: &mut [ThreatRecord]) {
    records.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then(b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// One city's entry in the quick multi-city scan.
#[derive(Debug, Serialize)]
pub struct CityQuickSummary {
    pub threat_count: usize,
    pub high_confidence_threats: Vec<HighConfidenceThreat>,
    pub safety_level: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HighConfidenceThreat {
    pub title: String,
    pub confidence: f64,
}

/// Quick title-only scan across up to five cities. Assessments run on
/// titles alone with no advice generation, so this stays cheap.
pub async fn quick_batch(
    registry: &Arc<ModelRegistry>,
    news: &dyn NewsSource,
    cities: &[String],
) -> BTreeMap<String, CityQuickSummary> {
    let mut results = BTreeMap::new();

    for city in cities.iter().take(QUICK_BATCH_MAX_CITIES) {
        let articles = fetch_with_fallback(news, city, 7, NEWS_TIMEOUT).await;

        let mut threat_count = 0;
        let mut high_confidence = Vec::new();

        for article in articles.iter().take(QUICK_BATCH_MAX_ARTICLES) {
            let title = article.title.trim();
            if title.is_empty() {
                continue;
            }

            let snapshot = Arc::clone(registry);
            let text = title.to_string();
            let assessment = match tokio::task::spawn_blocking(move || predict_threat(&snapshot, &text)).await {
                Ok(a) => a,
                Err(e) => {
                    warn!(city, error = %e, "Inference task panicked");
                    continue;
                }
            };

            if assessment.is_threat && assessment.final_confidence >= 0.6 {
                threat_count += 1;
                if assessment.final_confidence >= 0.8 {
                    high_confidence.push(HighConfidenceThreat {
                        title: title.to_string(),
                        confidence: assessment.final_confidence,
                    });
                }
            }
        }

        high_confidence.truncate(3);
        results.insert(
            city.clone(),
            CityQuickSummary {
                threat_count,
                high_confidence_threats: high_confidence,
                safety_level: match threat_count {
                    n if n >= 3 => "high",
                    n if n >= 1 => "medium",
                    _ => "low",
                },
            },
        );
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::MockNews;
    use crate::rules::ThreatLevel;
    use crate::types::MlSummary;

    fn record(level: ThreatLevel, confidence: f64) -> ThreatRecord {
        ThreatRecord {
            id: "x".to_string(),
            title: "t".to_string(),
            description: String::new(),
            url: String::new(),
            source: String::new(),
            published_at: String::new(),
            category: "other".to_string(),
            level,
            confidence,
            ml_detected: false,
            ml_analysis: MlSummary {
                confidence,
                threat_prediction: 0,
                sentiment_analysis: None,
                models_used: Vec::new(),
            },
            safety_advice: Vec::new(),
            ai_advice_used: false,
            advice_source: "Static".to_string(),
        }
    }

    #[test]
    fn sort_puts_high_levels_then_high_confidence_first() {
        let mut records = vec![
            record(ThreatLevel::Low, 0.9),
            record(ThreatLevel::High, 0.7),
            record(ThreatLevel::Medium, 0.95),
            record(ThreatLevel::High, 0.85),
        ];
        sort_records(&mut records);
        let order: Vec<(ThreatLevel, f64)> =
            records.iter().map(|r| (r.level, r.confidence)).collect();
        assert_eq!(
            order,
            vec![
                (ThreatLevel::High, 0.85),
                (ThreatLevel::High, 0.7),
                (ThreatLevel::Medium, 0.95),
                (ThreatLevel::Low, 0.9),
            ]
        );
    }

    #[tokio::test]
    async fn analyze_city_paginates() {
        let registry = Arc::new(ModelRegistry::empty());
        let advice = AdviceGenerator::static_only();

        // Delhi's canned table has 5 articles.
        let page1 = analyze_city(&registry, &MockNews, &advice, "Delhi", 2, 1).await;
        assert_eq!(page1.total_threats, 5);
        assert_eq!(page1.threats.len(), 2);
        assert_eq!(page1.total_pages, 3);
        assert!(page1.has_more);

        let page3 = analyze_city(&registry, &MockNews, &advice, "Delhi", 2, 3).await;
        assert_eq!(page3.threats.len(), 1);
        assert!(!page3.has_more);

        let beyond = analyze_city(&registry, &MockNews, &advice, "Delhi", 2, 9).await;
        assert!(beyond.threats.is_empty());
    }

    #[tokio::test]
    async fn analyze_city_output_is_sorted() {
        let registry = Arc::new(ModelRegistry::empty());
        let advice = AdviceGenerator::static_only();
        let analysis = analyze_city(&registry, &MockNews, &advice, "Mumbai", 10, 1).await;
        for pair in analysis.threats.windows(2) {
            let not_before = pair[0].level > pair[1].level
                || (pair[0].level == pair[1].level && pair[0].confidence >= pair[1].confidence);
            assert!(not_before, "records out of order");
        }
    }

    #[tokio::test]
    async fn quick_batch_caps_cities_at_five() {
        let registry = Arc::new(ModelRegistry::empty());
        let cities: Vec<String> = ["Delhi", "Mumbai", "Chennai", "Pune", "Kolkata", "Hyderabad"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = quick_batch(&registry, &MockNews, &cities).await;
        assert_eq!(results.len(), 5);
        assert!(!results.contains_key("Hyderabad"));
        for summary in results.values() {
            assert!(["low", "medium", "high"].contains(&summary.safety_level));
        }
    }
}
