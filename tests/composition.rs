// End-to-end pipeline composition over a fixture news source: articles
// in, sorted and paginated threat records out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use safespace::advice::AdviceGenerator;
use safespace::models::ModelRegistry;
use safespace::news::NewsSource;
use safespace::pipeline::{analyze_city, assess_article};
use safespace::rules::ThreatLevel;
use safespace::types::Article;

struct FixtureNews(Vec<Article>);

#[async_trait]
impl NewsSource for FixtureNews {
    async fn fetch(&self, _city: &str, _days_back: u32, _timeout: Duration) -> Result<Vec<Article>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

fn article(title: &str, description: &str, url: &str) -> Article {
    Article {
        title: title.to_string(),
        description: description.to_string(),
        url: url.to_string(),
        source: "Fixture Wire".to_string(),
        published_at: "2025-07-15T10:00:00Z".to_string(),
    }
}

fn fixture_articles() -> Vec<Article> {
    vec![
        article("Major explosion reported downtown", "Several buildings damaged", "https://e.com/1"),
        article("", "no title here", "https://e.com/2"),
        article("Farmers market draws weekend crowds", "", "https://e.com/3"),
        article("Flood warning issued after record rainfall", "Emergency crews deployed", "https://e.com/4"),
        article("Bicycle theft rises in the old town", "", "https://e.com/5"),
        article("   ", "blank title", "https://e.com/6"),
        article("Aircraft makes emergency landing at airport", "Pilot reported engine trouble", "https://e.com/7"),
        article("New library wing opens to the public", "", "https://e.com/8"),
        article("Riot police deployed after violent clashes", "Several injured", "https://e.com/9"),
        article("City council approves park renovation", "", "https://e.com/10"),
    ]
}

fn registry() -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::empty())
}

#[tokio::test]
async fn untitled_articles_are_dropped() {
    let news = FixtureNews(fixture_articles());
    let analysis = analyze_city(&registry(), &news, &AdviceGenerator::static_only(), "Delhi", 20, 1).await;

    // 10 in, 2 without titles.
    assert_eq!(analysis.total_threats, 8);
    assert_eq!(analysis.threats.len(), 8);
    assert!(!analysis.has_more);
}

#[tokio::test]
async fn records_come_back_sorted_by_level_then_confidence() {
    let news = FixtureNews(fixture_articles());
    let analysis = analyze_city(&registry(), &news, &AdviceGenerator::static_only(), "Delhi", 20, 1).await;

    for pair in analysis.threats.windows(2) {
        let ordered = pair[0].level > pair[1].level
            || (pair[0].level == pair[1].level && pair[0].confidence >= pair[1].confidence);
        assert!(
            ordered,
            "{:?}/{} before {:?}/{}",
            pair[0].level, pair[0].confidence, pair[1].level, pair[1].confidence
        );
    }
}

#[tokio::test]
async fn pagination_is_consistent_with_the_full_listing() {
    let news = FixtureNews(fixture_articles());
    let gen = AdviceGenerator::static_only();
    let reg = registry();

    let full = analyze_city(&reg, &news, &gen, "Delhi", 20, 1).await;
    let page1 = analyze_city(&reg, &news, &gen, "Delhi", 3, 1).await;
    let page2 = analyze_city(&reg, &news, &gen, "Delhi", 3, 2).await;
    let page3 = analyze_city(&reg, &news, &gen, "Delhi", 3, 3).await;

    assert_eq!(page1.total_pages, 3);
    assert_eq!(page1.threats.len(), 3);
    assert_eq!(page2.threats.len(), 3);
    assert_eq!(page3.threats.len(), 2);
    assert!(page1.has_more && page2.has_more && !page3.has_more);

    let paged_ids: Vec<&str> = page1
        .threats
        .iter()
        .chain(&page2.threats)
        .chain(&page3.threats)
        .map(|t| t.id.as_str())
        .collect();
    let full_ids: Vec<&str> = full.threats.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(paged_ids, full_ids);
}

#[tokio::test]
async fn every_record_carries_analysis_and_advice() {
    let news = FixtureNews(fixture_articles());
    let analysis = analyze_city(&registry(), &news, &AdviceGenerator::static_only(), "Delhi", 20, 1).await;

    for record in &analysis.threats {
        assert_eq!(record.id.len(), 16);
        assert!((0.0..=1.0).contains(&record.confidence));
        assert!(!record.safety_advice.is_empty());
        assert!(record.safety_advice.len() <= 3);
        assert_eq!(record.advice_source, "Static");
        assert!(!record.ml_analysis.models_used.is_empty());
    }

    // Known verdicts for a registry running on keyword fallbacks.
    let by_title = |needle: &str| {
        analysis
            .threats
            .iter()
            .find(|t| t.title.contains(needle))
            .unwrap()
    };
    assert!(by_title("explosion").ml_detected);
    assert_eq!(by_title("explosion").category, "fire");
    assert!(by_title("theft").ml_detected);
    assert_eq!(by_title("theft").category, "crime");
    assert!(!by_title("library").ml_detected);
    assert_eq!(by_title("Aircraft").category, "aviation");
}

#[tokio::test]
async fn repeated_analysis_yields_identical_records() {
    let news = FixtureNews(fixture_articles());
    let gen = AdviceGenerator::static_only();
    let reg = registry();

    let first = analyze_city(&reg, &news, &gen, "Delhi", 20, 1).await;
    let second = analyze_city(&reg, &news, &gen, "Delhi", 20, 1).await;

    let a: Vec<(&str, f64)> = first.threats.iter().map(|t| (t.id.as_str(), t.confidence)).collect();
    let b: Vec<(&str, f64)> = second.threats.iter().map(|t| (t.id.as_str(), t.confidence)).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn assess_article_and_listing_agree() {
    let reg = registry();
    let gen = AdviceGenerator::static_only();
    let fixture = article("Major explosion reported downtown", "Several buildings damaged", "https://e.com/1");

    let direct = assess_article(&reg, &gen, &fixture, Some("Delhi")).await.unwrap();

    let news = FixtureNews(vec![fixture]);
    let listing = analyze_city(&reg, &news, &gen, "Delhi", 20, 1).await;

    assert_eq!(listing.threats.len(), 1);
    assert_eq!(listing.threats[0].id, direct.id);
    assert_eq!(listing.threats[0].confidence, direct.confidence);
    assert_eq!(listing.threats[0].level, direct.level);
}

#[tokio::test]
async fn level_bands_follow_fused_confidence() {
    let news = FixtureNews(fixture_articles());
    let analysis = analyze_city(&registry(), &news, &AdviceGenerator::static_only(), "Delhi", 20, 1).await;

    for record in &analysis.threats {
        if record.ml_detected && record.ml_analysis.confidence >= 0.8 {
            assert_eq!(record.level, ThreatLevel::High, "{}", record.title);
        } else if record.ml_detected && record.ml_analysis.confidence >= 0.6 {
            assert_eq!(record.level, ThreatLevel::Medium, "{}", record.title);
        }
    }
}
