// newsapi.org client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::ensemble::adapters::THREAT_KEYWORDS;
use crate::types::Article;

use super::NewsSource;

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: u32 = 20;

pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
}

// NewsAPI's wire shape; `source` is an object, ours is flat.
#[derive(Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<NewsApiSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl NewsApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

/// Search query scoping the city to threat-related coverage.
fn build_query(city: &str) -> String {
    format!("{city} ({})", THREAT_KEYWORDS.join(" OR "))
}

impl From<NewsApiArticle> for Article {
    fn from(a: NewsApiArticle) -> Self {
        Article {
            title: a.title.unwrap_or_default(),
            description: a.description.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            source: a
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            published_at: a.published_at.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(&self, city: &str, days_back: u32, timeout: Duration) -> Result<Vec<Article>> {
        let from_date = (Utc::now() - ChronoDuration::days(i64::from(days_back)))
            .format("%Y-%m-%d")
            .to_string();

        info!(city, days_back, "Fetching news articles");

        let response = self
            .client
            .get(NEWSAPI_URL)
            .query(&[
                ("q", build_query(city).as_str()),
                ("from", from_date.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", &PAGE_SIZE.to_string()),
                ("apiKey", self.api_key.as_str()),
            ])
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("News fetch failed for {city}"))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(city, "News API rate limited");
            anyhow::bail!("News API rate limited");
        }
        if !status.is_success() {
            anyhow::bail!("News API returned status {status} for {city}");
        }

        let parsed: NewsApiResponse = response
            .json()
            .await
            .context("Failed to parse News API response")?;

        let articles: Vec<Article> = parsed.articles.into_iter().map(Article::from).collect();
        info!(city, count = articles.len(), "Fetched news articles");
        Ok(articles)
    }

    fn name(&self) -> &str {
        "newsapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_includes_city_and_keywords() {
        let q = build_query("Mumbai");
        assert!(q.starts_with("Mumbai ("));
        assert!(q.contains("explosion OR"));
        assert!(q.ends_with("death)"));
    }

    #[test]
    fn wire_article_converts_with_nested_source() {
        let json = r#"{
            "title": "Flood warning",
            "description": null,
            "url": "https://example.com/a",
            "source": {"id": null, "name": "Example Wire"},
            "publishedAt": "2025-07-15T10:00:00Z"
        }"#;
        let wire: NewsApiArticle = serde_json::from_str(json).unwrap();
        let article = Article::from(wire);
        assert_eq!(article.title, "Flood warning");
        assert_eq!(article.description, "");
        assert_eq!(article.source, "Example Wire");
    }

    #[test]
    fn missing_source_becomes_unknown() {
        let json = r#"{"title": "t"}"#;
        let wire: NewsApiArticle = serde_json::from_str(json).unwrap();
        assert_eq!(Article::from(wire).source, "Unknown");
    }
}
