// News retrieval.
//
// The pipeline only sees the NewsSource trait; NewsApiClient talks to
// newsapi.org and MockNews serves the canned per-city articles used
// when no API key is configured or the live fetch comes back empty.

pub mod mock;
pub mod newsapi;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Article;

pub use mock::MockNews;
pub use newsapi::NewsApiClient;

/// Source of city-scoped, threat-filtered news articles.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch recent articles for `city` published within the last
    /// `days_back` days.
    async fn fetch(&self, city: &str, days_back: u32, timeout: Duration) -> Result<Vec<Article>>;

    fn name(&self) -> &str;
}
