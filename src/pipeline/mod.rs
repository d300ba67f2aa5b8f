// Analysis orchestration: per-article assessment, city batch listings,
// and the multi-city heatmap aggregation.
//
// Inference is CPU-bound and runs on the blocking pool; fan-out across
// articles and cities is bounded, and every batch runs under a deadline
// that keeps whatever completed rather than failing the request.

pub mod article;
pub mod batch;
pub mod heatmap;

pub use article::assess_article;
pub use batch::{analyze_city, quick_batch, CityAnalysis, CityQuickSummary};
pub use heatmap::{city_summaries, city_summary};

/// Concurrent analyses in flight per request.
pub(crate) const MAX_WORKERS: usize = 4;
