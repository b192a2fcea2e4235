// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod preferences;
pub mod quota;
pub mod reasons;
pub mod recommender;
pub mod scoring;

pub use distance::haversine_distance;
pub use filters::{service_matches, within_price_range, CustomFilter};
pub use preferences::analyze_history;
pub use quota::{week_start, MatchOutcome, QuotaTracker, WEEKLY_MATCH_QUOTA};
pub use reasons::generate_reasons;
pub use recommender::{RecommendationError, RecommendationSources, Recommender, DEFAULT_LIMIT};
pub use scoring::calculate_relevance_score;
