//! Salon Match - recommendation engine for salon discovery
//!
//! This library ranks salons for a user from their accepted booking history,
//! their live location and the salon catalog. Salons with an active
//! subscription are boosted into the results until they reach their weekly
//! match quota.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    haversine_distance, CustomFilter, RecommendationError, RecommendationSources, Recommender,
    WEEKLY_MATCH_QUOTA,
};
pub use models::{
    GeoPoint, Recommendation, RecommendationsResponse, SalonCatalogEntry, ScoringWeights,
    UserPreferenceProfile,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bangkok = GeoPoint::new(13.7563, 100.5018);
        assert_eq!(bangkok.distance_km(&bangkok), 0.0);
        assert_eq!(ScoringWeights::default().max_score(), 100.0);
        assert_eq!(WEEKLY_MATCH_QUOTA, 10);
    }
}
