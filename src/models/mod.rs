// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    parse_price, ActiveSubscription, BookingRecord, BookingStatus, BoostSettings, GeoPoint,
    LocationPattern, MatchLedgerEntry, PriceBand, Recommendation, RecommendedSalon,
    SalonCatalogEntry, SalonLocation, ScoringWeights, SubscriptionRecord, SubscriptionSnapshot,
    SubscriptionStatus, UserPreferenceProfile,
};
pub use requests::{CustomRecommendationRequest, PriceRangeFilter, RecommendationQuery};
pub use responses::{ErrorResponse, HealthResponse, RecommendationsResponse};
