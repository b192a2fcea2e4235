use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::GeoPoint;

/// Query string for the recommendations endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecommendationQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u16>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RecommendationQuery {
    /// Live location, only when both coordinates were supplied
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

/// Price bounds requested by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRangeFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Request body for recommendations narrowed by explicit preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CustomRecommendationRequest {
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "preferredServices", default)]
    pub preferred_services: Vec<String>,
    #[serde(rename = "priceRange", default)]
    pub price_range: Option<PriceRangeFilter>,
}

impl CustomRecommendationRequest {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}
