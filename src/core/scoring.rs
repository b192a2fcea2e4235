use crate::core::filters::service_matches;
use crate::models::{GeoPoint, SalonCatalogEntry, ScoringWeights, UserPreferenceProfile};

/// Highest rating a salon can carry
const MAX_RATING: f64 = 5.0;

/// Calculate the organic relevance score (0-100 with default weights) of a
/// salon for a user
///
/// Scoring formula:
/// score = (
///     service_score +      # 40 on a tag match, 10 on a miss, 20 without data
///     price_score +        # up to 25 inside the price band, 12.5 without one
///     location_score +     # up to 25 inside the radius, 12.5 without data
///     rating_score         # rating / 5 * 10
/// )
///
/// Subscription and previously-visited boosts are added by the recommender.
pub fn calculate_relevance_score(
    salon: &SalonCatalogEntry,
    preferences: &UserPreferenceProfile,
    live_location: Option<&GeoPoint>,
    weights: &ScoringWeights,
) -> f64 {
    let total = calculate_service_score(salon, preferences, weights)
        + calculate_price_score(salon.price_range, preferences, weights)
        + calculate_location_score(salon, preferences, live_location, weights)
        + calculate_rating_score(salon.rating_value(), weights);

    // f64::min would turn NaN into the maximum
    if total.is_nan() {
        return 0.0;
    }
    total.min(weights.max_score()).max(0.0)
}

#[inline]
fn calculate_service_score(
    salon: &SalonCatalogEntry,
    preferences: &UserPreferenceProfile,
    weights: &ScoringWeights,
) -> f64 {
    if preferences.preferred_services.is_empty() || salon.types_of_massages.is_empty() {
        return weights.service_neutral;
    }

    if service_matches(&salon.types_of_massages, &preferences.preferred_services) {
        weights.service_match
    } else {
        weights.service_mismatch
    }
}

/// Full points at the historical average, falling off linearly towards the
/// band edges. Outside the band or without a price scores zero.
#[inline]
fn calculate_price_score(
    price: Option<f64>,
    preferences: &UserPreferenceProfile,
    weights: &ScoringWeights,
) -> f64 {
    let Some(band) = preferences.price_band else {
        return weights.price / 2.0;
    };

    match price {
        Some(price) if band.contains(price) => {
            let width = band.max - band.min;
            if width <= 0.0 {
                return weights.price;
            }
            let deviation = (price - band.average).abs() / width;
            weights.price * (1.0 - deviation.min(1.0))
        }
        _ => 0.0,
    }
}

/// Linear decay from the live location out to the usual radius. Neutral
/// unless the live location, the pattern and the salon coordinates all exist.
#[inline]
fn calculate_location_score(
    salon: &SalonCatalogEntry,
    preferences: &UserPreferenceProfile,
    live_location: Option<&GeoPoint>,
    weights: &ScoringWeights,
) -> f64 {
    let (Some(live), Some(pattern), Some(coordinates)) = (
        live_location.filter(|point| point.is_valid()),
        preferences.location_pattern.as_ref(),
        salon.coordinates(),
    ) else {
        return weights.location / 2.0;
    };

    let distance_km = live.distance_km(&coordinates);
    if !distance_km.is_finite() {
        return weights.location / 2.0;
    }
    if pattern.max_distance_km <= 0.0 || distance_km > pattern.max_distance_km {
        return 0.0;
    }

    weights.location * (1.0 - distance_km / pattern.max_distance_km)
}

#[inline]
fn calculate_rating_score(rating: f64, weights: &ScoringWeights) -> f64 {
    if rating <= 0.0 {
        return 0.0;
    }
    (rating.min(MAX_RATING) / MAX_RATING) * weights.rating
}
