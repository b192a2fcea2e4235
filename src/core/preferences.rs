use std::collections::HashMap;

use crate::models::{BookingRecord, GeoPoint, LocationPattern, PriceBand, UserPreferenceProfile};

/// Most recent accepted bookings considered per user
pub const HISTORY_LIMIT: usize = 50;

/// Preferred service tags kept in a profile
pub const TOP_SERVICES: usize = 10;

/// Frequently visited salons kept in a profile
pub const TOP_SALONS: usize = 5;

/// Radius around the historical centroid that counts as "usual area"
pub const DEFAULT_RADIUS_KM: f64 = 20.0;

/// Relative widening applied to the observed min/max prices
const PRICE_BAND_MARGIN: f64 = 0.3;

/// Derive a preference profile from accepted bookings (newest first).
///
/// Each field is derived independently: a history without prices still
/// yields services, a history without coordinates still yields a price band.
/// An empty history yields the empty profile.
pub fn analyze_history(bookings: &[BookingRecord]) -> UserPreferenceProfile {
    if bookings.is_empty() {
        return UserPreferenceProfile::default();
    }

    let salons: Vec<_> = bookings.iter().filter_map(|b| b.salon.as_ref()).collect();

    let preferred_services = top_by_frequency(
        salons
            .iter()
            .flat_map(|salon| salon.types_of_massages.iter())
            .map(|service| service.trim().to_lowercase())
            .filter(|service| !service.is_empty()),
        TOP_SERVICES,
    );

    let prices: Vec<f64> = salons.iter().filter_map(|salon| salon.price_range).collect();
    let price_band = derive_price_band(&prices);

    let points: Vec<GeoPoint> = salons.iter().filter_map(|salon| salon.coordinates()).collect();
    let location_pattern = derive_location_pattern(&points);

    let frequent_salons = top_by_frequency(salons.iter().map(|salon| salon.id.clone()), TOP_SALONS);

    UserPreferenceProfile {
        preferred_services,
        price_band,
        location_pattern,
        frequent_salons,
    }
}

/// Price band widened 30% past the observed extremes, floored at zero
pub fn derive_price_band(prices: &[f64]) -> Option<PriceBand> {
    if prices.is_empty() {
        return None;
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = prices.iter().sum::<f64>() / prices.len() as f64;

    Some(PriceBand {
        min: (min * (1.0 - PRICE_BAND_MARGIN)).max(0.0),
        max: max * (1.0 + PRICE_BAND_MARGIN),
        average,
    })
}

/// Arithmetic centroid of the visited coordinates
pub fn derive_location_pattern(points: &[GeoPoint]) -> Option<LocationPattern> {
    if points.is_empty() {
        return None;
    }

    let count = points.len() as f64;
    let latitude = points.iter().map(|p| p.latitude).sum::<f64>() / count;
    let longitude = points.iter().map(|p| p.longitude).sum::<f64>() / count;

    Some(LocationPattern {
        center: GeoPoint::new(latitude, longitude),
        max_distance_km: DEFAULT_RADIUS_KM,
    })
}

/// Most frequent values, ties kept in first-seen order
fn top_by_frequency<I>(values: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut tally: Vec<(String, usize)> = Vec::new();

    for value in values {
        match positions.get(&value) {
            Some(&idx) => tally[idx].1 += 1,
            None => {
                positions.insert(value.clone(), tally.len());
                tally.push((value, 1));
            }
        }
    }

    // sort_by is stable
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally.into_iter().take(limit).map(|(value, _)| value).collect()
}
