use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::distance::haversine_distance;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components finite and within their degree ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to another point in kilometers
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Postal address plus optional coordinates of a salon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalonLocation {
    #[serde(rename = "streetAddress", default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl SalonLocation {
    /// Coordinates, present only when both components are finite numbers
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoPoint::new(lat, lon))
            }
            _ => None,
        }
    }
}

/// Salon as seen by the recommendation engine (bounded catalog projection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalonCatalogEntry {
    pub id: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "salonName")]
    pub salon_name: String,
    #[serde(rename = "salonImage", default)]
    pub salon_image: Option<String>,
    #[serde(default)]
    pub location: Option<SalonLocation>,
    /// Normalized price indicator; `None` when the stored value does not parse
    #[serde(rename = "priceRange", default, deserialize_with = "deserialize_price")]
    pub price_range: Option<f64>,
    #[serde(rename = "typesOfMassages", default)]
    pub types_of_massages: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(rename = "totalReviews", default)]
    pub total_reviews: u32,
}

impl SalonCatalogEntry {
    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.location.as_ref().and_then(SalonLocation::coordinates)
    }

    /// Rating as a number, zero when unrated
    pub fn rating_value(&self) -> f64 {
        self.rating.filter(|r| r.is_finite()).unwrap_or(0.0)
    }
}

/// Parse a price indicator the way loosely-typed clients write it.
///
/// Takes the longest numeric prefix of the trimmed input, so `"150 THB"` is
/// 150. Returns `None` when nothing numeric leads the string.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }

    trimmed[..end].parse::<f64>().ok().filter(|p| p.is_finite())
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<RawPrice>::deserialize(deserializer)? {
        Some(RawPrice::Number(n)) if n.is_finite() => Some(n),
        Some(RawPrice::Text(s)) => parse_price(&s),
        _ => None,
    })
}

/// Booking lifecycle states; only `Accepted` feeds preference history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    NoShow,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
            BookingStatus::Expired => "expired",
        }
    }
}

/// Accepted booking with a snapshot of the salon it was made at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Missing for bookings with private massagers or deleted salons
    pub salon: Option<SalonCatalogEntry>,
    #[serde(rename = "requestedAt")]
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Inactive => "Inactive",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::Expired => "Expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(SubscriptionStatus::Active),
            "Inactive" => Some(SubscriptionStatus::Inactive),
            "Cancelled" => Some(SubscriptionStatus::Cancelled),
            "Expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    #[serde(rename = "salonId", default)]
    pub salon_id: Option<String>,
    #[serde(rename = "planType", default)]
    pub plan_type: Option<String>,
    pub status: SubscriptionStatus,
}

impl SubscriptionRecord {
    /// Active with a linked salon; the only subscriptions that earn a boost
    pub fn is_boostable(&self) -> bool {
        self.status == SubscriptionStatus::Active && self.salon_id.is_some()
    }
}

/// Active subscription joined with its salon
#[derive(Debug, Clone)]
pub struct ActiveSubscription {
    pub subscription: SubscriptionRecord,
    pub salon: SalonCatalogEntry,
}

/// One subscription-boosted surfacing of a salon to a user in a week
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchLedgerEntry {
    #[serde(rename = "salonId")]
    pub salon_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "weekStartDate")]
    pub week_start: NaiveDateTime,
}

/// Acceptable price window derived from history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl PriceBand {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Where the user usually books
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationPattern {
    pub center: GeoPoint,
    #[serde(rename = "maxDistanceKm")]
    pub max_distance_km: f64,
}

/// Preferences derived from a user's accepted bookings, computed per request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferenceProfile {
    #[serde(rename = "preferredServices")]
    pub preferred_services: Vec<String>,
    #[serde(rename = "priceRange")]
    pub price_band: Option<PriceBand>,
    #[serde(rename = "locationPattern")]
    pub location_pattern: Option<LocationPattern>,
    #[serde(rename = "frequentSalons")]
    pub frequent_salons: Vec<String>,
}

impl UserPreferenceProfile {
    pub fn is_frequent(&self, salon_id: &str) -> bool {
        self.frequent_salons.iter().any(|id| id == salon_id)
    }
}

/// Subscription state attached to a boosted recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
    #[serde(rename = "planType")]
    pub plan_type: Option<String>,
    #[serde(rename = "weeklyMatchCount")]
    pub weekly_match_count: u32,
    #[serde(rename = "remainingMatches")]
    pub remaining_matches: u32,
}

/// Salon fields returned to callers; carries the owner id so a booking
/// request can be issued without a second lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedSalon {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "salonName")]
    pub salon_name: String,
    #[serde(rename = "salonImage")]
    pub salon_image: Option<String>,
    pub location: Option<SalonLocation>,
    #[serde(rename = "priceRange")]
    pub price_range: Option<f64>,
    #[serde(rename = "typesOfMassages")]
    pub types_of_massages: Vec<String>,
    pub rating: f64,
    #[serde(rename = "totalReviews")]
    pub total_reviews: u32,
    #[serde(rename = "isSubscribed")]
    pub is_subscribed: bool,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
}

impl RecommendedSalon {
    pub fn from_entry(salon: &SalonCatalogEntry, is_subscribed: bool) -> Self {
        Self {
            id: salon.id.clone(),
            salon_name: salon.salon_name.clone(),
            salon_image: salon.salon_image.clone(),
            location: salon.location.clone(),
            price_range: salon.price_range,
            types_of_massages: salon.types_of_massages.clone(),
            rating: salon.rating_value(),
            total_reviews: salon.total_reviews,
            is_subscribed,
            owner_id: salon.owner_id.clone(),
        }
    }
}

/// Ranked, explained recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub salon: RecommendedSalon,
    pub score: f64,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionSnapshot>,
}

/// Points available per scoring component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub service_match: f64,
    pub service_mismatch: f64,
    pub service_neutral: f64,
    pub price: f64,
    pub location: f64,
    pub rating: f64,
}

impl ScoringWeights {
    pub fn max_score(&self) -> f64 {
        self.service_match + self.price + self.location + self.rating
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            service_match: 40.0,
            service_mismatch: 10.0,
            service_neutral: 20.0,
            price: 25.0,
            location: 25.0,
            rating: 10.0,
        }
    }
}

/// Additive boosts applied on top of the organic score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostSettings {
    pub subscription: f64,
    pub frequent_salon: f64,
}

impl Default for BoostSettings {
    fn default() -> Self {
        Self {
            subscription: 50.0,
            frequent_salon: 10.0,
        }
    }
}
