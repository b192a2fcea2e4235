use crate::core::filters::service_matches;
use crate::models::{SalonCatalogEntry, UserPreferenceProfile};

/// Rating from which a salon is called out as highly rated
pub const HIGHLY_RATED_THRESHOLD: f64 = 4.5;

pub const REASON_HIGHLY_RATED: &str = "Highly rated";
pub const REASON_PREVIOUSLY_VISITED: &str = "Previously visited";
pub const REASON_POPULAR_CHOICE: &str = "Popular choice";

/// Human-readable reasons for a recommendation.
///
/// Order is service, rating, visit history; "Popular choice" only when
/// nothing else applies, so the list is never empty.
pub fn generate_reasons(salon: &SalonCatalogEntry, preferences: &UserPreferenceProfile) -> Vec<String> {
    let mut reasons = Vec::new();

    if !preferences.preferred_services.is_empty()
        && service_matches(&salon.types_of_massages, &preferences.preferred_services)
    {
        reasons.push(format!("Offers {}", salon.types_of_massages.join(", ")));
    }

    if salon.rating_value() >= HIGHLY_RATED_THRESHOLD {
        reasons.push(REASON_HIGHLY_RATED.to_string());
    }

    if preferences.is_frequent(&salon.id) {
        reasons.push(REASON_PREVIOUSLY_VISITED.to_string());
    }

    if reasons.is_empty() {
        reasons.push(REASON_POPULAR_CHOICE.to_string());
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_salon(id: &str, services: &[&str], rating: Option<f64>) -> SalonCatalogEntry {
        SalonCatalogEntry {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            salon_name: "Salon".to_string(),
            salon_image: None,
            location: None,
            price_range: None,
            types_of_massages: services.iter().map(|s| s.to_string()).collect(),
            rating,
            total_reviews: 0,
        }
    }

    #[test]
    fn test_all_reasons_in_order() {
        let salon = create_salon("s1", &["Oil massage", "Foot massage"], Some(4.8));
        let preferences = UserPreferenceProfile {
            preferred_services: vec!["oil massage".to_string()],
            frequent_salons: vec!["s1".to_string()],
            ..Default::default()
        };

        assert_eq!(
            generate_reasons(&salon, &preferences),
            vec!["Offers Oil massage, Foot massage", "Highly rated", "Previously visited"]
        );
    }

    #[test]
    fn test_fallback_reason() {
        let salon = create_salon("s1", &["Oil massage"], Some(4.4));
        assert_eq!(
            generate_reasons(&salon, &UserPreferenceProfile::default()),
            vec!["Popular choice"]
        );
    }

    #[test]
    fn test_reasons_are_deterministic() {
        let salon = create_salon("s2", &["Hot compress"], Some(4.5));
        let preferences = UserPreferenceProfile {
            preferred_services: vec!["aromatherapy".to_string()],
            ..Default::default()
        };

        let first = generate_reasons(&salon, &preferences);
        let second = generate_reasons(&salon, &preferences);
        assert_eq!(first, second);
        assert_eq!(first, vec!["Highly rated"]);
    }
}
