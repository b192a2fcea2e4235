use crate::models::PriceRangeFilter;

/// Whether any salon tag matches any preferred tag.
///
/// Comparison is case-insensitive and bidirectional: "oil" matches
/// "Oil massage" and "oil massage" matches "Oil". Blank tags never match.
#[inline]
pub fn service_matches(salon_services: &[String], preferred: &[String]) -> bool {
    let salon: Vec<String> = salon_services
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    preferred
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .any(|pref| {
            salon
                .iter()
                .any(|service| service.contains(&pref) || pref.contains(service.as_str()))
        })
}

/// Whether a price satisfies optional client bounds
#[inline]
pub fn within_price_range(price: Option<f64>, range: &PriceRangeFilter) -> bool {
    let Some(price) = price else {
        return false;
    };
    range.min.map_or(true, |min| price >= min) && range.max.map_or(true, |max| price <= max)
}

/// Explicit filters a client can layer over the ranking
#[derive(Debug, Clone, Default)]
pub struct CustomFilter {
    pub preferred_services: Vec<String>,
    pub price_range: Option<PriceRangeFilter>,
}

impl CustomFilter {
    pub fn is_empty(&self) -> bool {
        self.preferred_services.is_empty() && self.price_range.is_none()
    }

    /// Whether a salon offers a requested service and sits in the requested
    /// price range. Unset criteria always pass.
    pub fn matches(&self, services: &[String], price: Option<f64>) -> bool {
        let services_ok = self.preferred_services.is_empty()
            || service_matches(services, &self.preferred_services);
        let price_ok = self
            .price_range
            .as_ref()
            .map_or(true, |range| within_price_range(price, range));

        services_ok && price_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_service_match_bidirectional() {
        assert!(service_matches(&tags(&["Oil massage"]), &tags(&["oil"])));
        assert!(service_matches(&tags(&["Oil"]), &tags(&["oil massage"])));
        assert!(service_matches(&tags(&["NUAD THAI"]), &tags(&["nuad thai"])));
        assert!(!service_matches(&tags(&["Foot massage"]), &tags(&["aromatherapy"])));
    }

    #[test]
    fn test_blank_tags_never_match() {
        assert!(!service_matches(&tags(&["", "  "]), &tags(&["oil massage"])));
        assert!(!service_matches(&tags(&["Oil massage"]), &tags(&[""])));
    }

    #[test]
    fn test_price_range_filter() {
        let range = PriceRangeFilter { min: Some(100.0), max: Some(300.0) };
        assert!(within_price_range(Some(100.0), &range));
        assert!(within_price_range(Some(300.0), &range));
        assert!(!within_price_range(Some(301.0), &range));
        assert!(!within_price_range(None, &range));

        let open = PriceRangeFilter { min: None, max: Some(200.0) };
        assert!(within_price_range(Some(5.0), &open));
    }

    #[test]
    fn test_custom_filter_matches() {
        let filter = CustomFilter {
            preferred_services: tags(&["Oil massage"]),
            price_range: Some(PriceRangeFilter { min: None, max: Some(500.0) }),
        };

        assert!(filter.matches(&tags(&["Oil massage"]), Some(150.0)));
        assert!(filter.matches(&tags(&["oil massage", "Hot compress"]), Some(500.0)));
        assert!(!filter.matches(&tags(&["Foot massage"]), Some(150.0)));
        assert!(!filter.matches(&tags(&["Oil massage"]), Some(900.0)));
        assert!(!filter.matches(&tags(&["Oil massage"]), None));
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let filter = CustomFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&[], None));
        assert!(filter.matches(&tags(&["Foot massage"]), Some(10.0)));
    }
}
