/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Bangkok to Chiang Mai (approximately 580 km)
        let bangkok_lat = 13.7563;
        let bangkok_lon = 100.5018;
        let chiang_mai_lat = 18.7883;
        let chiang_mai_lon = 98.9853;

        let distance = haversine_distance(bangkok_lat, bangkok_lon, chiang_mai_lat, chiang_mai_lon);
        assert!((distance - 580.0).abs() < 15.0, "Distance should be ~580km, got {}", distance);
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_distance(13.7563, 100.5018, 13.7563, 100.5018), 0.0);
    }

    #[test]
    fn test_monotonic_in_longitude() {
        let mut previous = 0.0;
        for step in 1..=20 {
            let distance = haversine_distance(13.75, 100.0, 13.75, 100.0 + step as f64 * 0.05);
            assert!(distance > previous, "step {} not increasing", step);
            previous = distance;
        }
    }
}
