//! Great-circle distance with a road correction.
//!
//! Highway miles between terminals run longer than the great-circle distance.
//! A fixed correction factor turns one into a usable estimate of the other.

use crate::domain::Coordinates;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Ratio of typical road distance to great-circle distance.
pub const ROAD_DISTANCE_FACTOR: f64 = 1.3;

/// Great-circle distance between two points, in statute miles.
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards against h drifting just past 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_MILES * c
}

/// Estimated road miles between two points, rounded to the nearest mile.
pub fn road_miles(a: Coordinates, b: Coordinates) -> f64 {
    (haversine_miles(a, b) * ROAD_DISTANCE_FACTOR).round()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_point() -> impl Strategy<Value = Coordinates> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinates::new(lat, lon))
    }

    proptest! {
        /// Distance is symmetric
        #[test]
        fn symmetric(a in arb_point(), b in arb_point()) {
            let ab = haversine_miles(a, b);
            let ba = haversine_miles(b, a);
            prop_assert!((ab - ba).abs() < 1e-9, "{} vs {}", ab, ba);
        }

        /// Distance from a point to itself is zero
        #[test]
        fn identity(a in arb_point()) {
            prop_assert_eq!(haversine_miles(a, a), 0.0);
        }

        /// Distance never exceeds half the circumference
        #[test]
        fn bounded(a in arb_point(), b in arb_point()) {
            let d = haversine_miles(a, b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_MILES + 1e-6);
        }
    }
}
