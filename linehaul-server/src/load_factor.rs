//! Load factor: freight weight per foot of trailer.

use crate::directory::Directory;
use crate::domain::{Manifest, Trip};

/// Pounds per trailer foot that count as a full load.
pub const FULL_LOAD_LBS_PER_FOOT: f64 = 590.0;

/// Load factor as a percentage, one decimal place.
///
/// `None` when there is no trailer length to divide by.
///
/// ```
/// use linehaul_server::load_factor::load_factor_percent;
///
/// assert_eq!(load_factor_percent(23_600.0, 40), Some(100.0));
/// assert_eq!(load_factor_percent(10_000.0, 53), Some(32.0));
/// assert_eq!(load_factor_percent(10_000.0, 0), None);
/// ```
pub fn load_factor_percent(total_weight: f64, total_length_feet: u32) -> Option<f64> {
    if total_length_feet == 0 {
        return None;
    }
    let ratio = total_weight / (total_length_feet as f64 * FULL_LOAD_LBS_PER_FOOT) * 100.0;
    Some((ratio * 10.0).round() / 10.0)
}

/// Total weight and trailer length for one trip.
///
/// Length comes from the trip's trailers known to the directory; when none
/// are, the manifests' suggested lengths stand in.
pub fn trip_totals(trip: &Trip, manifests: &[Manifest], directory: &Directory) -> (f64, u32) {
    let weight: f64 = manifests.iter().map(|m| m.weight).sum();

    let linked: Vec<u32> = trip
        .trailers
        .iter()
        .filter_map(|unit| directory.trailer(unit))
        .map(|t| t.length_feet)
        .collect();
    let length: u32 = if linked.is_empty() {
        manifests.iter().filter_map(|m| m.suggested_trailer_length).sum()
    } else {
        linked.iter().sum()
    };

    (weight, length)
}

/// Load factor of one trip, given its manifests.
pub fn compute_load_factor(
    trip: &Trip,
    manifests: &[Manifest],
    directory: &Directory,
) -> Option<f64> {
    let (weight, length) = trip_totals(trip, manifests, directory);
    load_factor_percent(weight, length)
}

/// Aggregate load factor over several trips: summed weight over summed length.
pub fn fleet_load_factor<'a>(
    trips: impl IntoIterator<Item = (&'a Trip, &'a [Manifest])>,
    directory: &Directory,
) -> Option<f64> {
    let (weight, length) = trips
        .into_iter()
        .map(|(trip, manifests)| trip_totals(trip, manifests, directory))
        .fold((0.0, 0u32), |(w, l), (tw, tl)| (w + tw, l + tl));
    load_factor_percent(weight, length)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// More weight never lowers the load factor
        #[test]
        fn monotone_in_weight(w in 0.0f64..100_000.0, extra in 0.0f64..50_000.0, len in 1u32..200) {
            let lo = load_factor_percent(w, len).unwrap();
            let hi = load_factor_percent(w + extra, len).unwrap();
            prop_assert!(hi >= lo);
        }

        /// More trailer length never raises the load factor
        #[test]
        fn antitone_in_length(w in 0.0f64..100_000.0, len in 1u32..200, extra in 0u32..100) {
            let short = load_factor_percent(w, len).unwrap();
            let long = load_factor_percent(w, len + extra).unwrap();
            prop_assert!(long <= short);
        }

        /// Zero length is always unknown
        #[test]
        fn zero_length_unknown(w in 0.0f64..100_000.0) {
            prop_assert_eq!(load_factor_percent(w, 0), None);
        }
    }
}
