//! Distance and arrival estimates for a trip leg.
//!
//! Planners store miles and transit time on most profiles. When the trip is
//! sent somewhere else, or nothing was stored, the estimate falls back to
//! great-circle distance between terminal coordinates at a fixed average
//! speed. A live GPS estimate, when one is available, is preferred for
//! display.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::directory::Directory;
use crate::domain::{RouteProfile, TerminalCode};
use crate::geo::road_miles;

/// Average over-the-road speed used to derive transit times.
pub const AVERAGE_SPEED_MPH: f64 = 45.0;

/// Where an estimate's distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceBasis {
    /// Miles stored on the profile.
    Stored,
    /// Haversine between terminal coordinates, corrected for roads.
    Haversine,
}

impl DistanceBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceBasis::Stored => "STORED",
            DistanceBasis::Haversine => "HAVERSINE",
        }
    }
}

/// A known distance and arrival estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripEstimate {
    pub miles: f64,
    pub transit_minutes: i64,
    pub eta: NaiveDateTime,
    pub basis: DistanceBasis,
}

/// Result of a distance estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceEta {
    Known(TripEstimate),
    /// Nothing stored and coordinates missing for one end, or a transit
    /// time too large to add to the departure.
    Unknown,
}

impl DistanceEta {
    pub fn estimate(&self) -> Option<&TripEstimate> {
        match self {
            DistanceEta::Known(estimate) => Some(estimate),
            DistanceEta::Unknown => None,
        }
    }
}

/// Minutes needed to cover `miles` at the average speed.
pub fn transit_minutes_for(miles: f64) -> i64 {
    (miles / AVERAGE_SPEED_MPH * 60.0).round() as i64
}

/// Estimate distance, transit time and arrival for `profile` heading to
/// `destination`, departing at `now`.
pub fn calculate_distance_eta(
    profile: &RouteProfile,
    destination: &TerminalCode,
    directory: &Directory,
    now: NaiveDateTime,
) -> DistanceEta {
    if *destination == profile.destination
        && let Some(miles) = profile.distance_miles
    {
        let transit = profile
            .transit_time_minutes
            .unwrap_or_else(|| transit_minutes_for(miles));
        return arrival_estimate(profile, miles, transit, now, DistanceBasis::Stored);
    }

    let coordinates = |code: &TerminalCode| directory.terminal(code).and_then(|t| t.coordinates);
    let (Some(from), Some(to)) = (coordinates(&profile.origin), coordinates(destination)) else {
        debug!(
            profile = %profile.id,
            origin = %profile.origin,
            destination = %destination,
            "no stored distance and terminal coordinates missing"
        );
        return DistanceEta::Unknown;
    };

    let miles = road_miles(from, to);
    let transit = transit_minutes_for(miles);
    debug!(
        profile = %profile.id,
        destination = %destination,
        miles,
        "distance estimated from coordinates"
    );
    arrival_estimate(profile, miles, transit, now, DistanceBasis::Haversine)
}

/// Unknown when the arrival falls outside the representable date range.
fn arrival_estimate(
    profile: &RouteProfile,
    miles: f64,
    transit: i64,
    now: NaiveDateTime,
    basis: DistanceBasis,
) -> DistanceEta {
    let Some(eta) = Duration::try_minutes(transit).and_then(|d| now.checked_add_signed(d)) else {
        debug!(
            profile = %profile.id,
            transit_minutes = transit,
            "transit time out of range"
        );
        return DistanceEta::Unknown;
    };
    DistanceEta::Known(TripEstimate {
        miles,
        transit_minutes: transit,
        eta,
        basis,
    })
}

/// Which estimate is shown to dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaSource {
    Gps,
    Profile,
}

impl fmt::Display for EtaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtaSource::Gps => f.write_str("GPS"),
            EtaSource::Profile => f.write_str("PROFILE"),
        }
    }
}

/// An arrival time together with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayEta {
    pub eta: NaiveDateTime,
    pub source: EtaSource,
}

/// Prefer a live GPS estimate over the profile estimate.
pub fn display_eta(
    profile_eta: Option<NaiveDateTime>,
    gps_eta: Option<NaiveDateTime>,
) -> Option<DisplayEta> {
    match (gps_eta, profile_eta) {
        (Some(eta), _) => Some(DisplayEta {
            eta,
            source: EtaSource::Gps,
        }),
        (None, Some(eta)) => Some(DisplayEta {
            eta,
            source: EtaSource::Profile,
        }),
        (None, None) => None,
    }
}
