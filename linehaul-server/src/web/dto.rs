//! Data transfer objects for web requests and responses.
//!
//! Timestamps travel as `YYYY-MM-DDTHH:MM:SS`, dates as `YYYY-MM-DD` and
//! clock times as `HH:MM:SS`.

use serde::{Deserialize, Serialize};

use crate::dispatch::{LateDeparture, LateReason};
use crate::domain::{Manifest, RouteProfile, Trip, format_schedule_time, format_timestamp};
use crate::eta::{DisplayEta, TripEstimate};

/// Query for `GET /profiles/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveProfileQuery {
    /// Linehaul name as written on the manifest
    pub route: String,

    /// Origin terminal code
    pub origin: Option<String>,
}

/// Result of profile resolution.
#[derive(Debug, Serialize)]
pub struct ResolveProfileResponse {
    pub profile: Option<ProfileResult>,

    /// Name of the rule that matched
    pub rule: Option<&'static str>,
}

/// A route profile.
#[derive(Debug, Serialize)]
pub struct ProfileResult {
    pub id: u64,
    pub profile_code: Option<String>,
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub distance_miles: Option<f64>,
    pub transit_time_minutes: Option<i64>,
    pub standard_departure_time: Option<String>,
    pub standard_arrival_time: Option<String>,
    pub headhaul: bool,
    pub active: bool,
}

impl ProfileResult {
    pub fn from_profile(profile: &RouteProfile) -> Self {
        Self {
            id: profile.id.0,
            profile_code: profile.profile_code.clone(),
            name: profile.name.clone(),
            origin: profile.origin.to_string(),
            destination: profile.destination.to_string(),
            distance_miles: profile.distance_miles,
            transit_time_minutes: profile.transit_time_minutes,
            standard_departure_time: profile.standard_departure_time.map(format_schedule_time),
            standard_arrival_time: profile.standard_arrival_time.map(format_schedule_time),
            headhaul: profile.headhaul,
            active: profile.active,
        }
    }
}

/// Query for `GET /destinations/infer`.
#[derive(Debug, Deserialize)]
pub struct InferDestinationQuery {
    pub route: String,
    pub origin: String,
}

/// Result of destination inference.
#[derive(Debug, Serialize)]
pub struct InferDestinationResponse {
    pub destination: Option<String>,

    /// Name of the strategy that produced the answer
    pub strategy: Option<&'static str>,
}

/// Query for `GET /profiles/:id/estimate`.
#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    /// Destination terminal (defaults to the profile's)
    pub destination: Option<String>,

    /// Departure timestamp (defaults to now)
    pub departure: Option<String>,
}

/// Distance and arrival estimate.
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub known: bool,
    pub miles: Option<f64>,
    pub transit_minutes: Option<i64>,
    pub eta: Option<String>,

    /// "STORED" or "HAVERSINE"
    pub basis: Option<&'static str>,
}

impl EstimateResponse {
    pub fn from_estimate(estimate: Option<&TripEstimate>) -> Self {
        match estimate {
            Some(e) => Self {
                known: true,
                miles: Some(e.miles),
                transit_minutes: Some(e.transit_minutes),
                eta: Some(format_timestamp(e.eta)),
                basis: Some(e.basis.as_str()),
            },
            None => Self {
                known: false,
                miles: None,
                transit_minutes: None,
                eta: None,
                basis: None,
            },
        }
    }
}

/// Body for `POST /continuity/validate`.
#[derive(Debug, Deserialize)]
pub struct ContinuityRequest {
    /// Manifest numbers in trip order
    pub manifests: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ContinuityResponse {
    pub valid: bool,
}

/// Body for `POST /trips` and `POST /trips/dispatch`.
#[derive(Debug, Deserialize)]
pub struct TripDraftRequest {
    pub trip_number: Option<String>,

    /// Operating date (defaults to today)
    pub dispatch_date: Option<String>,

    pub manifests: Vec<String>,
    pub driver: Option<u64>,
    pub truck: Option<String>,

    #[serde(default)]
    pub trailers: Vec<String>,

    #[serde(default)]
    pub dollies: Vec<String>,

    #[serde(default)]
    pub owner_operator: bool,

    pub destination_override: Option<String>,

    #[serde(default)]
    pub notes: String,

    /// Actual departure for dispatch (defaults to now)
    pub departed_at: Option<String>,
}

/// Body for `POST /trips/:id/assign`.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub driver: u64,
    pub truck: Option<String>,

    #[serde(default)]
    pub trailers: Vec<String>,

    #[serde(default)]
    pub dollies: Vec<String>,

    #[serde(default)]
    pub owner_operator: bool,

    /// Version the client last saw
    pub version: Option<u64>,
}

/// Body for `POST /trips/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    pub recorded_at: Option<String>,
    pub actual_departure: Option<String>,
    pub actual_arrival: Option<String>,

    /// Version the client last saw
    pub version: Option<u64>,
}

/// Body for `POST /trips/:id/late-reason`.
#[derive(Debug, Deserialize)]
pub struct LateReasonRequest {
    pub code: String,
    pub note: Option<String>,
    pub recorded_at: Option<String>,
}

/// Query for `GET /trips` and `GET /fleet/load-factor`.
#[derive(Debug, Default, Deserialize)]
pub struct TripListQuery {
    pub status: Option<String>,
    pub date: Option<String>,
}

/// Query for `GET /manifests`.
#[derive(Debug, Default, Deserialize)]
pub struct ManifestQuery {
    pub status: Option<String>,
    pub origin: Option<String>,
    pub trip: Option<u64>,

    #[serde(default)]
    pub unassigned: bool,
}

/// A trip.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub id: u64,
    pub trip_number: String,
    pub status: &'static str,
    pub profile_id: Option<u64>,
    pub manifests: Vec<String>,
    pub driver: Option<u64>,
    pub truck: Option<String>,
    pub trailers: Vec<String>,
    pub dollies: Vec<String>,
    pub owner_operator: bool,
    pub dispatch_date: String,
    pub planned_departure: Option<String>,
    pub actual_departure: Option<String>,
    pub planned_arrival: Option<String>,
    pub actual_arrival: Option<String>,

    /// Destination after any dispatcher override
    pub destination: Option<String>,

    pub destination_override: Option<String>,
    pub calculated_miles: Option<f64>,
    pub notes: String,
    pub version: u64,
}

impl TripResult {
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id.0,
            trip_number: trip.trip_number.clone(),
            status: trip.status.as_str(),
            profile_id: trip.profile_id.map(|p| p.0),
            manifests: trip.manifests.iter().map(ToString::to_string).collect(),
            driver: trip.driver.map(|d| d.0),
            truck: trip.truck.as_ref().map(ToString::to_string),
            trailers: trip.trailers.iter().map(ToString::to_string).collect(),
            dollies: trip.dollies.iter().map(ToString::to_string).collect(),
            owner_operator: trip.owner_operator,
            dispatch_date: trip.dispatch_date.format("%Y-%m-%d").to_string(),
            planned_departure: trip.planned_departure.map(format_timestamp),
            actual_departure: trip.actual_departure.map(format_timestamp),
            planned_arrival: trip.planned_arrival.map(format_timestamp),
            actual_arrival: trip.actual_arrival.map(format_timestamp),
            destination: trip.effective_destination().map(|d| d.to_string()),
            destination_override: trip.destination_override.map(|d| d.to_string()),
            calculated_miles: trip.calculated_miles,
            notes: trip.notes.clone(),
            version: trip.version,
        }
    }
}

/// A trip with its manifests and lateness.
#[derive(Debug, Serialize)]
pub struct TripDetailResponse {
    pub trip: TripResult,
    pub manifests: Vec<ManifestResult>,
    pub minutes_late: Option<i64>,
    pub late_reason: Option<LateReasonResult>,
}

/// A trip row in `GET /trips`, with its displayed ETA.
#[derive(Debug, Serialize)]
pub struct TripSummary {
    #[serde(flatten)]
    pub trip: TripResult,
    pub eta: Option<EtaResult>,
}

#[derive(Debug, Serialize)]
pub struct TripListResponse {
    pub trips: Vec<TripSummary>,
}

/// A late departure lacking an explanation.
#[derive(Debug, Serialize)]
pub struct LateTripResult {
    pub trip: TripResult,
    pub scheduled: String,
    pub minutes_late: i64,
}

impl LateTripResult {
    pub fn from_late(late: &LateDeparture) -> Self {
        Self {
            trip: TripResult::from_trip(&late.trip),
            scheduled: format_schedule_time(late.scheduled),
            minutes_late: late.minutes_late,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LateTripsResponse {
    pub trips: Vec<LateTripResult>,
}

#[derive(Debug, Serialize)]
pub struct LateReasonResult {
    pub code: String,
    pub note: Option<String>,
    pub recorded_at: String,
}

impl LateReasonResult {
    pub fn from_reason(reason: &LateReason) -> Self {
        Self {
            code: reason.code.clone(),
            note: reason.note.clone(),
            recorded_at: format_timestamp(reason.recorded_at),
        }
    }
}

/// A manifest.
#[derive(Debug, Serialize)]
pub struct ManifestResult {
    pub manifest_number: String,
    pub linehaul_name: String,
    pub origin: String,
    pub destination: Option<String>,
    pub trailer_number: Option<String>,
    pub status: &'static str,
    pub pieces: u32,
    pub weight: f64,
    pub suggested_trailer_length: Option<u32>,
    pub target_dispatch_time: Option<String>,
    pub linehaul_trip_id: Option<u64>,
}

impl ManifestResult {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            manifest_number: manifest.manifest_number.to_string(),
            linehaul_name: manifest.linehaul_name.clone(),
            origin: manifest.origin.to_string(),
            destination: manifest.destination.map(|d| d.to_string()),
            trailer_number: manifest.trailer_number.as_ref().map(ToString::to_string),
            status: manifest.status.as_str(),
            pieces: manifest.pieces,
            weight: manifest.weight,
            suggested_trailer_length: manifest.suggested_trailer_length,
            target_dispatch_time: manifest.target_dispatch_time.map(format_schedule_time),
            linehaul_trip_id: manifest.linehaul_trip_id.map(|t| t.0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ManifestListResponse {
    pub manifests: Vec<ManifestResult>,
}

#[derive(Debug, Serialize)]
pub struct LoadFactorResponse {
    /// Percentage of full load, one decimal place
    pub load_factor: Option<f64>,
}

/// The ETA shown to dispatchers.
#[derive(Debug, Serialize)]
pub struct EtaResult {
    pub eta: String,

    /// "GPS" or "PROFILE"
    pub source: String,
}

impl EtaResult {
    pub fn from_display(eta: &DisplayEta) -> Self {
        Self {
            eta: format_timestamp(eta.eta),
            source: eta.source.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TripEtaResponse {
    pub eta: Option<EtaResult>,
}

/// Outcome of `POST /routes/import`.
#[derive(Debug, Serialize)]
pub struct RouteImportResponse {
    pub imported: usize,

    /// Rows without mileage
    pub skipped: usize,

    pub failed: usize,
    pub failures: Vec<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
