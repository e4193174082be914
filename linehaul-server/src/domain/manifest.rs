//! Manifests (loadsheets): one trailer's worth of freight.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;

use super::{TerminalCode, TripId, UnitNumber};

/// Unique manifest number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManifestNumber(String);

impl ManifestNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ManifestNumber {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ManifestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loading status of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestStatus {
    Draft,
    Open,
    Loading,
    Closed,
    Dispatched,
    Terminated,
}

impl ManifestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestStatus::Draft => "DRAFT",
            ManifestStatus::Open => "OPEN",
            ManifestStatus::Loading => "LOADING",
            ManifestStatus::Closed => "CLOSED",
            ManifestStatus::Dispatched => "DISPATCHED",
            ManifestStatus::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognised status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ManifestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(ManifestStatus::Draft),
            "OPEN" => Ok(ManifestStatus::Open),
            "LOADING" => Ok(ManifestStatus::Loading),
            "CLOSED" => Ok(ManifestStatus::Closed),
            "DISPATCHED" => Ok(ManifestStatus::Dispatched),
            "TERMINATED" => Ok(ManifestStatus::Terminated),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A physical shipment record for one trailer.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub manifest_number: ManifestNumber,
    /// Route label as the upstream system wrote it; matched loosely against profiles.
    pub linehaul_name: String,
    pub origin: TerminalCode,
    /// Absent for continuing freight.
    pub destination: Option<TerminalCode>,
    pub trailer_number: Option<UnitNumber>,
    pub status: ManifestStatus,
    pub pieces: u32,
    /// Pounds.
    pub weight: f64,
    pub suggested_trailer_length: Option<u32>,
    /// Scheduled departure time of day, when the loading dock set one.
    pub target_dispatch_time: Option<NaiveTime>,
    pub linehaul_trip_id: Option<TripId>,
}

impl Manifest {
    /// Create a closed manifest ready for dispatch.
    pub fn new(
        number: impl Into<String>,
        linehaul_name: impl Into<String>,
        origin: TerminalCode,
    ) -> Self {
        Self {
            manifest_number: ManifestNumber::new(number),
            linehaul_name: linehaul_name.into(),
            origin,
            destination: None,
            trailer_number: None,
            status: ManifestStatus::Closed,
            pieces: 0,
            weight: 0.0,
            suggested_trailer_length: None,
            target_dispatch_time: None,
            linehaul_trip_id: None,
        }
    }

    pub fn with_destination(mut self, destination: TerminalCode) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_trailer(mut self, trailer: impl Into<String>) -> Self {
        self.trailer_number = Some(UnitNumber::new(trailer));
        self
    }

    pub fn with_load(mut self, pieces: u32, weight: f64) -> Self {
        self.pieces = pieces;
        self.weight = weight;
        self
    }

    /// True once the manifest has left its origin or been closed out for good.
    pub fn is_dispatched(&self) -> bool {
        matches!(
            self.status,
            ManifestStatus::Dispatched | ManifestStatus::Terminated
        )
    }
}
