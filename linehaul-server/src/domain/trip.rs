//! Trips: the unit of dispatch.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use super::{DriverId, ManifestNumber, ProfileId, TerminalCode, UnitNumber, UnknownStatus};

/// Identifier of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripId(pub u64);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripStatus {
    Planned,
    Assigned,
    Dispatched,
    InTransit,
    Arrived,
    Unloading,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [TripStatus; 8] = [
        TripStatus::Planned,
        TripStatus::Assigned,
        TripStatus::Dispatched,
        TripStatus::InTransit,
        TripStatus::Arrived,
        TripStatus::Unloading,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    /// States reachable in one step from `self`.
    ///
    /// Forward skips are allowed, but a trip can never pass DISPATCHED or
    /// ARRIVED without stopping there, since both stamp timestamps and run
    /// preconditions.
    pub fn allowed_transitions(self) -> &'static [TripStatus] {
        use TripStatus::*;
        match self {
            Planned => &[Assigned, Dispatched, Cancelled],
            Assigned => &[Dispatched, Cancelled],
            Dispatched => &[InTransit, Arrived, Cancelled],
            InTransit => &[Arrived, Cancelled],
            Arrived => &[Unloading, Completed, Cancelled],
            Unloading => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: TripStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Completed and cancelled trips accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// True once the trip has left its origin and until it is closed out.
    pub fn is_underway(self) -> bool {
        matches!(
            self,
            TripStatus::Dispatched
                | TripStatus::InTransit
                | TripStatus::Arrived
                | TripStatus::Unloading
        )
    }

    /// Position in the forward lifecycle. Cancelled sits outside it.
    pub fn rank(self) -> Option<u8> {
        match self {
            TripStatus::Planned => Some(0),
            TripStatus::Assigned => Some(1),
            TripStatus::Dispatched => Some(2),
            TripStatus::InTransit => Some(3),
            TripStatus::Arrived => Some(4),
            TripStatus::Unloading => Some(5),
            TripStatus::Completed => Some(6),
            TripStatus::Cancelled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "PLANNED",
            TripStatus::Assigned => "ASSIGNED",
            TripStatus::Dispatched => "DISPATCHED",
            TripStatus::InTransit => "IN_TRANSIT",
            TripStatus::Arrived => "ARRIVED",
            TripStatus::Unloading => "UNLOADING",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        TripStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A linehaul trip.
///
/// Manifests, equipment and the driver are held by reference (number or id),
/// never owned; the dispatch board resolves them.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub trip_number: String,
    pub status: TripStatus,
    pub profile_id: Option<ProfileId>,
    pub manifests: Vec<ManifestNumber>,
    pub driver: Option<DriverId>,
    pub truck: Option<UnitNumber>,
    pub trailers: Vec<UnitNumber>,
    pub dollies: Vec<UnitNumber>,
    pub owner_operator: bool,
    pub dispatch_date: NaiveDate,
    pub planned_departure: Option<NaiveDateTime>,
    pub actual_departure: Option<NaiveDateTime>,
    pub planned_arrival: Option<NaiveDateTime>,
    pub actual_arrival: Option<NaiveDateTime>,
    /// Destination resolved from the profile or inferred from the route name.
    pub destination: Option<TerminalCode>,
    /// Alternate destination chosen by the dispatcher.
    pub destination_override: Option<TerminalCode>,
    pub calculated_miles: Option<f64>,
    pub actual_mileage: Option<u32>,
    pub notes: String,
    /// Bumped on every mutation; used for optimistic concurrency checks.
    pub version: u64,
}

impl Trip {
    pub fn new(id: TripId, trip_number: impl Into<String>, dispatch_date: NaiveDate) -> Self {
        Self {
            id,
            trip_number: trip_number.into(),
            status: TripStatus::Planned,
            profile_id: None,
            manifests: Vec::new(),
            driver: None,
            truck: None,
            trailers: Vec::new(),
            dollies: Vec::new(),
            owner_operator: false,
            dispatch_date,
            planned_departure: None,
            actual_departure: None,
            planned_arrival: None,
            actual_arrival: None,
            destination: None,
            destination_override: None,
            calculated_miles: None,
            actual_mileage: None,
            notes: String::new(),
            version: 0,
        }
    }

    /// The destination the trip is actually heading to.
    pub fn effective_destination(&self) -> Option<TerminalCode> {
        self.destination_override.or(self.destination)
    }

    /// A trip holds its manifests and equipment until it reaches a terminal state.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}
