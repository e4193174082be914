//! Trip planning, dispatch and the trip lifecycle.
//!
//! The [`DispatchBoard`] owns the mutable side of the system: trips, the
//! manifests waiting to move, and where trailers were last seen. Every
//! mutation runs under one write lock, so a dispatch's checks and its
//! effects are a single atomic step.

mod board;
mod error;
mod lateness;

#[cfg(test)]
mod board_tests;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{
    DriverId, ManifestNumber, ManifestStatus, TerminalCode, TripId, TripStatus, UnitNumber,
};

pub use board::DispatchBoard;
pub use error::DispatchError;
pub use lateness::{LateDeparture, LateReason, late_departure, minutes_late, scheduled_departure};

/// Most manifests one trip may carry.
pub const MAX_MANIFESTS_PER_TRIP: usize = 3;

/// What a dispatcher submits to plan or dispatch a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDraft {
    /// Generated from the date and trip id when absent.
    pub trip_number: Option<String>,
    pub dispatch_date: NaiveDate,
    pub manifests: Vec<ManifestNumber>,
    pub driver: Option<DriverId>,
    pub truck: Option<UnitNumber>,
    /// Taken from the manifests when empty.
    pub trailers: Vec<UnitNumber>,
    pub dollies: Vec<UnitNumber>,
    pub owner_operator: bool,
    pub destination_override: Option<TerminalCode>,
    pub notes: String,
}

impl TripDraft {
    pub fn new<S: Into<String>>(
        dispatch_date: NaiveDate,
        manifests: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            trip_number: None,
            dispatch_date,
            manifests: manifests.into_iter().map(ManifestNumber::new).collect(),
            driver: None,
            truck: None,
            trailers: Vec::new(),
            dollies: Vec::new(),
            owner_operator: false,
            destination_override: None,
            notes: String::new(),
        }
    }

    pub fn with_driver(mut self, driver: DriverId) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_truck(mut self, truck: impl Into<String>) -> Self {
        self.truck = Some(UnitNumber::new(truck));
        self
    }

    pub fn with_trailers<S: Into<String>>(mut self, trailers: impl IntoIterator<Item = S>) -> Self {
        self.trailers = trailers.into_iter().map(UnitNumber::new).collect();
        self
    }

    pub fn with_owner_operator(mut self) -> Self {
        self.owner_operator = true;
        self
    }

    pub fn with_destination_override(mut self, destination: TerminalCode) -> Self {
        self.destination_override = Some(destination);
        self
    }
}

/// Driver and equipment for a planned trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub driver: DriverId,
    pub truck: Option<UnitNumber>,
    /// Leaves the trip's trailers unchanged when empty.
    pub trailers: Vec<UnitNumber>,
    pub dollies: Vec<UnitNumber>,
    pub owner_operator: bool,
}

impl Assignment {
    pub fn new(driver: DriverId) -> Self {
        Self {
            driver,
            truck: None,
            trailers: Vec::new(),
            dollies: Vec::new(),
            owner_operator: false,
        }
    }

    pub fn with_truck(mut self, truck: impl Into<String>) -> Self {
        self.truck = Some(UnitNumber::new(truck));
        self
    }

    pub fn with_trailers<S: Into<String>>(mut self, trailers: impl IntoIterator<Item = S>) -> Self {
        self.trailers = trailers.into_iter().map(UnitNumber::new).collect();
        self
    }
}

/// Times to stamp on a status change.
///
/// `recorded_at` stands in for any actual time not given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimestamps {
    pub recorded_at: NaiveDateTime,
    pub actual_departure: Option<NaiveDateTime>,
    pub actual_arrival: Option<NaiveDateTime>,
}

impl TransitionTimestamps {
    pub fn new(recorded_at: NaiveDateTime) -> Self {
        Self {
            recorded_at,
            actual_departure: None,
            actual_arrival: None,
        }
    }

    pub fn departure(&self) -> NaiveDateTime {
        self.actual_departure.unwrap_or(self.recorded_at)
    }

    pub fn arrival(&self) -> NaiveDateTime {
        self.actual_arrival.unwrap_or(self.recorded_at)
    }
}

/// Manifest query. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestFilter {
    pub status: Option<ManifestStatus>,
    pub origin: Option<TerminalCode>,
    pub trip: Option<TripId>,
    /// Only manifests not linked to any trip.
    pub unassigned: bool,
}

/// Trip query. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripFilter {
    pub status: Option<TripStatus>,
    pub dispatch_date: Option<NaiveDate>,
}

impl TripFilter {
    pub fn matches(&self, trip: &crate::domain::Trip) -> bool {
        self.status.is_none_or(|s| trip.status == s)
            && self.dispatch_date.is_none_or(|d| trip.dispatch_date == d)
    }
}
