//! Route profiles and historical route records.

use std::fmt;

use chrono::NaiveTime;

use super::TerminalCode;

/// Identifier of a route profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled linehaul lane maintained by route planners.
///
/// Several profiles may share a `name` when a route has more than one leg;
/// the origin terminal tells the legs apart.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProfile {
    pub id: ProfileId,
    /// Canonical short name, unique when present.
    pub profile_code: Option<String>,
    /// Free-text route label shared with manifests.
    pub name: String,
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    pub distance_miles: Option<f64>,
    pub transit_time_minutes: Option<i64>,
    pub standard_departure_time: Option<NaiveTime>,
    pub standard_arrival_time: Option<NaiveTime>,
    pub headhaul: bool,
    pub active: bool,
}

impl RouteProfile {
    /// Create an active profile with no stored timing.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        origin: TerminalCode,
        destination: TerminalCode,
    ) -> Self {
        Self {
            id: ProfileId(id),
            profile_code: None,
            name: name.into(),
            origin,
            destination,
            distance_miles: None,
            transit_time_minutes: None,
            standard_departure_time: None,
            standard_arrival_time: None,
            headhaul: false,
            active: true,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.profile_code = Some(code.into());
        self
    }

    pub fn with_distance(mut self, miles: f64, transit_minutes: Option<i64>) -> Self {
        self.distance_miles = Some(miles);
        self.transit_time_minutes = transit_minutes;
        self
    }

    /// True when this profile's origin and destination are the same terminal.
    pub fn is_self_loop(&self) -> bool {
        self.origin == self.destination
    }
}

/// A row from the historical route table.
///
/// Looser than a profile and only consulted once profile matching fails.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub name: String,
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    pub miles: Option<f64>,
    pub active: bool,
    pub departure_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveTime>,
}

impl RouteRecord {
    pub fn new(name: impl Into<String>, origin: TerminalCode, destination: TerminalCode) -> Self {
        Self {
            name: name.into(),
            origin,
            destination,
            miles: None,
            active: true,
            departure_time: None,
            arrival_time: None,
        }
    }
}
