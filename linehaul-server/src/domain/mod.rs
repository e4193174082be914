//! Domain types for linehaul dispatch.
//!
//! This module contains the core domain model: terminals, route profiles,
//! manifests, equipment and trips. Identifier types enforce their invariants
//! at construction time, so code that receives them can trust their validity.

mod equipment;
mod manifest;
mod profile;
mod terminal;
mod time;
mod trip;

pub use equipment::{Dolly, Driver, DriverId, Trailer, Truck, UnitNumber};
pub use manifest::{Manifest, ManifestNumber, ManifestStatus, UnknownStatus};
pub use profile::{ProfileId, RouteProfile, RouteRecord};
pub use terminal::{Coordinates, InvalidTerminalCode, Terminal, TerminalCode};
pub use time::{
    TimeError, format_schedule_time, format_timestamp, minutes_of_day, parse_schedule_time,
    parse_timestamp,
};
pub use trip::{Trip, TripId, TripStatus};
