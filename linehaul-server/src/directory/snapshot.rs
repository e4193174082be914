//! Disk-based reference data snapshot.
//!
//! The surrounding application exports its reference tables and the
//! manifests awaiting dispatch as one JSON document. Rows that refer to
//! unparseable terminal codes are dropped with a warning rather than
//! failing the whole load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    Dolly, Driver, DriverId, Manifest, ManifestNumber, ManifestStatus, ProfileId, RouteProfile,
    RouteRecord, Terminal, TerminalCode, Trailer, Truck, UnitNumber, parse_schedule_time,
};

use super::Directory;
use super::error::DirectoryError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SnapshotFile {
    pub terminals: Vec<TerminalDto>,
    pub profiles: Vec<ProfileDto>,
    pub routes: Vec<RouteDto>,
    pub trucks: Vec<UnitDto>,
    pub trailers: Vec<TrailerDto>,
    pub dollies: Vec<UnitDto>,
    pub drivers: Vec<DriverDto>,
    pub manifests: Vec<ManifestDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TerminalDto {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProfileDto {
    pub id: u64,
    #[serde(default)]
    pub profile_code: Option<String>,
    pub name: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub transit_time_minutes: Option<i64>,
    #[serde(default)]
    pub standard_departure_time: Option<String>,
    #[serde(default)]
    pub standard_arrival_time: Option<String>,
    #[serde(default)]
    pub headhaul: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RouteDto {
    pub name: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub miles: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UnitDto {
    pub unit_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TrailerDto {
    pub unit_number: String,
    pub length_feet: u32,
    #[serde(default)]
    pub last_known_terminal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DriverDto {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner_operator: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ManifestDto {
    pub manifest_number: String,
    pub linehaul_name: String,
    pub origin: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub trailer_number: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub pieces: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub suggested_trailer_length: Option<u32>,
    #[serde(default)]
    pub target_dispatch_time: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_status() -> String {
    ManifestStatus::Closed.as_str().to_string()
}

/// Reference data plus the manifests waiting at terminals.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub directory: Directory,
    pub manifests: Vec<Manifest>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| DirectoryError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let snapshot = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            terminals = snapshot.directory.terminal_count(),
            profiles = snapshot.directory.profiles().len(),
            routes = snapshot.directory.routes().len(),
            manifests = snapshot.manifests.len(),
            "loaded reference snapshot"
        );
        Ok(snapshot)
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let file: SnapshotFile = serde_json::from_str(json).map_err(|e| DirectoryError::Json {
            message: e.to_string(),
        })?;
        Ok(build_snapshot(file))
    }
}

/// Parse a code, logging and discarding it if invalid.
fn code_or_warn(raw: &str, context: &str) -> Option<TerminalCode> {
    match TerminalCode::parse_normalized(raw) {
        Ok(code) => Some(code),
        Err(e) => {
            warn!(code = raw, context, error = %e, "dropping row with invalid terminal code");
            None
        }
    }
}

fn time_or_warn(raw: Option<&str>, context: &str) -> Option<chrono::NaiveTime> {
    let raw = raw?;
    match parse_schedule_time(raw) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(time = raw, context, error = %e, "ignoring unparseable schedule time");
            None
        }
    }
}

fn transit_or_warn(minutes: Option<i64>, context: &str) -> Option<i64> {
    let minutes = minutes?;
    if minutes < 0 {
        warn!(minutes, context, "ignoring negative transit time");
        return None;
    }
    Some(minutes)
}

fn build_snapshot(file: SnapshotFile) -> Snapshot {
    let mut directory = Directory::new();

    for t in file.terminals {
        let Some(code) = code_or_warn(&t.code, "terminal") else {
            continue;
        };
        let coordinates = match (t.latitude, t.longitude) {
            (Some(lat), Some(lon)) => Some(crate::domain::Coordinates::new(lat, lon)),
            _ => None,
        };
        directory.add_terminal(Terminal {
            code,
            name: t.name,
            coordinates,
        });
    }

    for p in file.profiles {
        let context = format!("profile {}", p.id);
        let (Some(origin), Some(destination)) = (
            code_or_warn(&p.origin, &context),
            code_or_warn(&p.destination, &context),
        ) else {
            continue;
        };
        directory.add_profile(RouteProfile {
            id: ProfileId(p.id),
            profile_code: p.profile_code.filter(|c| !c.trim().is_empty()),
            name: p.name,
            origin,
            destination,
            distance_miles: p.distance_miles,
            transit_time_minutes: transit_or_warn(p.transit_time_minutes, &context),
            standard_departure_time: time_or_warn(p.standard_departure_time.as_deref(), &context),
            standard_arrival_time: time_or_warn(p.standard_arrival_time.as_deref(), &context),
            headhaul: p.headhaul,
            active: p.active,
        });
    }

    for r in file.routes {
        let context = format!("route {}", r.name);
        let (Some(origin), Some(destination)) = (
            code_or_warn(&r.origin, &context),
            code_or_warn(&r.destination, &context),
        ) else {
            continue;
        };
        directory.add_route(RouteRecord {
            departure_time: time_or_warn(r.departure_time.as_deref(), &context),
            arrival_time: time_or_warn(r.arrival_time.as_deref(), &context),
            name: r.name,
            origin,
            destination,
            miles: r.miles,
            active: r.active,
        });
    }

    for t in file.trucks {
        directory.add_truck(Truck {
            unit_number: UnitNumber::new(t.unit_number),
        });
    }

    for t in file.trailers {
        let last_known_terminal = t
            .last_known_terminal
            .as_deref()
            .and_then(|c| code_or_warn(c, "trailer location"));
        directory.add_trailer(Trailer {
            unit_number: UnitNumber::new(t.unit_number),
            length_feet: t.length_feet,
            last_known_terminal,
        });
    }

    for d in file.dollies {
        directory.add_dolly(Dolly {
            unit_number: UnitNumber::new(d.unit_number),
        });
    }

    for d in file.drivers {
        directory.add_driver(Driver {
            id: DriverId(d.id),
            name: d.name,
            owner_operator: d.owner_operator,
        });
    }

    let manifests = file
        .manifests
        .into_iter()
        .filter_map(build_manifest)
        .collect();

    Snapshot {
        directory,
        manifests,
    }
}

fn build_manifest(m: ManifestDto) -> Option<Manifest> {
    let context = format!("manifest {}", m.manifest_number);
    let origin = code_or_warn(&m.origin, &context)?;
    let destination = match m.destination.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(code_or_warn(raw, &context)?),
    };
    let status = match m.status.parse::<ManifestStatus>() {
        Ok(s) => s,
        Err(e) => {
            warn!(context = %context, error = %e, "dropping manifest with unknown status");
            return None;
        }
    };
    Some(Manifest {
        manifest_number: ManifestNumber::new(m.manifest_number),
        linehaul_name: m.linehaul_name,
        origin,
        destination,
        trailer_number: m.trailer_number.map(UnitNumber::new),
        status,
        pieces: m.pieces,
        weight: m.weight,
        suggested_trailer_length: m.suggested_trailer_length,
        target_dispatch_time: time_or_warn(m.target_dispatch_time.as_deref(), &context),
        linehaul_trip_id: None,
    })
}
