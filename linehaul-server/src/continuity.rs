//! Trailer continuity across multi-origin trips.
//!
//! A trip may pick up freight at more than one terminal. Manifests loaded
//! at the trip's first origin are already on hand; every other manifest's
//! trailer must be physically waiting at that manifest's origin.

use std::collections::HashMap;

use crate::domain::{Manifest, ManifestNumber, TerminalCode, UnitNumber};

/// Where trailers were last seen.
pub trait TrailerLocator {
    fn last_known_terminal(&self, trailer: &UnitNumber) -> Option<TerminalCode>;
}

impl TrailerLocator for HashMap<UnitNumber, TerminalCode> {
    fn last_known_terminal(&self, trailer: &UnitNumber) -> Option<TerminalCode> {
        self.get(trailer).copied()
    }
}

/// A manifest whose trailer is not where the trip needs it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "manifest {manifest} departs {expected_origin} but its trailer is {}; \
     the trip starts with manifest {first_manifest}",
    describe_location(.trailer.as_ref(), .found.as_ref())
)]
pub struct ContinuityViolation {
    pub manifest: ManifestNumber,
    pub expected_origin: TerminalCode,
    pub first_manifest: ManifestNumber,
    pub trailer: Option<UnitNumber>,
    /// Last known terminal of the trailer, if known.
    pub found: Option<TerminalCode>,
}

fn describe_location(trailer: Option<&UnitNumber>, found: Option<&TerminalCode>) -> String {
    match (trailer, found) {
        (None, _) => "not assigned".to_string(),
        (Some(unit), Some(at)) => format!("{unit} at {at}"),
        (Some(unit), None) => format!("{unit} at an unknown location"),
    }
}

/// Check that every manifest leaving from somewhere other than the first
/// manifest's origin has its trailer waiting there.
pub fn validate_continuity(
    manifests: &[Manifest],
    locator: &impl TrailerLocator,
) -> Result<(), ContinuityViolation> {
    let Some((first, rest)) = manifests.split_first() else {
        return Ok(());
    };

    for manifest in rest.iter().filter(|m| m.origin != first.origin) {
        let found = manifest
            .trailer_number
            .as_ref()
            .and_then(|unit| locator.last_known_terminal(unit));

        if found != Some(manifest.origin) {
            return Err(ContinuityViolation {
                manifest: manifest.manifest_number.clone(),
                expected_origin: manifest.origin,
                first_manifest: first.manifest_number.clone(),
                trailer: manifest.trailer_number.clone(),
                found,
            });
        }
    }

    Ok(())
}
