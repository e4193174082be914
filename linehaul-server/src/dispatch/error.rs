//! Dispatch error types.

use crate::continuity::ContinuityViolation;
use crate::domain::{DriverId, ManifestNumber, TerminalCode, TripId, TripStatus};

/// Why a dispatch board operation was refused.
///
/// Every variant leaves the board unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No profile matches the manifests' route name.
    #[error("no route profile matches route '{route}'")]
    ResolutionMiss { route: String },

    /// The resolved profile leaves from a different terminal than the first manifest.
    #[error("route '{route}' resolves to a profile from {profile_origin}, not {manifest_origin}")]
    ProfileOriginMismatch {
        route: String,
        profile_origin: TerminalCode,
        manifest_origin: TerminalCode,
    },

    #[error(transparent)]
    Continuity(#[from] ContinuityViolation),

    #[error("trip {trip} cannot move from {from} to {to}")]
    InvalidTransition {
        trip: TripId,
        from: TripStatus,
        to: TripStatus,
    },

    /// The caller acted on an outdated view of the board; safe to retry.
    #[error("stale assignment: {message}")]
    StaleAssignmentConflict { message: String },

    #[error("trip {0} not found")]
    TripNotFound(TripId),

    #[error("manifest {0} not found")]
    ManifestNotFound(ManifestNumber),

    #[error("driver {0} not found")]
    DriverNotFound(DriverId),

    #[error("manifest {0} listed more than once")]
    DuplicateManifest(ManifestNumber),

    #[error("a trip carries at most {max} manifests, got {count}")]
    TooManyManifests { count: usize, max: usize },

    #[error("trip is missing {0}")]
    MissingRequirement(&'static str),
}

impl DispatchError {
    pub(crate) fn stale(message: impl Into<String>) -> Self {
        DispatchError::StaleAssignmentConflict {
            message: message.into(),
        }
    }
}
