//! Matching free-text route names to profiles and destinations.
//!
//! Both engines are pure functions of a [`Directory`] snapshot and return
//! tagged results; a miss is a value, not an error.

mod destination;
mod profile;
mod route_name;

use crate::directory::Directory;
use crate::domain::TerminalCode;

pub use destination::{DestinationInference, DestinationInferencer, InferenceStrategy};
pub use profile::{MatchRule, ProfileResolution, ProfileResolver};
pub use route_name::{final_terminal, route_family};

/// Resolve a route name to a profile, preferring profiles that leave `origin`.
pub fn resolve_profile<'a>(
    directory: &'a Directory,
    route_name: &str,
    origin: Option<&TerminalCode>,
) -> ProfileResolution<'a> {
    ProfileResolver::new(directory).resolve(route_name, origin)
}

/// Infer the destination of continuing freight on `route_name` at `origin`.
pub fn infer_destination(
    directory: &Directory,
    route_name: &str,
    origin: &TerminalCode,
) -> DestinationInference {
    DestinationInferencer::new(directory).infer(route_name, origin)
}
