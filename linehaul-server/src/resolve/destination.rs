//! Destination inference for continuing freight.
//!
//! A manifest that arrives at an intermediate terminal often has no final
//! destination recorded. The route name usually encodes the whole lane
//! (`FARBISBIL1` runs FAR, BIS, BIL), so the destination can be recovered
//! from the name, the profiles, and the route table. Strategies run from
//! most to least trustworthy; none of them ever answers with the origin.

use std::fmt;

use tracing::{debug, trace};

use crate::directory::Directory;
use crate::domain::{RouteProfile, TerminalCode};

use super::route_name::{final_terminal, mentions, normalize, route_family};

/// The strategy that produced an inferred destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InferenceStrategy {
    /// Route record with the same name and origin.
    RouteRecord,
    /// Profile from the origin matching the route family.
    RouteFamily,
    /// Profile whose name starts with the route family.
    RelaxedFamily,
    /// Earliest destination code named after the origin in the route name.
    Positional,
    /// Any route record sharing the name.
    RouteRecordFallback,
    /// Last terminal code in the route family.
    FinalTerminal,
}

impl InferenceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceStrategy::RouteRecord => "route_record",
            InferenceStrategy::RouteFamily => "route_family",
            InferenceStrategy::RelaxedFamily => "relaxed_family",
            InferenceStrategy::Positional => "positional",
            InferenceStrategy::RouteRecordFallback => "route_record_fallback",
            InferenceStrategy::FinalTerminal => "final_terminal",
        }
    }
}

impl fmt::Display for InferenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of destination inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationInference {
    Inferred {
        terminal: TerminalCode,
        strategy: InferenceStrategy,
    },
    Unknown,
}

impl DestinationInference {
    pub fn terminal(&self) -> Option<TerminalCode> {
        match self {
            DestinationInference::Inferred { terminal, .. } => Some(*terminal),
            DestinationInference::Unknown => None,
        }
    }
}

/// Infers destinations against a directory snapshot.
pub struct DestinationInferencer<'a> {
    directory: &'a Directory,
}

impl<'a> DestinationInferencer<'a> {
    pub fn new(directory: &'a Directory) -> Self {
        Self { directory }
    }

    /// Infer where freight on `route_name`, currently at `origin`, is headed.
    pub fn infer(&self, route_name: &str, origin: &TerminalCode) -> DestinationInference {
        let raw = route_name.trim();
        if raw.is_empty() {
            return DestinationInference::Unknown;
        }
        let name = normalize(raw);
        let family = route_family(&name);
        let family = family.as_str();

        let attempts: [(InferenceStrategy, &dyn Fn() -> Option<TerminalCode>); 6] = [
            (InferenceStrategy::RouteRecord, &|| {
                self.directory
                    .routes_named(raw)
                    .find(|r| &r.origin == origin)
                    .map(|r| r.destination)
            }),
            (InferenceStrategy::RouteFamily, &|| {
                self.directory
                    .profiles_from(origin)
                    .filter(|p| route_family(&p.name) == family)
                    .find(|p| family_match(p, &name, family))
                    .map(|p| p.destination)
            }),
            (InferenceStrategy::RelaxedFamily, &|| {
                self.directory
                    .profiles_from(origin)
                    .filter(|p| !family.is_empty() && normalize(&p.name).starts_with(family))
                    .find(|p| family_match(p, &name, family))
                    .map(|p| p.destination)
            }),
            (InferenceStrategy::Positional, &|| {
                self.positional(&name, origin)
            }),
            (InferenceStrategy::RouteRecordFallback, &|| {
                self.record_fallback(raw, family)
            }),
            (InferenceStrategy::FinalTerminal, &|| final_terminal(family)),
        ];

        for (strategy, attempt) in attempts {
            match attempt() {
                Some(terminal) if &terminal != origin => {
                    trace!(
                        route = raw,
                        origin = %origin,
                        destination = %terminal,
                        strategy = %strategy,
                        "destination inferred"
                    );
                    return DestinationInference::Inferred { terminal, strategy };
                }
                Some(_) => {
                    debug!(route = raw, strategy = %strategy, "strategy answered with the origin")
                }
                None => {}
            }
        }

        debug!(route = raw, origin = %origin, "destination unknown");
        DestinationInference::Unknown
    }

    /// Destination codes that appear after the origin in the route name.
    fn positional(&self, name: &str, origin: &TerminalCode) -> Option<TerminalCode> {
        let start = name.find(origin.as_str())? + origin.as_str().len();
        let tail = &name[start..];

        self.directory
            .profiles()
            .iter()
            .filter(|p| p.destination != *origin && !p.is_self_loop())
            .filter_map(|p| tail.find(p.destination.as_str()).map(|at| (at, p.destination)))
            .min_by_key(|(at, _)| *at)
            .map(|(_, code)| code)
    }

    fn record_fallback(&self, raw: &str, family: &str) -> Option<TerminalCode> {
        let last = final_terminal(family);
        let mut records = self.directory.routes_named(raw).peekable();
        let first = records.peek()?.destination;
        Some(
            records
                .find(|r| Some(r.destination) == last)
                .map_or(first, |r| r.destination),
        )
    }
}

fn family_match(profile: &RouteProfile, name: &str, family: &str) -> bool {
    !profile.is_self_loop()
        && (mentions(name, &profile.destination)
            || final_terminal(family) == Some(profile.destination))
}
