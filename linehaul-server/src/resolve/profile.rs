//! Route profile resolution.
//!
//! Manifests carry a free-text route name written by an upstream system.
//! The same name can cover several legs of one lane, so the manifest's
//! current origin is needed to pick the right profile. Resolution walks an
//! ordered list of rules from strict to loose and stops at the first hit;
//! at every precision tier the origin-verified form is tried before the
//! relaxed one.

use std::fmt;

use tracing::{debug, trace};

use crate::directory::Directory;
use crate::domain::{RouteProfile, TerminalCode};

use super::route_name::{mentions, normalize};

/// The rule that produced a profile match, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRule {
    /// Route name equals the profile code.
    ProfileCode,
    /// Route name equals the profile name and the origins agree.
    NameWithOrigin,
    /// Route name equals the profile name.
    Name,
    /// Case-insensitive code or name match, origins agree.
    LooseWithOrigin,
    /// Case-insensitive code or name match.
    Loose,
    /// Same origin, destination code appears in the route name.
    OriginAndDestinationInName,
    /// Route name starts with the origin code and mentions the destination.
    CodesInName,
    /// Matched through the historical route table.
    RouteRecord,
}

impl MatchRule {
    /// Evaluation order of the waterfall.
    pub const ORDER: [MatchRule; 8] = [
        MatchRule::ProfileCode,
        MatchRule::NameWithOrigin,
        MatchRule::Name,
        MatchRule::LooseWithOrigin,
        MatchRule::Loose,
        MatchRule::OriginAndDestinationInName,
        MatchRule::CodesInName,
        MatchRule::RouteRecord,
    ];

    /// Whether this rule can only run when an origin is known.
    pub fn needs_origin(self) -> bool {
        matches!(
            self,
            MatchRule::NameWithOrigin
                | MatchRule::LooseWithOrigin
                | MatchRule::OriginAndDestinationInName
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchRule::ProfileCode => "profile_code",
            MatchRule::NameWithOrigin => "name_with_origin",
            MatchRule::Name => "name",
            MatchRule::LooseWithOrigin => "loose_with_origin",
            MatchRule::Loose => "loose",
            MatchRule::OriginAndDestinationInName => "origin_and_destination_in_name",
            MatchRule::CodesInName => "codes_in_name",
            MatchRule::RouteRecord => "route_record",
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving a route name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileResolution<'a> {
    Found {
        profile: &'a RouteProfile,
        rule: MatchRule,
    },
    NotFound,
}

impl<'a> ProfileResolution<'a> {
    /// The matched profile, if any.
    pub fn profile(&self) -> Option<&'a RouteProfile> {
        match self {
            ProfileResolution::Found { profile, .. } => Some(profile),
            ProfileResolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ProfileResolution::Found { .. })
    }
}

/// Resolves route names against a directory snapshot.
pub struct ProfileResolver<'a> {
    directory: &'a Directory,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(directory: &'a Directory) -> Self {
        Self { directory }
    }

    /// Resolve `route_name`, optionally as seen from `origin`.
    pub fn resolve(
        &self,
        route_name: &str,
        origin: Option<&TerminalCode>,
    ) -> ProfileResolution<'a> {
        let trimmed = route_name.trim();
        if trimmed.is_empty() {
            return ProfileResolution::NotFound;
        }
        let query = Query {
            raw: trimmed,
            normalized: normalize(trimmed),
            origin,
        };

        for rule in MatchRule::ORDER {
            if rule.needs_origin() && origin.is_none() {
                continue;
            }
            if let Some(profile) = self.apply(rule, &query) {
                trace!(
                    route = trimmed,
                    origin = ?origin.map(|o| o.as_str()),
                    rule = %rule,
                    profile = %profile.id,
                    "route profile resolved"
                );
                return ProfileResolution::Found { profile, rule };
            }
        }

        debug!(
            route = trimmed,
            origin = ?origin.map(|o| o.as_str()),
            "no route profile matched"
        );
        ProfileResolution::NotFound
    }

    fn apply(&self, rule: MatchRule, q: &Query<'_>) -> Option<&'a RouteProfile> {
        let profiles = self.directory.profiles();
        let from_origin = |p: &RouteProfile| q.origin.is_some_and(|o| &p.origin == o);
        let loose = |p: &RouteProfile| {
            p.name.trim().eq_ignore_ascii_case(q.raw)
                || p
                    .profile_code
                    .as_deref()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case(q.raw))
        };

        match rule {
            MatchRule::ProfileCode => profiles
                .iter()
                .find(|p| p.profile_code.as_deref() == Some(q.raw)),
            MatchRule::NameWithOrigin => profiles
                .iter()
                .find(|&p| p.name == q.raw && from_origin(p)),
            MatchRule::Name => profiles.iter().find(|p| p.name == q.raw),
            MatchRule::LooseWithOrigin => profiles.iter().find(|&p| loose(p) && from_origin(p)),
            MatchRule::Loose => profiles.iter().find(|&p| loose(p)),
            MatchRule::OriginAndDestinationInName => profiles
                .iter()
                .find(|&p| from_origin(p) && mentions(&q.normalized, &p.destination)),
            MatchRule::CodesInName => profiles.iter().find(|p| {
                q.normalized.starts_with(p.origin.as_str())
                    && mentions(&q.normalized, &p.destination)
            }),
            MatchRule::RouteRecord => self.via_route_record(q),
        }
    }

    /// Find the route record for this name and the profile serving the same lane.
    fn via_route_record(&self, q: &Query<'_>) -> Option<&'a RouteProfile> {
        let mut records = self.directory.routes_named(q.raw).peekable();
        let first = *records.peek()?;
        let record = match q.origin {
            Some(origin) => records.find(|r| &r.origin == origin).unwrap_or(first),
            None => first,
        };

        self.directory
            .profiles()
            .iter()
            .find(|p| p.origin == record.origin && p.destination == record.destination)
    }
}

struct Query<'q> {
    raw: &'q str,
    normalized: String,
    origin: Option<&'q TerminalCode>,
}
