//! The dispatch board.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDateTime, NaiveTime};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::continuity::{TrailerLocator, validate_continuity};
use crate::directory::{Directory, DirectoryError, SharedDirectory};
use crate::domain::{
    Manifest, ManifestNumber, ManifestStatus, RouteProfile, TerminalCode, Trip, TripId,
    TripStatus, UnitNumber,
};
use crate::eta::{DistanceEta, calculate_distance_eta};
use crate::load_factor;
use crate::resolve::{ProfileResolution, infer_destination, resolve_profile};

use super::error::DispatchError;
use super::lateness::{LateDeparture, LateReason, late_departure};
use super::{
    Assignment, MAX_MANIFESTS_PER_TRIP, ManifestFilter, TransitionTimestamps, TripDraft,
    TripFilter,
};

#[derive(Debug, Default)]
struct BoardState {
    trips: BTreeMap<TripId, Trip>,
    manifests: BTreeMap<ManifestNumber, Manifest>,
    /// Trailer arrivals recorded since the reference data was exported.
    arrivals: HashMap<UnitNumber, TerminalCode>,
    late_reasons: HashMap<TripId, LateReason>,
    last_trip_id: u64,
}

/// Trailer whereabouts as the board knows them: recorded arrivals first,
/// then the reference data.
struct BoardLocator<'a> {
    arrivals: &'a HashMap<UnitNumber, TerminalCode>,
    directory: &'a Directory,
}

impl TrailerLocator for BoardLocator<'_> {
    fn last_known_terminal(&self, trailer: &UnitNumber) -> Option<TerminalCode> {
        self.arrivals.get(trailer).copied().or_else(|| {
            self.directory
                .trailer(trailer)
                .and_then(|t| t.last_known_terminal)
        })
    }
}

/// Profile and destination chosen for a trip's manifests.
struct RoutePlan {
    profile: RouteProfile,
    /// Destination before any dispatcher override.
    destination: TerminalCode,
}

impl RoutePlan {
    fn planned_departure(&self, trip: &Trip) -> Option<NaiveDateTime> {
        self.profile
            .standard_departure_time
            .map(|t: NaiveTime| trip.dispatch_date.and_time(t))
    }
}

/// Everything a dispatch needs, gathered before anything is changed.
struct DispatchPlan {
    manifests: Vec<ManifestNumber>,
    route: RoutePlan,
    estimate: DistanceEta,
}

/// Trips, manifests and trailer locations behind one lock.
pub struct DispatchBoard {
    directory: SharedDirectory,
    state: RwLock<BoardState>,
}

impl DispatchBoard {
    /// Create a board over `directory` holding `manifests`.
    pub fn new(directory: SharedDirectory, manifests: impl IntoIterator<Item = Manifest>) -> Self {
        let manifests = manifests
            .into_iter()
            .map(|m| (m.manifest_number.clone(), m))
            .collect();
        Self {
            directory,
            state: RwLock::new(BoardState {
                manifests,
                ..BoardState::default()
            }),
        }
    }

    pub fn directory(&self) -> &SharedDirectory {
        &self.directory
    }

    /// Add manifests not already on the board. Known manifests keep their
    /// board state. Returns the number added.
    pub async fn merge_manifests(&self, manifests: impl IntoIterator<Item = Manifest>) -> usize {
        let mut state = self.state.write().await;
        let mut added = 0;
        for manifest in manifests {
            if !state.manifests.contains_key(&manifest.manifest_number) {
                state
                    .manifests
                    .insert(manifest.manifest_number.clone(), manifest);
                added += 1;
            }
        }
        added
    }

    /// Reload reference data and pick up new manifests from the backing file.
    pub async fn refresh(&self) -> Result<usize, DirectoryError> {
        match self.directory.reload().await? {
            Some(manifests) => Ok(self.merge_manifests(manifests).await),
            None => Ok(0),
        }
    }

    /// Create a PLANNED trip holding up to three manifests.
    ///
    /// The profile and destination are filled in when the route resolves;
    /// a miss is not an error until dispatch.
    pub async fn plan_trip(&self, draft: TripDraft) -> Result<Trip, DispatchError> {
        let directory = self.directory.snapshot().await;
        let mut state = self.state.write().await;

        let trip = state
            .draft_trip(&directory, draft)
            .inspect_err(|e| warn!(error = %e, "trip plan rejected"))?;
        let manifests = state.manifests_of(&trip);

        let mut trip = trip;
        match plan_route(&directory, &manifests) {
            Ok(route) => {
                let departure = route.planned_departure(&trip);
                let effective = trip.destination_override.unwrap_or(route.destination);
                let estimate_from =
                    departure.unwrap_or_else(|| trip.dispatch_date.and_time(NaiveTime::default()));
                if let DistanceEta::Known(estimate) =
                    calculate_distance_eta(&route.profile, &effective, &directory, estimate_from)
                {
                    trip.calculated_miles = Some(estimate.miles);
                    trip.planned_arrival = departure.map(|_| estimate.eta);
                }
                trip.profile_id = Some(route.profile.id);
                trip.destination = Some(route.destination);
                trip.planned_departure = departure;
            }
            Err(e) => debug!(trip = %trip.id, error = %e, "planned trip has no route yet"),
        }

        state.link_manifests(&trip);
        state.commit_new_trip(trip.clone());
        info!(
            trip = %trip.id,
            number = %trip.trip_number,
            manifests = trip.manifests.len(),
            "trip planned"
        );
        Ok(trip)
    }

    /// Record a driver and equipment, moving PLANNED to ASSIGNED.
    pub async fn assign_trip(
        &self,
        id: TripId,
        assignment: Assignment,
        expected_version: Option<u64>,
    ) -> Result<Trip, DispatchError> {
        let directory = self.directory.snapshot().await;
        let mut state = self.state.write().await;

        let mut trip = state.trip_for_update(id, expected_version)?;
        if !matches!(trip.status, TripStatus::Planned | TripStatus::Assigned) {
            return Err(DispatchError::InvalidTransition {
                trip: id,
                from: trip.status,
                to: TripStatus::Assigned,
            });
        }
        let driver = directory
            .driver(assignment.driver)
            .ok_or(DispatchError::DriverNotFound(assignment.driver))?;
        if !assignment.trailers.is_empty() {
            state.check_trailers_free(&assignment.trailers, Some(id))?;
            trip.trailers = assignment.trailers;
        }

        trip.driver = Some(driver.id);
        trip.owner_operator = assignment.owner_operator || driver.owner_operator;
        trip.truck = assignment.truck;
        trip.dollies = assignment.dollies;
        let from = trip.status;
        trip.status = TripStatus::Assigned;
        trip.version += 1;

        info!(trip = %id, driver = %driver.id, from = %from, "trip assigned");
        state.trips.insert(id, trip.clone());
        Ok(trip)
    }

    /// Create and dispatch a trip in one step.
    pub async fn dispatch_trip(
        &self,
        draft: TripDraft,
        now: NaiveDateTime,
    ) -> Result<Trip, DispatchError> {
        let directory = self.directory.snapshot().await;
        let mut state = self.state.write().await;

        let result = state.draft_trip(&directory, draft).and_then(|mut trip| {
            let plan = state.prepare_dispatch(&directory, &trip, now)?;
            state.commit_dispatch(&mut trip, plan, now);
            state.commit_new_trip(trip.clone());
            Ok(trip)
        });

        match &result {
            Ok(trip) => info!(
                trip = %trip.id,
                number = %trip.trip_number,
                destination = ?trip.effective_destination().map(|d| d.to_string()),
                "trip dispatched"
            ),
            Err(e) => warn!(error = %e, "dispatch rejected"),
        }
        result
    }

    /// Move a trip to `next`, running that state's preconditions and effects.
    ///
    /// Refused transitions leave the trip untouched.
    pub async fn advance_trip_status(
        &self,
        id: TripId,
        next: TripStatus,
        timestamps: TransitionTimestamps,
        expected_version: Option<u64>,
    ) -> Result<Trip, DispatchError> {
        let directory = self.directory.snapshot().await;
        let mut state = self.state.write().await;

        let mut trip = state.trip_for_update(id, expected_version)?;
        let from = trip.status;
        if !from.can_transition_to(next) {
            warn!(trip = %id, from = %from, to = %next, "invalid status transition");
            return Err(DispatchError::InvalidTransition {
                trip: id,
                from,
                to: next,
            });
        }

        match next {
            TripStatus::Dispatched => {
                let departed = timestamps.departure();
                let plan = state
                    .prepare_dispatch(&directory, &trip, departed)
                    .inspect_err(|e| warn!(trip = %id, error = %e, "dispatch rejected"))?;
                state.commit_dispatch(&mut trip, plan, departed);
            }
            TripStatus::Assigned if trip.driver.is_none() => {
                return Err(DispatchError::MissingRequirement("a driver"));
            }
            TripStatus::Arrived => {
                trip.actual_arrival = Some(timestamps.arrival());
                if let Some(destination) = trip.effective_destination() {
                    for trailer in &trip.trailers {
                        state.arrivals.insert(trailer.clone(), destination);
                    }
                }
            }
            TripStatus::Cancelled => state.release_manifests(id),
            _ => {}
        }

        trip.status = next;
        trip.version += 1;
        info!(trip = %id, from = %from, to = %next, version = trip.version, "trip status changed");
        state.trips.insert(id, trip.clone());
        Ok(trip)
    }

    /// Attach a dispatcher's explanation to a trip.
    pub async fn record_late_reason(
        &self,
        id: TripId,
        reason: LateReason,
    ) -> Result<(), DispatchError> {
        let mut state = self.state.write().await;
        if !state.trips.contains_key(&id) {
            return Err(DispatchError::TripNotFound(id));
        }
        info!(trip = %id, code = %reason.code, "late reason recorded");
        state.late_reasons.insert(id, reason);
        Ok(())
    }

    pub async fn late_reason(&self, id: TripId) -> Option<LateReason> {
        self.state.read().await.late_reasons.get(&id).cloned()
    }

    /// Departed trips that left late and still lack a late reason.
    pub async fn late_trips_without_reason(&self) -> Vec<LateDeparture> {
        let directory = self.directory.snapshot().await;
        let state = self.state.read().await;

        state
            .trips
            .values()
            .filter(|t| t.status != TripStatus::Cancelled)
            .filter(|t| !state.late_reasons.contains_key(&t.id))
            .filter_map(|t| {
                let manifests = state.manifests_of(t);
                let profile = t.profile_id.and_then(|id| directory.profile(id));
                late_departure(t, &manifests, profile)
            })
            .collect()
    }

    /// Lateness of one trip, derived from its current schedule.
    pub async fn lateness(&self, id: TripId) -> Result<Option<LateDeparture>, DispatchError> {
        let directory = self.directory.snapshot().await;
        let state = self.state.read().await;
        let trip = state.trips.get(&id).ok_or(DispatchError::TripNotFound(id))?;
        let profile = trip.profile_id.and_then(|p| directory.profile(p));
        Ok(late_departure(trip, &state.manifests_of(trip), profile))
    }

    pub async fn trip(&self, id: TripId) -> Option<Trip> {
        self.state.read().await.trips.get(&id).cloned()
    }

    pub async fn trips(&self, filter: &TripFilter) -> Vec<Trip> {
        self.state
            .read()
            .await
            .trips
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    pub async fn manifest(&self, number: &ManifestNumber) -> Option<Manifest> {
        self.state.read().await.manifests.get(number).cloned()
    }

    /// Manifests matching `filter`, in manifest number order.
    pub async fn manifests(&self, filter: &ManifestFilter) -> Vec<Manifest> {
        self.state
            .read()
            .await
            .manifests
            .values()
            .filter(|m| filter.status.is_none_or(|s| m.status == s))
            .filter(|m| filter.origin.is_none_or(|o| m.origin == o))
            .filter(|m| filter.trip.is_none_or(|t| m.linehaul_trip_id == Some(t)))
            .filter(|m| !filter.unassigned || m.linehaul_trip_id.is_none())
            .cloned()
            .collect()
    }

    /// Where a trailer was last seen.
    pub async fn trailer_location(&self, trailer: &UnitNumber) -> Option<TerminalCode> {
        let directory = self.directory.snapshot().await;
        let state = self.state.read().await;
        state.locator(&directory).last_known_terminal(trailer)
    }

    /// Check that the listed manifests' trailers sit at the first manifest's origin.
    pub async fn check_continuity(&self, numbers: &[ManifestNumber]) -> Result<(), DispatchError> {
        let directory = self.directory.snapshot().await;
        let state = self.state.read().await;
        let manifests = numbers
            .iter()
            .map(|n| {
                state
                    .manifests
                    .get(n)
                    .cloned()
                    .ok_or_else(|| DispatchError::ManifestNotFound(n.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        validate_continuity(&manifests, &state.locator(&directory))?;
        Ok(())
    }

    /// Load factor of one trip.
    pub async fn trip_load_factor(&self, id: TripId) -> Result<Option<f64>, DispatchError> {
        let directory = self.directory.snapshot().await;
        let state = self.state.read().await;
        let trip = state.trips.get(&id).ok_or(DispatchError::TripNotFound(id))?;
        Ok(load_factor::compute_load_factor(
            trip,
            &state.manifests_of(trip),
            &directory,
        ))
    }

    /// Aggregate load factor over the trips matching `filter`.
    pub async fn fleet_load_factor(&self, filter: &TripFilter) -> Option<f64> {
        let directory = self.directory.snapshot().await;
        let state = self.state.read().await;
        let loads: Vec<(&Trip, Vec<Manifest>)> = state
            .trips
            .values()
            .filter(|t| filter.matches(t))
            .map(|t| (t, state.manifests_of(t)))
            .collect();
        load_factor::fleet_load_factor(
            loads.iter().map(|(t, m)| (*t, m.as_slice())),
            &directory,
        )
    }
}

impl BoardState {
    fn locator<'a>(&'a self, directory: &'a Directory) -> BoardLocator<'a> {
        BoardLocator {
            arrivals: &self.arrivals,
            directory,
        }
    }

    fn manifests_of(&self, trip: &Trip) -> Vec<Manifest> {
        trip.manifests
            .iter()
            .filter_map(|n| self.manifests.get(n))
            .cloned()
            .collect()
    }

    fn is_active_trip(&self, id: TripId) -> bool {
        self.trips.get(&id).is_some_and(Trip::is_active)
    }

    /// Clone a trip for modification after checking the caller's version.
    fn trip_for_update(
        &self,
        id: TripId,
        expected_version: Option<u64>,
    ) -> Result<Trip, DispatchError> {
        let trip = self.trips.get(&id).ok_or(DispatchError::TripNotFound(id))?;
        if let Some(expected) = expected_version
            && expected != trip.version
        {
            return Err(DispatchError::stale(format!(
                "trip {id} is at version {}, expected {expected}",
                trip.version
            )));
        }
        Ok(trip.clone())
    }

    /// Check that `numbers` can go on trip `owner` (or a new trip).
    fn check_manifests(
        &self,
        numbers: &[ManifestNumber],
        owner: Option<TripId>,
    ) -> Result<(), DispatchError> {
        if numbers.len() > MAX_MANIFESTS_PER_TRIP {
            return Err(DispatchError::TooManyManifests {
                count: numbers.len(),
                max: MAX_MANIFESTS_PER_TRIP,
            });
        }

        let mut seen = HashSet::new();
        for number in numbers {
            if !seen.insert(number) {
                return Err(DispatchError::DuplicateManifest(number.clone()));
            }
            let manifest = self
                .manifests
                .get(number)
                .ok_or_else(|| DispatchError::ManifestNotFound(number.clone()))?;

            if let Some(other) = manifest.linehaul_trip_id
                && Some(other) != owner
                && self.is_active_trip(other)
            {
                return Err(DispatchError::stale(format!(
                    "manifest {number} is already on trip {other}"
                )));
            }
            if manifest.is_dispatched() && manifest.linehaul_trip_id != owner {
                return Err(DispatchError::stale(format!(
                    "manifest {number} has already been dispatched"
                )));
            }
        }
        Ok(())
    }

    fn check_trailers_free(
        &self,
        trailers: &[UnitNumber],
        owner: Option<TripId>,
    ) -> Result<(), DispatchError> {
        let busy = self
            .trips
            .values()
            .filter(|t| t.is_active() && Some(t.id) != owner)
            .find_map(|t| {
                trailers
                    .iter()
                    .find(|unit| t.trailers.contains(unit))
                    .map(|unit| (unit, t.id))
            });
        match busy {
            Some((unit, trip)) => Err(DispatchError::stale(format!(
                "trailer {unit} is already on trip {trip}"
            ))),
            None => Ok(()),
        }
    }

    /// Validate a draft and turn it into an unsaved PLANNED trip.
    fn draft_trip(&self, directory: &Directory, draft: TripDraft) -> Result<Trip, DispatchError> {
        self.check_manifests(&draft.manifests, None)?;

        let trailers = if draft.trailers.is_empty() {
            let mut seen = HashSet::new();
            draft
                .manifests
                .iter()
                .filter_map(|n| self.manifests.get(n))
                .filter_map(|m| m.trailer_number.clone())
                .filter(|unit| seen.insert(unit.clone()))
                .collect()
        } else {
            draft.trailers
        };
        self.check_trailers_free(&trailers, None)?;

        let mut owner_operator = draft.owner_operator;
        if let Some(id) = draft.driver {
            let driver = directory
                .driver(id)
                .ok_or(DispatchError::DriverNotFound(id))?;
            owner_operator |= driver.owner_operator;
        }

        let id = TripId(self.last_trip_id + 1);
        let trip_number = draft.trip_number.unwrap_or_else(|| {
            format!("LH{}-{}", draft.dispatch_date.format("%Y%m%d"), id)
        });
        let mut trip = Trip::new(id, trip_number, draft.dispatch_date);
        trip.manifests = draft.manifests;
        trip.driver = draft.driver;
        trip.truck = draft.truck;
        trip.trailers = trailers;
        trip.dollies = draft.dollies;
        trip.owner_operator = owner_operator;
        trip.destination_override = draft.destination_override;
        trip.notes = draft.notes;
        Ok(trip)
    }

    /// Run every dispatch precondition without changing anything.
    fn prepare_dispatch(
        &self,
        directory: &Directory,
        trip: &Trip,
        departed: NaiveDateTime,
    ) -> Result<DispatchPlan, DispatchError> {
        if !trip.status.can_transition_to(TripStatus::Dispatched) {
            return Err(DispatchError::InvalidTransition {
                trip: trip.id,
                from: trip.status,
                to: TripStatus::Dispatched,
            });
        }
        if trip.manifests.is_empty() {
            return Err(DispatchError::MissingRequirement("at least one manifest"));
        }
        if trip.driver.is_none() {
            return Err(DispatchError::MissingRequirement("a driver"));
        }
        if trip.truck.is_none() && !trip.owner_operator {
            return Err(DispatchError::MissingRequirement(
                "a power unit or owner-operator designation",
            ));
        }
        self.check_manifests(&trip.manifests, Some(trip.id))?;
        self.check_trailers_free(&trip.trailers, Some(trip.id))?;

        let manifests = self.manifests_of(trip);
        let route = plan_route(directory, &manifests)?;
        validate_continuity(&manifests, &self.locator(directory))?;

        let effective = trip.destination_override.unwrap_or(route.destination);
        let estimate = calculate_distance_eta(&route.profile, &effective, directory, departed);
        if estimate == DistanceEta::Unknown {
            debug!(
                trip = %trip.id,
                destination = %effective,
                "dispatching without a distance estimate"
            );
        }

        Ok(DispatchPlan {
            manifests: trip.manifests.clone(),
            route,
            estimate,
        })
    }

    /// Apply a prepared dispatch. Cannot fail.
    fn commit_dispatch(&mut self, trip: &mut Trip, plan: DispatchPlan, departed: NaiveDateTime) {
        let DispatchPlan {
            manifests,
            route,
            estimate,
        } = plan;

        trip.profile_id = Some(route.profile.id);
        trip.destination = Some(route.destination);
        if trip.planned_departure.is_none() {
            trip.planned_departure = route.planned_departure(trip);
        }
        if let DistanceEta::Known(estimate) = estimate {
            trip.calculated_miles = Some(estimate.miles);
            trip.planned_arrival = Some(estimate.eta);
        }
        trip.actual_departure = Some(departed);
        trip.status = TripStatus::Dispatched;

        let destination = trip.effective_destination();
        for number in &manifests {
            if let Some(manifest) = self.manifests.get_mut(number) {
                manifest.status = ManifestStatus::Dispatched;
                manifest.linehaul_trip_id = Some(trip.id);
                if manifest.destination.is_none() {
                    manifest.destination = destination;
                }
            }
        }
    }

    fn link_manifests(&mut self, trip: &Trip) {
        for number in &trip.manifests {
            if let Some(manifest) = self.manifests.get_mut(number) {
                manifest.linehaul_trip_id = Some(trip.id);
            }
        }
    }

    fn commit_new_trip(&mut self, trip: Trip) {
        self.last_trip_id = self.last_trip_id.max(trip.id.0);
        self.trips.insert(trip.id, trip);
    }

    /// Detach a cancelled trip's manifests so they can travel again.
    fn release_manifests(&mut self, id: TripId) {
        for manifest in self.manifests.values_mut() {
            if manifest.linehaul_trip_id == Some(id) {
                if manifest.status == ManifestStatus::Dispatched {
                    manifest.status = ManifestStatus::Closed;
                }
                manifest.linehaul_trip_id = None;
            }
        }
    }
}

/// Resolve the profile and base destination for a trip's manifests.
fn plan_route(directory: &Directory, manifests: &[Manifest]) -> Result<RoutePlan, DispatchError> {
    let first = manifests
        .first()
        .ok_or(DispatchError::MissingRequirement("at least one manifest"))?;
    let route = first.linehaul_name.trim();

    let ProfileResolution::Found { profile, rule } =
        resolve_profile(directory, route, Some(&first.origin))
    else {
        return Err(DispatchError::ResolutionMiss {
            route: route.to_string(),
        });
    };
    if profile.origin != first.origin {
        return Err(DispatchError::ProfileOriginMismatch {
            route: route.to_string(),
            profile_origin: profile.origin,
            manifest_origin: first.origin,
        });
    }

    // Joining manifests ride along; only the first one sets the route.
    let destination = first
        .destination
        .or_else(|| infer_destination(directory, route, &first.origin).terminal())
        .unwrap_or(profile.destination);

    debug!(
        route,
        profile = %profile.id,
        rule = %rule,
        destination = %destination,
        "route planned"
    );
    Ok(RoutePlan {
        profile: profile.clone(),
        destination,
    })
}
