//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::directory::{RouteRow, import_route_rows};
use crate::dispatch::{
    Assignment, DispatchError, LateReason, ManifestFilter, TransitionTimestamps, TripDraft,
    TripFilter,
};
use crate::domain::{
    DriverId, ManifestNumber, ManifestStatus, ProfileId, TerminalCode, Trip, TripId, TripStatus,
    UnitNumber, parse_timestamp,
};
use crate::eta::{calculate_distance_eta, display_eta};
use crate::resolve::{DestinationInference, ProfileResolution, infer_destination, resolve_profile};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/profiles/resolve", get(resolve_route_profile))
        .route("/profiles/:id/estimate", get(profile_estimate))
        .route("/destinations/infer", get(infer_route_destination))
        .route("/continuity/validate", post(validate_continuity))
        .route("/trips", get(list_trips).post(plan_trip))
        .route("/trips/dispatch", post(dispatch_trip))
        .route("/trips/late", get(late_trips))
        .route("/trips/:id", get(trip_detail))
        .route("/trips/:id/assign", post(assign_trip))
        .route("/trips/:id/status", post(advance_status))
        .route("/trips/:id/late-reason", post(record_late_reason))
        .route("/trips/:id/load-factor", get(trip_load_factor))
        .route("/trips/:id/eta", get(trip_eta))
        .route("/fleet/load-factor", get(fleet_load_factor))
        .route("/manifests", get(list_manifests))
        .route("/routes/import", post(import_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn parse_code(field: &str, value: &str) -> Result<TerminalCode, AppError> {
    TerminalCode::parse_normalized(value).map_err(|e| AppError::BadRequest {
        message: format!("Invalid {field}: {e}"),
    })
}

fn parse_optional_code(field: &str, value: Option<&str>) -> Result<Option<TerminalCode>, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_code(field, v))
        .transpose()
}

fn parse_time(field: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>, AppError> {
    value
        .map(|v| {
            parse_timestamp(v).map_err(|e| AppError::BadRequest {
                message: format!("Invalid {field}: {e}"),
            })
        })
        .transpose()
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| AppError::BadRequest {
                message: format!("Invalid date '{v}': expected YYYY-MM-DD"),
            })
        })
        .transpose()
}

fn parse_trip_status(value: &str) -> Result<TripStatus, AppError> {
    value.parse().map_err(|_| AppError::BadRequest {
        message: format!("Invalid trip status: {value}"),
    })
}

fn trip_filter(query: &TripListQuery) -> Result<TripFilter, AppError> {
    Ok(TripFilter {
        status: query.status.as_deref().map(parse_trip_status).transpose()?,
        dispatch_date: parse_date(query.date.as_deref())?,
    })
}

fn draft_from_request(req: TripDraftRequest) -> Result<TripDraft, AppError> {
    let date = parse_date(req.dispatch_date.as_deref())?.unwrap_or_else(|| now().date());
    let mut draft = TripDraft::new(date, req.manifests);
    draft.trip_number = req.trip_number;
    draft.driver = req.driver.map(DriverId);
    draft.truck = req.truck.as_deref().map(UnitNumber::new);
    draft.trailers = req.trailers.iter().map(UnitNumber::new).collect();
    draft.dollies = req.dollies.iter().map(UnitNumber::new).collect();
    draft.owner_operator = req.owner_operator;
    draft.destination_override =
        parse_optional_code("destination override", req.destination_override.as_deref())?;
    draft.notes = req.notes;
    Ok(draft)
}

/// Resolve a linehaul name to a route profile.
async fn resolve_route_profile(
    State(state): State<AppState>,
    Query(query): Query<ResolveProfileQuery>,
) -> Result<Json<ResolveProfileResponse>, AppError> {
    let origin = parse_optional_code("origin", query.origin.as_deref())?;
    let directory = state.board.directory().snapshot().await;

    let response = match resolve_profile(&directory, &query.route, origin.as_ref()) {
        ProfileResolution::Found { profile, rule } => ResolveProfileResponse {
            profile: Some(ProfileResult::from_profile(profile)),
            rule: Some(rule.as_str()),
        },
        ProfileResolution::NotFound => ResolveProfileResponse {
            profile: None,
            rule: None,
        },
    };
    Ok(Json(response))
}

/// Infer where continuing freight on a route is headed.
async fn infer_route_destination(
    State(state): State<AppState>,
    Query(query): Query<InferDestinationQuery>,
) -> Result<Json<InferDestinationResponse>, AppError> {
    let origin = parse_code("origin", &query.origin)?;
    let directory = state.board.directory().snapshot().await;

    let response = match infer_destination(&directory, &query.route, &origin) {
        DestinationInference::Inferred { terminal, strategy } => InferDestinationResponse {
            destination: Some(terminal.to_string()),
            strategy: Some(strategy.as_str()),
        },
        DestinationInference::Unknown => InferDestinationResponse {
            destination: None,
            strategy: None,
        },
    };
    Ok(Json(response))
}

/// Distance and ETA for a profile.
async fn profile_estimate(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<EstimateQuery>,
) -> Result<Json<EstimateResponse>, AppError> {
    let destination = parse_optional_code("destination", query.destination.as_deref())?;
    let departure = parse_time("departure", query.departure.as_deref())?.unwrap_or_else(now);
    let directory = state.board.directory().snapshot().await;

    let profile = directory
        .profile(ProfileId(id))
        .ok_or_else(|| AppError::NotFound {
            message: format!("profile {id} not found"),
        })?;
    let destination = destination.unwrap_or(profile.destination);
    let estimate = calculate_distance_eta(profile, &destination, &directory, departure);
    Ok(Json(EstimateResponse::from_estimate(estimate.estimate())))
}

/// Check trailer continuity for a prospective trip.
async fn validate_continuity(
    State(state): State<AppState>,
    Json(req): Json<ContinuityRequest>,
) -> Result<Json<ContinuityResponse>, AppError> {
    let numbers: Vec<ManifestNumber> = req.manifests.into_iter().map(ManifestNumber::new).collect();
    state.board.check_continuity(&numbers).await?;
    Ok(Json(ContinuityResponse { valid: true }))
}

/// Create a PLANNED trip.
async fn plan_trip(
    State(state): State<AppState>,
    Json(req): Json<TripDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = draft_from_request(req)?;
    let trip = state.board.plan_trip(draft).await?;
    Ok((StatusCode::CREATED, Json(TripResult::from_trip(&trip))))
}

/// Create and dispatch a trip in one step.
async fn dispatch_trip(
    State(state): State<AppState>,
    Json(req): Json<TripDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    let departed = parse_time("departed_at", req.departed_at.as_deref())?.unwrap_or_else(now);
    let draft = draft_from_request(req)?;
    let trip = state.board.dispatch_trip(draft, departed).await?;
    Ok((StatusCode::CREATED, Json(TripResult::from_trip(&trip))))
}

/// Trips with their displayed ETAs.
async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripListQuery>,
) -> Result<Json<TripListResponse>, AppError> {
    let filter = trip_filter(&query)?;
    let trips = state.board.trips(&filter).await;

    let gps_etas: Vec<Option<NaiveDateTime>> = match &state.gps {
        Some(gps) => {
            let requests: Vec<_> = trips.iter().filter_map(gps_request).collect();
            let mut answers = gps.unit_etas(&requests).await.into_iter();
            trips
                .iter()
                .map(|t| {
                    gps_request(t)
                        .and_then(|_| answers.next().flatten())
                        .map(|g| g.eta)
                })
                .collect()
        }
        None => vec![None; trips.len()],
    };

    let trips = trips
        .iter()
        .zip(gps_etas)
        .map(|(trip, gps_eta)| TripSummary {
            trip: TripResult::from_trip(trip),
            eta: display_eta(trip.planned_arrival, gps_eta)
                .as_ref()
                .map(EtaResult::from_display),
        })
        .collect();
    Ok(Json(TripListResponse { trips }))
}

/// The GPS lookup for a trip, when it is moving with a known truck and destination.
fn gps_request(trip: &Trip) -> Option<(UnitNumber, TerminalCode)> {
    if !trip.status.is_underway() {
        return None;
    }
    Some((trip.truck.clone()?, trip.effective_destination()?))
}

async fn trip_detail(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TripDetailResponse>, AppError> {
    let id = TripId(id);
    let trip = state
        .board
        .trip(id)
        .await
        .ok_or(DispatchError::TripNotFound(id))?;
    let manifests = state
        .board
        .manifests(&ManifestFilter {
            trip: Some(id),
            ..ManifestFilter::default()
        })
        .await;
    let lateness = state.board.lateness(id).await?;
    let late_reason = state.board.late_reason(id).await;

    Ok(Json(TripDetailResponse {
        trip: TripResult::from_trip(&trip),
        manifests: manifests.iter().map(ManifestResult::from_manifest).collect(),
        minutes_late: lateness.map(|l| l.minutes_late),
        late_reason: late_reason.as_ref().map(LateReasonResult::from_reason),
    }))
}

/// Record a driver and equipment on a planned trip.
async fn assign_trip(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<TripResult>, AppError> {
    let assignment = Assignment {
        driver: DriverId(req.driver),
        truck: req.truck.as_deref().map(UnitNumber::new),
        trailers: req.trailers.iter().map(UnitNumber::new).collect(),
        dollies: req.dollies.iter().map(UnitNumber::new).collect(),
        owner_operator: req.owner_operator,
    };
    let trip = state
        .board
        .assign_trip(TripId(id), assignment, req.version)
        .await?;
    Ok(Json(TripResult::from_trip(&trip)))
}

/// Move a trip through its lifecycle.
async fn advance_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<TripResult>, AppError> {
    let next = parse_trip_status(&req.status)?;
    let timestamps = TransitionTimestamps {
        recorded_at: parse_time("recorded_at", req.recorded_at.as_deref())?.unwrap_or_else(now),
        actual_departure: parse_time("actual_departure", req.actual_departure.as_deref())?,
        actual_arrival: parse_time("actual_arrival", req.actual_arrival.as_deref())?,
    };
    let trip = state
        .board
        .advance_trip_status(TripId(id), next, timestamps, req.version)
        .await?;
    Ok(Json(TripResult::from_trip(&trip)))
}

async fn record_late_reason(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<LateReasonRequest>,
) -> Result<StatusCode, AppError> {
    if req.code.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: "late reason code is required".into(),
        });
    }
    let reason = LateReason {
        code: req.code.trim().to_string(),
        note: req.note,
        recorded_at: parse_time("recorded_at", req.recorded_at.as_deref())?.unwrap_or_else(now),
    };
    state.board.record_late_reason(TripId(id), reason).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Dispatched late trips still waiting for an explanation.
async fn late_trips(State(state): State<AppState>) -> Json<LateTripsResponse> {
    let trips = state.board.late_trips_without_reason().await;
    Json(LateTripsResponse {
        trips: trips.iter().map(LateTripResult::from_late).collect(),
    })
}

async fn trip_load_factor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<LoadFactorResponse>, AppError> {
    let load_factor = state.board.trip_load_factor(TripId(id)).await?;
    Ok(Json(LoadFactorResponse { load_factor }))
}

async fn fleet_load_factor(
    State(state): State<AppState>,
    Query(query): Query<TripListQuery>,
) -> Result<Json<LoadFactorResponse>, AppError> {
    let filter = trip_filter(&query)?;
    let load_factor = state.board.fleet_load_factor(&filter).await;
    Ok(Json(LoadFactorResponse { load_factor }))
}

/// ETA shown to dispatchers: live GPS when available, else the profile estimate.
async fn trip_eta(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TripEtaResponse>, AppError> {
    let id = TripId(id);
    let trip = state
        .board
        .trip(id)
        .await
        .ok_or(DispatchError::TripNotFound(id))?;

    let gps_eta = match (&state.gps, gps_request(&trip)) {
        (Some(gps), Some((unit, destination))) => gps
            .unit_eta_or_none(&unit, &destination)
            .await
            .map(|g| g.eta),
        _ => None,
    };

    let eta = display_eta(trip.planned_arrival, gps_eta);
    Ok(Json(TripEtaResponse {
        eta: eta.as_ref().map(EtaResult::from_display),
    }))
}

async fn list_manifests(
    State(state): State<AppState>,
    Query(query): Query<ManifestQuery>,
) -> Result<Json<ManifestListResponse>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<ManifestStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest {
            message: e.to_string(),
        })?;
    let filter = ManifestFilter {
        status,
        origin: parse_optional_code("origin", query.origin.as_deref())?,
        trip: query.trip.map(TripId),
        unassigned: query.unassigned,
    };
    let manifests = state.board.manifests(&filter).await;
    Ok(Json(ManifestListResponse {
        manifests: manifests.iter().map(ManifestResult::from_manifest).collect(),
    }))
}

/// Replace the route table with exported spreadsheet rows.
///
/// A body in which no row survives leaves the current table in place.
async fn import_routes(
    State(state): State<AppState>,
    Json(rows): Json<Vec<RouteRow>>,
) -> Json<RouteImportResponse> {
    let report = import_route_rows(rows);
    let imported = report.imported();
    if imported > 0 {
        state
            .board
            .directory()
            .replace_routes(report.records)
            .await;
    }
    Json(RouteImportResponse {
        imported,
        skipped: report.skipped,
        failed: report.failures.len(),
        failures: report.failures,
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Unprocessable { message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn into_message(self) -> String {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message }
            | AppError::Unprocessable { message } => message,
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        let message = e.to_string();
        match e {
            DispatchError::TripNotFound(_)
            | DispatchError::ManifestNotFound(_)
            | DispatchError::DriverNotFound(_) => AppError::NotFound { message },
            DispatchError::InvalidTransition { .. }
            | DispatchError::StaleAssignmentConflict { .. } => AppError::Conflict { message },
            DispatchError::ResolutionMiss { .. }
            | DispatchError::ProfileOriginMismatch { .. }
            | DispatchError::Continuity(_)
            | DispatchError::MissingRequirement(_)
            | DispatchError::TooManyManifests { .. }
            | DispatchError::DuplicateManifest(_) => AppError::Unprocessable { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.into_message();
        warn!(%status, %message, "request rejected");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
