//! Dispatch board tests: planning, dispatch, lifecycle and queries.

use super::*;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::directory::{Directory, SharedDirectory, Snapshot};
use crate::domain::{
    Driver, DriverId, Manifest, ManifestStatus, RouteProfile, Terminal, TerminalCode, Trailer,
    TripId, TripStatus, UnitNumber,
};

fn code(s: &str) -> TerminalCode {
    TerminalCode::parse(s).unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    date().and_hms_opt(h, m, 0).unwrap()
}

fn directory() -> Directory {
    let mut dir = Directory::new();
    dir.add_terminal(Terminal::new(code("PHX")).with_coordinates(33.4484, -112.0740));
    dir.add_terminal(Terminal::new(code("DEN")).with_coordinates(39.7392, -104.9903));
    dir.add_terminal(Terminal::new(code("SLC")).with_coordinates(40.7608, -111.8910));

    let mut direct = RouteProfile::new(1, "PHXDEN1", code("PHX"), code("DEN"))
        .with_distance(821.0, Some(840));
    direct.standard_departure_time = NaiveTime::from_hms_opt(22, 30, 0);
    dir.add_profile(direct);
    dir.add_profile(RouteProfile::new(2, "PHXDENSLC1", code("PHX"), code("DEN")));
    dir.add_profile(RouteProfile::new(3, "PHXDENSLC1", code("DEN"), code("SLC")));

    dir.add_trailer(Trailer::new("T1", 53).at(code("PHX")));
    dir.add_trailer(Trailer::new("T2", 28).at(code("DEN")));
    dir.add_trailer(Trailer::new("T3", 28).at(code("PHX")));
    dir.add_trailer(Trailer::new("T4", 28).at(code("PHX")));

    dir.add_driver(Driver {
        id: DriverId(1),
        name: "Sam Ortiz".into(),
        owner_operator: false,
    });
    dir.add_driver(Driver {
        id: DriverId(2),
        name: "Jo Reyes".into(),
        owner_operator: true,
    });
    dir
}

fn manifests() -> Vec<Manifest> {
    let mut m1 = Manifest::new("M1", "PHXDEN1", code("PHX"))
        .with_trailer("T1")
        .with_load(20, 15_635.0);
    m1.target_dispatch_time = NaiveTime::from_hms_opt(22, 0, 0);

    vec![
        m1,
        Manifest::new("M2", "PHXDENSLC1", code("PHX")).with_trailer("T3"),
        Manifest::new("M3", "PHXDENSLC1", code("DEN")).with_trailer("T2"),
        Manifest::new("M4", "ZZZQQQ9", code("PHX")).with_trailer("T4"),
        // Trailer T4 is still at PHX.
        Manifest::new("M5", "PHXDENSLC1", code("DEN")).with_trailer("T4"),
        // Trailer T1 only reaches DEN once M1's trip arrives.
        Manifest::new("M6", "PHXDENSLC1", code("DEN")).with_trailer("T1"),
    ]
}

fn board() -> DispatchBoard {
    DispatchBoard::new(SharedDirectory::new(directory()), manifests())
}

fn draft(numbers: &[&str]) -> TripDraft {
    TripDraft::new(date(), numbers.iter().copied())
        .with_driver(DriverId(1))
        .with_truck("TR10")
}

#[tokio::test]
async fn one_manifest_dispatch() {
    let board = board();
    let trip = board.dispatch_trip(draft(&["M1"]), at(22, 45)).await.unwrap();

    assert_eq!(trip.status, TripStatus::Dispatched);
    assert_eq!(trip.actual_departure, Some(at(22, 45)));
    assert_eq!(trip.profile_id, Some(crate::domain::ProfileId(1)));
    assert_eq!(trip.destination, Some(code("DEN")));
    assert_eq!(trip.calculated_miles, Some(821.0));
    assert_eq!(trip.planned_arrival, Some(at(22, 45) + chrono::Duration::minutes(840)));
    assert_eq!(trip.planned_departure, Some(at(22, 30)));
    assert_eq!(trip.trailers, vec![UnitNumber::new("T1")]);

    let m1 = board.manifest(&"M1".into()).await.unwrap();
    assert_eq!(m1.status, ManifestStatus::Dispatched);
    assert_eq!(m1.linehaul_trip_id, Some(trip.id));
    assert_eq!(m1.destination, Some(code("DEN")));
}

#[tokio::test]
async fn rejected_dispatch_leaves_board_unchanged() {
    let board = board();
    let no_driver = TripDraft::new(date(), ["M1"]).with_truck("TR10");
    let err = board.dispatch_trip(no_driver, at(22, 45)).await.unwrap_err();
    assert_eq!(err, DispatchError::MissingRequirement("a driver"));

    let no_power = TripDraft::new(date(), ["M1"]).with_driver(DriverId(1));
    let err = board.dispatch_trip(no_power, at(22, 45)).await.unwrap_err();
    assert!(matches!(err, DispatchError::MissingRequirement(_)));

    assert!(board.trips(&TripFilter::default()).await.is_empty());
    let m1 = board.manifest(&"M1".into()).await.unwrap();
    assert_eq!(m1.status, ManifestStatus::Closed);
    assert_eq!(m1.linehaul_trip_id, None);
}

#[tokio::test]
async fn owner_operator_needs_no_truck() {
    let board = board();
    let draft = TripDraft::new(date(), ["M1"]).with_driver(DriverId(2));
    let trip = board.dispatch_trip(draft, at(22, 45)).await.unwrap();
    assert!(trip.owner_operator);
    assert!(trip.truck.is_none());
}

#[tokio::test]
async fn unknown_driver_is_rejected() {
    let board = board();
    let draft = TripDraft::new(date(), ["M1"])
        .with_driver(DriverId(99))
        .with_truck("TR10");
    let err = board.dispatch_trip(draft, at(22, 45)).await.unwrap_err();
    assert_eq!(err, DispatchError::DriverNotFound(DriverId(99)));
}

#[tokio::test]
async fn unresolvable_route_names_the_route() {
    let board = board();
    let err = board.dispatch_trip(draft(&["M4"]), at(22, 45)).await.unwrap_err();
    assert_eq!(
        err,
        DispatchError::ResolutionMiss {
            route: "ZZZQQQ9".into()
        }
    );
}

#[tokio::test]
async fn profile_from_another_origin_is_rejected() {
    let mut dir = directory();
    dir.add_profile(RouteProfile::new(10, "MSPFARBIL1", code("MSP"), code("FAR")));
    let board = DispatchBoard::new(
        SharedDirectory::new(dir),
        [Manifest::new("X1", "MSPFARBIL1", code("DEN")).with_trailer("T2")],
    );

    let err = board.dispatch_trip(draft(&["X1"]), at(23, 0)).await.unwrap_err();
    assert_eq!(
        err,
        DispatchError::ProfileOriginMismatch {
            route: "MSPFARBIL1".into(),
            profile_origin: code("MSP"),
            manifest_origin: code("DEN"),
        }
    );
    assert!(board.trips(&TripFilter::default()).await.is_empty());

    // Planning still goes ahead, just without a profile.
    let trip = board.plan_trip(draft(&["X1"])).await.unwrap();
    assert_eq!(trip.profile_id, None);
    assert_eq!(trip.destination, None);
}

#[tokio::test]
async fn joining_manifest_destination_does_not_redirect_trip() {
    let board = board();
    let joining = Manifest::new("M7", "PHXDENSLC1", code("DEN"))
        .with_trailer("T2")
        .with_destination(code("SLC"));
    board.merge_manifests([joining]).await;

    let trip = board.plan_trip(draft(&["M2", "M7"])).await.unwrap();
    assert_eq!(trip.profile_id, Some(crate::domain::ProfileId(2)));
    assert_eq!(trip.destination, Some(code("DEN")));
}

#[tokio::test]
async fn continuity_accepts_trailer_waiting_at_second_origin() {
    let board = board();
    let trip = board
        .dispatch_trip(draft(&["M2", "M3"]), at(23, 0))
        .await
        .unwrap();
    assert_eq!(trip.manifests.len(), 2);
    assert_eq!(
        trip.trailers,
        vec![UnitNumber::new("T3"), UnitNumber::new("T2")]
    );
}

#[tokio::test]
async fn continuity_rejects_trailer_elsewhere() {
    let board = board();
    let err = board
        .dispatch_trip(draft(&["M2", "M5"]), at(23, 0))
        .await
        .unwrap_err();
    let DispatchError::Continuity(violation) = err else {
        panic!("expected a continuity violation, got {err:?}");
    };
    assert_eq!(violation.manifest.as_str(), "M5");
    assert_eq!(violation.expected_origin, code("DEN"));
    assert_eq!(violation.first_manifest.as_str(), "M2");
    assert_eq!(violation.found, Some(code("PHX")));
}

#[tokio::test]
async fn arrival_moves_trailers() {
    let board = board();
    let ts = TransitionTimestamps::new(at(22, 45));

    // T1 is at PHX, so M6 cannot leave DEN with it yet.
    let err = board
        .dispatch_trip(draft(&["M2", "M6"]), at(22, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Continuity(_)));

    let trip = board.dispatch_trip(draft(&["M1"]), at(22, 45)).await.unwrap();
    board
        .advance_trip_status(trip.id, TripStatus::InTransit, ts, None)
        .await
        .unwrap();
    let arrived = board
        .advance_trip_status(
            trip.id,
            TripStatus::Arrived,
            TransitionTimestamps {
                actual_arrival: Some(at(23, 59)),
                ..ts
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(arrived.actual_arrival, Some(at(23, 59)));
    assert_eq!(board.trailer_location(&"T1".into()).await, Some(code("DEN")));

    board
        .advance_trip_status(trip.id, TripStatus::Completed, ts, None)
        .await
        .unwrap();
    board
        .dispatch_trip(draft(&["M2", "M6"]), at(23, 0))
        .await
        .unwrap();
}

#[tokio::test]
async fn invalid_transition_leaves_trip_unchanged() {
    let board = board();
    let planned = board.plan_trip(draft(&["M1"])).await.unwrap();
    let ts = TransitionTimestamps::new(at(22, 45));

    let err = board
        .advance_trip_status(planned.id, TripStatus::Arrived, ts, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::InvalidTransition {
            trip: planned.id,
            from: TripStatus::Planned,
            to: TripStatus::Arrived,
        }
    );
    assert_eq!(board.trip(planned.id).await, Some(planned));
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let board = board();
    let planned = board.plan_trip(draft(&["M1"])).await.unwrap();

    let err = board
        .assign_trip(planned.id, Assignment::new(DriverId(1)), Some(planned.version + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::StaleAssignmentConflict { .. }));

    let assigned = board
        .assign_trip(planned.id, Assignment::new(DriverId(1)), Some(planned.version))
        .await
        .unwrap();
    assert_eq!(assigned.version, planned.version + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_dispatch_of_one_manifest() {
    let board = Arc::new(board());

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.dispatch_trip(draft(&["M1"]), at(22, 45)).await })
        })
        .collect();
    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(DispatchError::StaleAssignmentConflict { .. })
    )));
    assert_eq!(board.trips(&TripFilter::default()).await.len(), 1);
}

#[tokio::test]
async fn cancel_releases_manifests() {
    let board = board();
    let trip = board.dispatch_trip(draft(&["M1"]), at(22, 45)).await.unwrap();
    let cancelled = board
        .advance_trip_status(
            trip.id,
            TripStatus::Cancelled,
            TransitionTimestamps::new(at(23, 0)),
            Some(trip.version),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);

    let m1 = board.manifest(&"M1".into()).await.unwrap();
    assert_eq!(m1.status, ManifestStatus::Closed);
    assert_eq!(m1.linehaul_trip_id, None);

    // Released freight can travel on a new trip.
    board.dispatch_trip(draft(&["M1"]), at(23, 30)).await.unwrap();
}

#[tokio::test]
async fn plan_assign_dispatch_and_lateness() {
    let board = board();
    let planned = board
        .plan_trip(TripDraft::new(date(), ["M1"]))
        .await
        .unwrap();
    assert_eq!(planned.status, TripStatus::Planned);
    assert_eq!(planned.planned_departure, Some(at(22, 30)));
    assert_eq!(planned.destination, Some(code("DEN")));

    let m1 = board.manifest(&"M1".into()).await.unwrap();
    assert_eq!(m1.linehaul_trip_id, Some(planned.id));
    assert_eq!(m1.status, ManifestStatus::Closed);

    let ts = TransitionTimestamps::new(at(23, 10));
    let err = board
        .advance_trip_status(planned.id, TripStatus::Dispatched, ts, None)
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::MissingRequirement("a driver"));

    let assigned = board
        .assign_trip(
            planned.id,
            Assignment::new(DriverId(1)).with_truck("TR10"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(assigned.status, TripStatus::Assigned);

    let dispatched = board
        .advance_trip_status(planned.id, TripStatus::Dispatched, ts, Some(assigned.version))
        .await
        .unwrap();
    assert_eq!(dispatched.actual_departure, Some(at(23, 10)));

    // Target dispatch time on M1 is 22:00.
    let late = board.late_trips_without_reason().await;
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].minutes_late, 70);
    assert_eq!(
        board.lateness(planned.id).await.unwrap().map(|l| l.minutes_late),
        Some(70)
    );

    board
        .record_late_reason(
            planned.id,
            LateReason {
                code: "WEATHER".into(),
                note: Some("I-17 closed".into()),
                recorded_at: at(23, 30),
            },
        )
        .await
        .unwrap();
    assert!(board.late_trips_without_reason().await.is_empty());
    assert_eq!(
        board.late_reason(planned.id).await.map(|r| r.code),
        Some("WEATHER".to_string())
    );
}

#[tokio::test]
async fn late_reason_needs_a_trip() {
    let board = board();
    let err = board
        .record_late_reason(
            TripId(42),
            LateReason {
                code: "OTHER".into(),
                note: None,
                recorded_at: at(0, 0),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::TripNotFound(TripId(42)));
}

#[tokio::test]
async fn manifest_limits() {
    let board = board();
    let err = board
        .plan_trip(draft(&["M1", "M2", "M3", "M4"]))
        .await
        .unwrap_err();
    assert_eq!(err, DispatchError::TooManyManifests { count: 4, max: 3 });

    let err = board.plan_trip(draft(&["M1", "M1"])).await.unwrap_err();
    assert_eq!(err, DispatchError::DuplicateManifest("M1".into()));

    let err = board.plan_trip(draft(&["NOPE"])).await.unwrap_err();
    assert_eq!(err, DispatchError::ManifestNotFound("NOPE".into()));
}

#[tokio::test]
async fn manifest_on_active_trip_is_taken() {
    let board = board();
    board.plan_trip(draft(&["M1"])).await.unwrap();
    let err = board.plan_trip(draft(&["M1"])).await.unwrap_err();
    assert!(matches!(err, DispatchError::StaleAssignmentConflict { .. }));
}

#[tokio::test]
async fn destination_override_drives_estimate() {
    let board = board();
    let trip = board
        .dispatch_trip(
            draft(&["M1"]).with_destination_override(code("SLC")),
            at(22, 45),
        )
        .await
        .unwrap();
    assert_eq!(trip.destination, Some(code("DEN")));
    assert_eq!(trip.effective_destination(), Some(code("SLC")));

    let miles = trip.calculated_miles.unwrap();
    assert_ne!(miles, 821.0);
    assert_eq!(miles.fract(), 0.0);

    let m1 = board.manifest(&"M1".into()).await.unwrap();
    assert_eq!(m1.destination, Some(code("SLC")));
}

#[tokio::test]
async fn load_factors() {
    let board = board();
    let trip = board.dispatch_trip(draft(&["M1"]), at(22, 45)).await.unwrap();
    // 15_635 lbs on a 53 ft trailer.
    assert_eq!(board.trip_load_factor(trip.id).await.unwrap(), Some(50.0));
    assert_eq!(
        board.trip_load_factor(TripId(99)).await,
        Err(DispatchError::TripNotFound(TripId(99)))
    );

    let filter = TripFilter {
        status: Some(TripStatus::Dispatched),
        ..TripFilter::default()
    };
    assert_eq!(board.fleet_load_factor(&filter).await, Some(50.0));
    let none = TripFilter {
        status: Some(TripStatus::Completed),
        ..TripFilter::default()
    };
    assert_eq!(board.fleet_load_factor(&none).await, None);
}

#[tokio::test]
async fn manifest_queries() {
    let board = board();
    let trip = board.dispatch_trip(draft(&["M1"]), at(22, 45)).await.unwrap();

    let dispatched = board
        .manifests(&ManifestFilter {
            status: Some(ManifestStatus::Dispatched),
            ..ManifestFilter::default()
        })
        .await;
    assert_eq!(dispatched.len(), 1);

    let on_trip = board
        .manifests(&ManifestFilter {
            trip: Some(trip.id),
            ..ManifestFilter::default()
        })
        .await;
    assert_eq!(on_trip[0].manifest_number.as_str(), "M1");

    let waiting_at_den = board
        .manifests(&ManifestFilter {
            origin: Some(code("DEN")),
            unassigned: true,
            ..ManifestFilter::default()
        })
        .await;
    let numbers: Vec<&str> = waiting_at_den
        .iter()
        .map(|m| m.manifest_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["M3", "M5", "M6"]);
}

#[tokio::test]
async fn refresh_merges_new_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(
        &path,
        r#"{"manifests": [{"manifest_number": "M1", "linehaul_name": "PHXDEN1", "origin": "PHX"}]}"#,
    )
    .unwrap();

    let snapshot = Snapshot::load(&path).unwrap();
    let board = DispatchBoard::new(
        SharedDirectory::with_source(snapshot.directory, &path),
        snapshot.manifests,
    );

    std::fs::write(
        &path,
        r#"{"manifests": [
            {"manifest_number": "M1", "linehaul_name": "CHANGED", "origin": "PHX"},
            {"manifest_number": "M2", "linehaul_name": "PHXDEN1", "origin": "PHX"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(board.refresh().await.unwrap(), 1);

    // Known manifests keep their board state.
    let m1 = board.manifest(&"M1".into()).await.unwrap();
    assert_eq!(m1.linehaul_name, "PHXDEN1");
    assert!(board.manifest(&"M2".into()).await.is_some());
}

#[tokio::test]
async fn continuity_check_without_dispatch() {
    let board = board();
    board.check_continuity(&["M2".into(), "M3".into()]).await.unwrap();

    let err = board
        .check_continuity(&["M2".into(), "M6".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Continuity(_)));

    let err = board.check_continuity(&["M9".into()]).await.unwrap_err();
    assert_eq!(err, DispatchError::ManifestNotFound("M9".into()));
    assert!(board.trips(&TripFilter::default()).await.is_empty());
}
