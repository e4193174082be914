//! Late departure detection.
//!
//! Lateness is never stored on a trip. It is recomputed from the actual
//! departure and the schedule each time it is asked for, so it cannot go
//! stale when a schedule is corrected. Only the dispatcher's explanation is
//! kept, as a [`LateReason`] beside the trip.

use chrono::{NaiveDateTime, NaiveTime};

use crate::domain::{Manifest, RouteProfile, Trip, minutes_of_day};

/// A dispatcher's explanation for a late departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LateReason {
    pub code: String,
    pub note: Option<String>,
    pub recorded_at: NaiveDateTime,
}

/// A departed trip that left after its scheduled time.
#[derive(Debug, Clone, PartialEq)]
pub struct LateDeparture {
    pub trip: Trip,
    pub scheduled: NaiveTime,
    pub minutes_late: i64,
}

/// Scheduled departure time of day for a trip: the first manifest target
/// dispatch time, else the profile's standard departure.
pub fn scheduled_departure(
    manifests: &[Manifest],
    profile: Option<&RouteProfile>,
) -> Option<NaiveTime> {
    manifests
        .iter()
        .find_map(|m| m.target_dispatch_time)
        .or_else(|| profile.and_then(|p| p.standard_departure_time))
}

/// Minutes between the scheduled and actual time of day, when positive.
///
/// Dates are ignored.
pub fn minutes_late(actual: NaiveDateTime, scheduled: NaiveTime) -> Option<i64> {
    let late = minutes_of_day(actual.time()) - minutes_of_day(scheduled);
    (late > 0).then_some(late)
}

/// Lateness of a departed trip, if it is late.
pub fn late_departure(
    trip: &Trip,
    manifests: &[Manifest],
    profile: Option<&RouteProfile>,
) -> Option<LateDeparture> {
    let actual = trip.actual_departure?;
    let scheduled = scheduled_departure(manifests, profile)?;
    let minutes_late = minutes_late(actual, scheduled)?;
    Some(LateDeparture {
        trip: trip.clone(),
        scheduled,
        minutes_late,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TerminalCode, TripId};
    use chrono::NaiveDate;

    fn code(s: &str) -> TerminalCode {
        TerminalCode::parse(s).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn profile(standard: Option<NaiveTime>) -> RouteProfile {
        let mut p = RouteProfile::new(1, "PHXDEN1", code("PHX"), code("DEN"));
        p.standard_departure_time = standard;
        p
    }

    #[test]
    fn manifest_target_wins_over_profile() {
        let mut m = Manifest::new("M1", "PHXDEN1", code("PHX"));
        m.target_dispatch_time = Some(hm(21, 0));
        let p = profile(Some(hm(22, 30)));
        assert_eq!(scheduled_departure(&[m], Some(&p)), Some(hm(21, 0)));
    }

    #[test]
    fn profile_standard_is_fallback() {
        let m = Manifest::new("M1", "PHXDEN1", code("PHX"));
        let p = profile(Some(hm(22, 30)));
        assert_eq!(scheduled_departure(&[m], Some(&p)), Some(hm(22, 30)));
        assert_eq!(scheduled_departure(&[], None), None);
    }

    #[test]
    fn dates_are_ignored() {
        // Departing the next day but earlier in the day is not late.
        assert_eq!(minutes_late(at(3, 1, 0), hm(22, 30)), None);
        assert_eq!(minutes_late(at(2, 22, 45), hm(22, 30)), Some(15));
        assert_eq!(minutes_late(at(2, 22, 30), hm(22, 30)), None);
    }

    #[test]
    fn undeparted_trip_is_not_late() {
        let trip = Trip::new(TripId(1), "T1", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let p = profile(Some(hm(0, 0)));
        assert!(late_departure(&trip, &[], Some(&p)).is_none());
    }

    #[test]
    fn late_trip_reports_minutes() {
        let mut trip = Trip::new(TripId(1), "T1", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        trip.actual_departure = Some(at(2, 23, 10));
        let p = profile(Some(hm(22, 30)));
        let late = late_departure(&trip, &[], Some(&p)).unwrap();
        assert_eq!(late.minutes_late, 40);
        assert_eq!(late.scheduled, hm(22, 30));
    }
}
