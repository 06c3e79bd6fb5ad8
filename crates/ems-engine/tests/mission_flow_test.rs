//! End-to-end mission flow tests against a stubbed route planner.
//!
//! All timing-sensitive tests run on tokio's paused clock, so SLA windows
//! and tick cadences are exercised deterministically.

use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;

use ems_core::clearance::ClearanceStatus;
use ems_core::models::{DispatchPlan, Facility, GeoPoint, MissionPhase, Vehicle};
use ems_core::zones::ZoneMap;
use ems_engine::{Config, MissionEngine};
use ems_planner::{EtaQuery, RoutePlanner};

struct StubPlanner {
    plan: DispatchPlan,
    refreshed_eta: Option<f64>,
}

impl RoutePlanner for StubPlanner {
    async fn plan(&self, _patient: GeoPoint) -> Result<DispatchPlan> {
        Ok(self.plan.clone())
    }

    async fn refresh_eta(&self, _query: EtaQuery) -> Result<f64> {
        self.refreshed_eta
            .ok_or_else(|| anyhow::anyhow!("traffic service unavailable"))
    }
}

struct FailingPlanner;

impl RoutePlanner for FailingPlanner {
    async fn plan(&self, _patient: GeoPoint) -> Result<DispatchPlan> {
        Err(anyhow::anyhow!("no available ambulances"))
    }

    async fn refresh_eta(&self, _query: EtaQuery) -> Result<f64> {
        Err(anyhow::anyhow!("unreachable"))
    }
}

fn test_config() -> Config {
    Config {
        planner_url: "http://127.0.0.1:0".to_string(),
        clearance_sla_secs: 8,
    }
}

fn plan(prep_min: u32, route: Vec<GeoPoint>, facility: Facility, eta: f64) -> DispatchPlan {
    DispatchPlan {
        vehicle: Vehicle {
            id: "A1".to_string(),
            prep_time_min: prep_min,
        },
        facility,
        route,
        eta_minutes: eta,
    }
}

fn facility_outside_zones() -> Facility {
    Facility {
        id: "H1".to_string(),
        name: "City Hospital".to_string(),
        lat: 12.9600,
        lng: 77.5700,
    }
}

/// Patient and vehicle start both inside the Central Zone; the facility
/// is outside every jurisdiction.
fn central_zone_mission(prep_min: u32) -> (GeoPoint, DispatchPlan) {
    let patient = GeoPoint::new(12.97245, 77.59397);
    let start = GeoPoint::new(12.9700, 77.5920);
    let facility = facility_outside_zones();
    let route = vec![start, patient, GeoPoint::new(facility.lat, facility.lng)];
    (patient, plan(prep_min, route, facility, 12.0))
}

/// A short mission far away from all jurisdictions.
fn remote_mission(prep_min: u32, eta: f64) -> (GeoPoint, DispatchPlan) {
    let patient = GeoPoint::new(12.9000, 77.5000);
    let facility = Facility {
        id: "H2".to_string(),
        name: "Metro Hospital".to_string(),
        lat: 12.9010,
        lng: 77.5010,
    };
    let route = vec![
        GeoPoint::new(12.8995, 77.4995),
        patient,
        GeoPoint::new(facility.lat, facility.lng),
    ];
    (patient, plan(prep_min, route, facility, eta))
}

fn engine_with(
    plan: DispatchPlan,
    refreshed_eta: Option<f64>,
) -> MissionEngine<StubPlanner> {
    MissionEngine::new(
        StubPlanner {
            plan,
            refreshed_eta,
        },
        ZoneMap::bengaluru(),
        test_config(),
    )
}

#[tokio::test]
async fn test_dispatch_failure_halts_mission() {
    let engine = MissionEngine::new(FailingPlanner, ZoneMap::bengaluru(), test_config());

    let result = engine.dispatch(GeoPoint::new(12.97, 77.59)).await;
    assert!(result.is_err());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, MissionPhase::Idle);
    assert!(snapshot.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_prep_countdown_takes_exactly_three_ticks() {
    let (patient, dispatch_plan) = remote_mission(3, 15.0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();
    assert_eq!(engine.snapshot().phase, MissionPhase::Preparing);

    sleep(Duration::from_secs(61)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.phase, MissionPhase::Preparing);
    assert_eq!(snap.prep_remaining_min, 2);

    sleep(Duration::from_secs(60)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.phase, MissionPhase::Preparing);
    assert_eq!(snap.prep_remaining_min, 1);

    sleep(Duration::from_secs(60)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.prep_remaining_min, 0);
    // Rolled out, and never skipped the patient leg
    assert!(matches!(
        snap.phase,
        MissionPhase::ToPatient | MissionPhase::ToHospital
    ));
    // Each countdown tick also consumed a minute of ETA
    assert!(snap.eta_minutes.unwrap() <= 12.0);
}

#[tokio::test(start_paused = true)]
async fn test_mission_reaches_done_and_loops_stop() {
    let (patient, dispatch_plan) = remote_mission(0, 2.0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();

    let mut last_phase = MissionPhase::ToPatient;
    for _ in 0..300 {
        sleep(Duration::from_secs(1)).await;
        let snap = engine.snapshot();
        assert!(
            phase_ordinal(snap.phase) >= phase_ordinal(last_phase),
            "phase went backwards: {last_phase:?} -> {:?}",
            snap.phase
        );
        last_phase = snap.phase;
        if snap.phase == MissionPhase::Done {
            break;
        }
    }

    let done = engine.snapshot();
    assert_eq!(done.phase, MissionPhase::Done);
    assert_eq!(done.eta_minutes, Some(0.0));
    assert_eq!(done.progress_pct, 100.0);

    // All leg loops were shut down; nothing mutates state anymore
    let speed_at_done = done.speed_kmph;
    sleep(Duration::from_secs(30)).await;
    let later = engine.snapshot();
    assert_eq!(later.phase, MissionPhase::Done);
    assert_eq!(later.speed_kmph, speed_at_done);
}

#[tokio::test(start_paused = true)]
async fn test_zone_entry_times_out_without_decision() {
    let (patient, dispatch_plan) = central_zone_mission(0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();
    sleep(Duration::from_millis(1100)).await;

    let snap = engine.snapshot();
    let active = snap.active_clearance.expect("zone entry should open a request");
    assert_eq!(active.zone, "Central Zone");
    assert_eq!(active.status, ClearanceStatus::Pending);
    assert_eq!(snap.active_zone.as_deref(), Some("Central Zone"));
    assert_eq!(
        snap.clearance_history
            .iter()
            .filter(|r| r.status == ClearanceStatus::Pending)
            .count(),
        1
    );

    // Let the SLA window lapse with no decision
    sleep(Duration::from_secs(9)).await;

    let snap = engine.snapshot();
    let request = snap
        .clearance_history
        .iter()
        .find(|r| r.id == active.id)
        .expect("request stays in history");
    assert_eq!(request.status, ClearanceStatus::Timeout);
    assert!((request.response_secs.unwrap() - 8.0).abs() < 1e-9);
    assert_eq!(
        snap.active_clearance.unwrap().status,
        ClearanceStatus::Timeout,
        "active request and history must not diverge"
    );
}

#[tokio::test(start_paused = true)]
async fn test_approval_within_sla_is_acked() {
    let (patient, dispatch_plan) = central_zone_mission(0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();
    sleep(Duration::from_secs(2)).await;

    assert!(engine.approve_clearance());

    let snap = engine.snapshot();
    let request = snap.active_clearance.unwrap();
    assert_eq!(request.status, ClearanceStatus::Acked);
    assert!(request.response_secs.unwrap() < 8.0);

    // A second decision on a terminal request is ignored
    assert!(!engine.reject_clearance());

    // The racing SLA timer must not overwrite the decision
    sleep(Duration::from_secs(10)).await;
    let snap = engine.snapshot();
    let after = snap
        .clearance_history
        .iter()
        .find(|r| r.id == request.id)
        .unwrap();
    assert_eq!(after.status, ClearanceStatus::Acked);
    assert_eq!(after.response_secs, request.response_secs);
}

#[tokio::test(start_paused = true)]
async fn test_rejection_is_distinct_from_timeout() {
    let (patient, dispatch_plan) = central_zone_mission(0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert!(engine.reject_clearance());
    sleep(Duration::from_secs(10)).await;

    let snap = engine.snapshot();
    assert_eq!(
        snap.active_clearance.unwrap().status,
        ClearanceStatus::Rejected
    );
}

#[tokio::test(start_paused = true)]
async fn test_eta_refresh_overrides_local_countdown() {
    // Long mission so a leg is still active at the refresh cadence
    let patient = GeoPoint::new(12.9000, 77.5000);
    let facility = Facility {
        id: "H2".to_string(),
        name: "Metro Hospital".to_string(),
        lat: 12.9500,
        lng: 77.5500,
    };
    let route = vec![
        GeoPoint::new(12.8500, 77.4500),
        patient,
        GeoPoint::new(facility.lat, facility.lng),
    ];
    let dispatch_plan = plan(0, route, facility, 90.0);
    let engine = engine_with(dispatch_plan, Some(42.0));

    engine.dispatch(patient).await.unwrap();
    sleep(Duration::from_secs(130)).await;

    let snap = engine.snapshot();
    assert!(snap.phase.is_moving());
    let eta = snap.eta_minutes.unwrap();
    assert!(eta < 50.0, "server ETA should have replaced the local one, got {eta}");
}

#[tokio::test(start_paused = true)]
async fn test_eta_refresh_failure_is_soft() {
    let patient = GeoPoint::new(12.9000, 77.5000);
    let facility = Facility {
        id: "H2".to_string(),
        name: "Metro Hospital".to_string(),
        lat: 12.9500,
        lng: 77.5500,
    };
    let route = vec![
        GeoPoint::new(12.8500, 77.4500),
        patient,
        GeoPoint::new(facility.lat, facility.lng),
    ];
    let dispatch_plan = plan(0, route, facility, 90.0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();
    sleep(Duration::from_secs(130)).await;

    let snap = engine.snapshot();
    assert!(snap.error.is_none());
    // Local countdown kept running: 130 ticks of 1/60 min each
    let eta = snap.eta_minutes.unwrap();
    assert!(eta > 85.0 && eta < 90.0, "got {eta}");
}

#[tokio::test(start_paused = true)]
async fn test_new_dispatch_preserves_history_reset_clears_it() {
    let (patient, dispatch_plan) = central_zone_mission(0);
    let engine = engine_with(dispatch_plan, None);

    engine.dispatch(patient).await.unwrap();
    sleep(Duration::from_secs(10)).await; // request opened and timed out

    let history_len = engine.snapshot().clearance_history.len();
    assert!(history_len >= 1);

    // A new dispatch keeps prior requests, drops only the active one
    engine.dispatch(patient).await.unwrap();
    let snap = engine.snapshot();
    assert!(snap.clearance_history.len() >= history_len);

    engine.reset();
    let snap = engine.snapshot();
    assert_eq!(snap.phase, MissionPhase::Idle);
    assert!(snap.clearance_history.is_empty());
    assert!(snap.active_clearance.is_none());
}

fn phase_ordinal(phase: MissionPhase) -> u8 {
    match phase {
        MissionPhase::Idle => 0,
        MissionPhase::Preparing => 1,
        MissionPhase::ToPatient => 2,
        MissionPhase::ToHospital => 3,
        MissionPhase::Done => 4,
    }
}
