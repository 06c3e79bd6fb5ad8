//! Aggregate state snapshot published to the presentation layer.

use serde::Serialize;

use ems_core::clearance::{ClearancePlatform, ClearanceRequest};
use ems_core::geofence::GeofenceMonitor;
use ems_core::mission::Mission;
use ems_core::models::{Facility, GeoPoint, MissionPhase, Vehicle, ZoneTransition};

/// Full Mission + ClearancePlatform view, republished on every tick.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSnapshot {
    pub phase: MissionPhase,
    pub position: Option<GeoPoint>,
    pub eta_minutes: Option<f64>,
    pub initial_eta_minutes: Option<f64>,
    pub progress_pct: f64,
    pub speed_kmph: f64,
    pub prep_remaining_min: u32,
    pub remaining_distance_km: f64,
    pub vehicle: Option<Vehicle>,
    pub facility: Option<Facility>,
    pub active_zone: Option<String>,
    pub predicted_zone: Option<String>,
    pub zone_timeline: Vec<ZoneTransition>,
    pub active_clearance: Option<ClearanceRequest>,
    pub clearance_history: Vec<ClearanceRequest>,
    /// Mission-level error (dispatch failure) that halted the mission.
    pub error: Option<String>,
}

impl MissionSnapshot {
    pub fn idle() -> Self {
        Self {
            phase: MissionPhase::Idle,
            position: None,
            eta_minutes: None,
            initial_eta_minutes: None,
            progress_pct: 0.0,
            speed_kmph: 0.0,
            prep_remaining_min: 0,
            remaining_distance_km: 0.0,
            vehicle: None,
            facility: None,
            active_zone: None,
            predicted_zone: None,
            zone_timeline: Vec::new(),
            active_clearance: None,
            clearance_history: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn capture(
        mission: &Mission,
        monitor: &GeofenceMonitor,
        clearance: &ClearancePlatform,
    ) -> Self {
        let predicted = mission
            .position
            .and_then(|pos| monitor.predicted_next(pos))
            .map(|zone| zone.name.clone());

        Self {
            phase: mission.phase,
            position: mission.position,
            eta_minutes: Some(mission.eta_minutes),
            initial_eta_minutes: Some(mission.initial_eta_minutes),
            progress_pct: mission.progress_pct(),
            speed_kmph: mission.speed_kmph,
            prep_remaining_min: mission.prep_remaining_min,
            remaining_distance_km: mission.remaining_distance_km(),
            vehicle: Some(mission.vehicle.clone()),
            facility: Some(mission.facility.clone()),
            active_zone: monitor.active_zone().map(|z| z.name.clone()),
            predicted_zone: predicted,
            zone_timeline: monitor.timeline().to_vec(),
            active_clearance: clearance.active().cloned(),
            clearance_history: clearance.history().to_vec(),
            error: None,
        }
    }
}
