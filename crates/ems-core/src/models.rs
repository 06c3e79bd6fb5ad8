//! Core data models for the dispatch system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// An ambulance assigned to a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    /// Crew preparation time before the vehicle can roll, in minutes.
    pub prep_time_min: u32,
}

/// A receiving hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Facility {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Result of a dispatch call against the route-planning backend.
///
/// The route covers both legs in order: vehicle start to patient, then
/// patient to facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub vehicle: Vehicle,
    pub facility: Facility,
    pub route: Vec<GeoPoint>,
    pub eta_minutes: f64,
}

/// Lifecycle phase of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionPhase {
    /// No mission in progress
    Idle,
    /// Crew preparing, countdown running
    Preparing,
    /// En route to the patient location
    ToPatient,
    /// Patient on board, en route to the facility
    ToHospital,
    /// Patient delivered
    Done,
}

impl MissionPhase {
    /// Position in the forward-only phase order.
    pub(crate) fn ordinal(self) -> u8 {
        match self {
            MissionPhase::Idle => 0,
            MissionPhase::Preparing => 1,
            MissionPhase::ToPatient => 2,
            MissionPhase::ToHospital => 3,
            MissionPhase::Done => 4,
        }
    }

    /// True while the vehicle is travelling a leg.
    pub fn is_moving(self) -> bool {
        matches!(self, MissionPhase::ToPatient | MissionPhase::ToHospital)
    }
}

/// A recorded jurisdiction zone entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneTransition {
    pub zone: String,
    pub at: DateTime<Utc>,
}
