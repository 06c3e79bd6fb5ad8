//! Mission state machine and per-tick bookkeeping.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MissionError;
use crate::models::{DispatchPlan, Facility, GeoPoint, MissionPhase, Vehicle};
use crate::movement;
use crate::spatial::distance_km;

/// Distance to the leg target that counts as arrival.
pub const ARRIVAL_RADIUS_KM: f64 = 0.05;
/// Distance to an intermediate waypoint that advances the route cursor.
pub const WAYPOINT_RADIUS_KM: f64 = 0.01;
/// Speed the vehicle starts with before the first resample.
pub const DEFAULT_SPEED_KMPH: f64 = 40.0;
/// Traffic-variability sampling bounds.
pub const SPEED_MIN_KMPH: f64 = 25.0;
pub const SPEED_MAX_KMPH: f64 = 60.0;
/// ETA decay per 1-second movement tick, in minutes.
pub const ETA_DECAY_PER_TICK_MIN: f64 = 1.0 / 60.0;

/// A single dispatch from request to delivery.
///
/// The phase only moves forward (IDLE, PREPARING, TO_PATIENT, TO_HOSPITAL,
/// DONE); a new dispatch replaces the mission rather than rewinding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub phase: MissionPhase,
    pub patient: GeoPoint,
    pub vehicle: Vehicle,
    pub facility: Facility,
    to_patient: Vec<GeoPoint>,
    to_facility: Vec<GeoPoint>,
    /// Index into the current leg's waypoints. Monotone within a leg,
    /// reset to 0 on leg change.
    pub route_cursor: usize,
    pub position: Option<GeoPoint>,
    pub eta_minutes: f64,
    pub initial_eta_minutes: f64,
    pub speed_kmph: f64,
    pub prep_remaining_min: u32,
}

impl Mission {
    /// Build a mission from a dispatch plan.
    ///
    /// The plan's route covers both legs in one sequence; it is split at
    /// the waypoint closest to the patient so each leg gets its own
    /// cursor. Starts in PREPARING when the vehicle needs prep time,
    /// otherwise rolls straight into TO_PATIENT.
    pub fn from_plan(patient: GeoPoint, plan: DispatchPlan) -> Result<Self, MissionError> {
        if plan.route.is_empty() {
            return Err(MissionError::EmptyRoute);
        }

        let mut split = 0;
        let mut best = f64::INFINITY;
        for (i, wp) in plan.route.iter().enumerate() {
            let d = distance_km(*wp, patient);
            if d < best {
                best = d;
                split = i;
            }
        }
        let to_patient = plan.route[..=split].to_vec();
        let to_facility = plan.route[split..].to_vec();

        let phase = if plan.vehicle.prep_time_min > 0 {
            MissionPhase::Preparing
        } else {
            MissionPhase::ToPatient
        };

        Ok(Self {
            phase,
            patient,
            prep_remaining_min: plan.vehicle.prep_time_min,
            vehicle: plan.vehicle,
            facility: plan.facility,
            position: to_patient.first().copied(),
            to_patient,
            to_facility,
            route_cursor: 0,
            eta_minutes: plan.eta_minutes,
            initial_eta_minutes: plan.eta_minutes,
            speed_kmph: DEFAULT_SPEED_KMPH,
        })
    }

    pub fn is_moving(&self) -> bool {
        self.phase.is_moving()
    }

    /// Waypoints of the leg currently being travelled.
    pub fn current_leg(&self) -> &[GeoPoint] {
        match self.phase {
            MissionPhase::ToHospital => &self.to_facility,
            _ => &self.to_patient,
        }
    }

    /// The destination of the current leg.
    pub fn leg_target(&self) -> GeoPoint {
        match self.phase {
            MissionPhase::ToHospital => self.facility.position(),
            _ => self.patient,
        }
    }

    /// Distance from the current position to the leg target, or zero when
    /// the vehicle is not travelling.
    pub fn remaining_distance_km(&self) -> f64 {
        match self.position {
            Some(pos) if self.is_moving() => distance_km(pos, self.leg_target()),
            _ => 0.0,
        }
    }

    /// Fraction of the initial ETA already consumed, clamped to [0, 100].
    pub fn progress_pct(&self) -> f64 {
        if self.initial_eta_minutes <= 0.0 {
            return 0.0;
        }
        ((self.initial_eta_minutes - self.eta_minutes) / self.initial_eta_minutes * 100.0)
            .clamp(0.0, 100.0)
    }

    /// Explicit phase transition, restricted to the immediate successor.
    ///
    /// Anything else is caller misuse and is rejected without touching
    /// state.
    pub fn try_transition(&mut self, to: MissionPhase) -> Result<(), MissionError> {
        if to.ordinal() != self.phase.ordinal() + 1 {
            return Err(MissionError::PhaseTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// One 1-second movement tick.
    ///
    /// Steps toward the current waypoint, advances the route cursor on
    /// waypoint arrival, decays the ETA, and switches legs when the
    /// vehicle comes within the arrival radius of the leg target (or the
    /// cursor exhausts the leg). Returns the new phase when a transition
    /// happened.
    pub fn advance_tick(&mut self) -> Option<MissionPhase> {
        if !self.is_moving() {
            return None;
        }

        let target = self.leg_target();
        let waypoint = self
            .current_leg()
            .get(self.route_cursor)
            .copied()
            .unwrap_or(target);

        let next = movement::advance(self.position, waypoint, movement::step_km(self.speed_kmph));
        self.position = Some(next);

        if self.route_cursor < self.current_leg().len()
            && distance_km(next, waypoint) < WAYPOINT_RADIUS_KM
        {
            self.route_cursor += 1;
        }

        self.eta_minutes = (self.eta_minutes - ETA_DECAY_PER_TICK_MIN).max(0.0);

        let arrived = distance_km(next, target) <= ARRIVAL_RADIUS_KM
            || self.route_cursor >= self.current_leg().len();
        if !arrived {
            return None;
        }

        match self.phase {
            MissionPhase::ToPatient => {
                self.phase = MissionPhase::ToHospital;
                self.route_cursor = 0;
                Some(self.phase)
            }
            MissionPhase::ToHospital => {
                self.phase = MissionPhase::Done;
                self.eta_minutes = 0.0;
                Some(self.phase)
            }
            _ => None,
        }
    }

    /// One 1-minute preparation countdown tick. Prep and ETA each lose a
    /// minute; hitting zero rolls the vehicle out.
    pub fn prep_tick(&mut self) -> Option<MissionPhase> {
        if self.phase != MissionPhase::Preparing {
            return None;
        }

        self.prep_remaining_min = self.prep_remaining_min.saturating_sub(1);
        self.eta_minutes = (self.eta_minutes - 1.0).max(0.0);

        if self.prep_remaining_min == 0 {
            self.phase = MissionPhase::ToPatient;
            return Some(self.phase);
        }
        None
    }

    /// Resample the travel speed to emulate traffic variability.
    pub fn resample_speed(&mut self) -> f64 {
        let mut rng = rand::rng();
        self.speed_kmph = rng.random_range(SPEED_MIN_KMPH..SPEED_MAX_KMPH);
        self.speed_kmph
    }

    /// Apply a server-provided ETA, replacing the locally computed one.
    pub fn apply_eta_refresh(&mut self, eta_minutes: f64) {
        if eta_minutes.is_finite() && eta_minutes >= 0.0 {
            self.eta_minutes = eta_minutes;
        }
    }
}
