//! In-process fleet planner standing in for the route-planning backend.
//!
//! Reproduces the backend's selection logic against a seeded fleet: best
//! ambulance by prep plus estimated travel time, nearest hospital, and a
//! two-leg route of interpolated straight segments.

use anyhow::{bail, Result};
use rand::Rng;

use ems_core::models::{DispatchPlan, Facility, GeoPoint, MissionPhase, Vehicle};
use ems_core::spatial::distance_km;
use ems_planner::{EtaQuery, RoutePlanner};

/// Spacing between generated route waypoints.
const WAYPOINT_SPACING_KM: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbulanceStatus {
    Available,
    Preparing,
}

#[derive(Debug, Clone)]
pub struct SimAmbulance {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: AmbulanceStatus,
    pub prep_time_min: u32,
}

impl SimAmbulance {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Simulated planner over a fixed fleet.
#[derive(Debug, Clone)]
pub struct SimPlanner {
    pub ambulances: Vec<SimAmbulance>,
    pub hospitals: Vec<Facility>,
    pub avg_speed_kmph: f64,
}

impl Default for SimPlanner {
    fn default() -> Self {
        Self {
            ambulances: vec![
                SimAmbulance {
                    id: "A1".to_string(),
                    lat: 12.975,
                    lng: 77.59,
                    status: AmbulanceStatus::Available,
                    prep_time_min: 2,
                },
                SimAmbulance {
                    id: "A2".to_string(),
                    lat: 12.965,
                    lng: 77.60,
                    status: AmbulanceStatus::Available,
                    prep_time_min: 1,
                },
                SimAmbulance {
                    id: "A3".to_string(),
                    lat: 12.985,
                    lng: 77.58,
                    status: AmbulanceStatus::Preparing,
                    prep_time_min: 4,
                },
            ],
            hospitals: vec![
                Facility {
                    id: "H1".to_string(),
                    name: "City Hospital".to_string(),
                    lat: 12.972,
                    lng: 77.585,
                },
                Facility {
                    id: "H2".to_string(),
                    name: "Metro Hospital".to_string(),
                    lat: 12.98,
                    lng: 77.605,
                },
            ],
            avg_speed_kmph: 40.0,
        }
    }
}

impl SimPlanner {
    fn travel_minutes(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        distance_km(from, to) / self.avg_speed_kmph * 60.0
    }

    fn best_ambulance(&self, patient: GeoPoint) -> Result<&SimAmbulance> {
        let mut best: Option<(&SimAmbulance, f64)> = None;
        for amb in &self.ambulances {
            if amb.status != AmbulanceStatus::Available {
                continue;
            }
            let eta = amb.prep_time_min as f64 + self.travel_minutes(amb.position(), patient);
            if best.map(|(_, b)| eta < b).unwrap_or(true) {
                best = Some((amb, eta));
            }
        }
        match best {
            Some((amb, _)) => Ok(amb),
            None => bail!("No available ambulances"),
        }
    }

    fn nearest_hospital(&self, patient: GeoPoint) -> Result<&Facility> {
        let mut best: Option<(&Facility, f64)> = None;
        for hosp in &self.hospitals {
            let minutes = self.travel_minutes(patient, hosp.position());
            if best.map(|(_, b)| minutes < b).unwrap_or(true) {
                best = Some((hosp, minutes));
            }
        }
        match best {
            Some((hosp, _)) => Ok(hosp),
            None => bail!("No reachable hospitals"),
        }
    }
}

/// Interpolate a straight segment into evenly spaced waypoints, start and
/// end included.
fn segment(from: GeoPoint, to: GeoPoint) -> Vec<GeoPoint> {
    let dist = distance_km(from, to);
    let steps = ((dist / WAYPOINT_SPACING_KM).ceil() as usize).max(1);

    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            GeoPoint::new(
                from.lat + (to.lat - from.lat) * t,
                from.lng + (to.lng - from.lng) * t,
            )
        })
        .collect()
}

impl RoutePlanner for SimPlanner {
    async fn plan(&self, patient: GeoPoint) -> Result<DispatchPlan> {
        let ambulance = self.best_ambulance(patient)?;
        let hospital = self.nearest_hospital(patient)?.clone();

        let mut route = segment(ambulance.position(), patient);
        route.extend(segment(patient, hospital.position()).into_iter().skip(1));

        let eta_minutes = self.travel_minutes(ambulance.position(), patient)
            + self.travel_minutes(patient, hospital.position());

        Ok(DispatchPlan {
            vehicle: Vehicle {
                id: ambulance.id.clone(),
                prep_time_min: ambulance.prep_time_min,
            },
            facility: hospital,
            route,
            eta_minutes,
        })
    }

    async fn refresh_eta(&self, query: EtaQuery) -> Result<f64> {
        let mut remaining = match query.phase {
            MissionPhase::ToPatient => {
                self.travel_minutes(query.position, query.patient)
                    + self.travel_minutes(query.patient, query.facility.position())
            }
            MissionPhase::ToHospital => {
                self.travel_minutes(query.position, query.facility.position())
            }
            _ => bail!("No leg active"),
        };

        // Traffic wobble
        remaining *= rand::rng().random_range(0.9..1.2);
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_ambulance_accounts_for_prep() {
        let planner = SimPlanner::default();
        // Patient halfway between A1 and A2; A2's shorter prep wins
        let patient = GeoPoint::new(12.970, 77.595);
        let amb = planner.best_ambulance(patient).unwrap();
        assert_eq!(amb.id, "A2");
    }

    #[test]
    fn test_unavailable_ambulances_are_skipped() {
        let mut planner = SimPlanner::default();
        for amb in &mut planner.ambulances {
            if amb.id != "A3" {
                amb.status = AmbulanceStatus::Preparing;
            }
        }
        // Only A3 remains, and it is not available either
        assert!(planner.best_ambulance(GeoPoint::new(12.97, 77.59)).is_err());
    }

    #[test]
    fn test_nearest_hospital() {
        let planner = SimPlanner::default();
        let near_city = GeoPoint::new(12.9715, 77.5855);
        assert_eq!(planner.nearest_hospital(near_city).unwrap().id, "H1");

        let near_metro = GeoPoint::new(12.9795, 77.6045);
        assert_eq!(planner.nearest_hospital(near_metro).unwrap().id, "H2");
    }

    #[test]
    fn test_segment_endpoints_and_spacing() {
        let from = GeoPoint::new(12.97, 77.59);
        let to = GeoPoint::new(12.98, 77.60);
        let points = segment(from, to);

        assert_eq!(points.first().copied(), Some(from));
        assert_eq!(points.last().copied(), Some(to));
        for pair in points.windows(2) {
            assert!(distance_km(pair[0], pair[1]) <= WAYPOINT_SPACING_KM + 1e-6);
        }
    }

    #[tokio::test]
    async fn test_plan_produces_two_leg_route() {
        let planner = SimPlanner::default();
        let patient = GeoPoint::new(12.9724, 77.5940);

        let plan = planner.plan(patient).await.unwrap();
        assert!(!plan.route.is_empty());
        assert!(plan.eta_minutes > 0.0);

        // The route passes through the patient location
        let closest = plan
            .route
            .iter()
            .map(|wp| distance_km(*wp, patient))
            .fold(f64::INFINITY, f64::min);
        assert!(closest < 1e-6);
    }
}
