//! The mission engine: public control surface over the shared state and
//! its background loops.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;

use ems_core::mission::Mission;
use ems_core::models::GeoPoint;
use ems_core::zones::ZoneMap;
use ems_planner::RoutePlanner;

use crate::config::Config;
use crate::loops::eta_refresh_loop::run_eta_refresh_loop;
use crate::loops::movement_loop::run_movement_loop;
use crate::loops::prep_loop::run_prep_loop;
use crate::loops::speed_loop::run_speed_loop;
use crate::snapshot::MissionSnapshot;
use crate::state::AppState;

/// Orchestrates one mission at a time against a route-planning
/// collaborator.
pub struct MissionEngine<P> {
    state: Arc<AppState>,
    planner: Arc<P>,
    zones: ZoneMap,
    config: Config,
}

impl<P: RoutePlanner + 'static> MissionEngine<P> {
    pub fn new(planner: P, zones: ZoneMap, config: Config) -> Self {
        Self {
            state: Arc::new(AppState::new()),
            planner: Arc::new(planner),
            zones,
            config,
        }
    }

    /// Request a dispatch for a patient location and start the mission
    /// loops.
    ///
    /// A planner failure halts the mission before it starts: the error is
    /// published on the snapshot channel and returned.
    pub async fn dispatch(&self, patient: GeoPoint) -> Result<MissionSnapshot> {
        let plan = match self.planner.plan(patient).await {
            Ok(plan) => plan,
            Err(err) => {
                tracing::error!(error = %err, "Dispatch call failed");
                self.state.publish_error(err.to_string());
                return Err(err.context("Dispatch failed"));
            }
        };

        let mission = match Mission::from_plan(patient, plan) {
            Ok(mission) => mission,
            Err(err) => {
                tracing::error!(error = %err, "Dispatch response unusable");
                self.state.publish_error(err.to_string());
                return Err(anyhow::Error::from(err).context("Dispatch failed"));
            }
        };

        tracing::info!(
            vehicle = %mission.vehicle.id,
            facility = %mission.facility.name,
            eta_min = mission.eta_minutes,
            prep_min = mission.prep_remaining_min,
            "Dispatch accepted"
        );

        let shutdown = self.state.begin_mission(mission, self.zones.clone());
        tokio::spawn(run_movement_loop(
            self.state.clone(),
            self.config.clearance_sla_secs,
            shutdown.subscribe(),
        ));
        tokio::spawn(run_speed_loop(self.state.clone(), shutdown.subscribe()));
        tokio::spawn(run_prep_loop(self.state.clone(), shutdown.subscribe()));
        tokio::spawn(run_eta_refresh_loop(
            self.state.clone(),
            self.planner.clone(),
            shutdown.subscribe(),
        ));

        Ok(self.state.snapshot())
    }

    /// Approve the pending clearance request. Ignored (returning false)
    /// unless a request is pending.
    pub fn approve_clearance(&self) -> bool {
        self.state.approve_clearance()
    }

    /// Reject the pending clearance request. Ignored unless pending.
    pub fn reject_clearance(&self) -> bool {
        self.state.reject_clearance()
    }

    /// Tear down the mission and clear all state, including clearance
    /// history.
    pub fn reset(&self) {
        self.state.reset();
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MissionSnapshot> {
        self.state.subscribe()
    }

    /// Shared state handle, for collaborators that only consume snapshots
    /// and issue clearance decisions.
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }
}
