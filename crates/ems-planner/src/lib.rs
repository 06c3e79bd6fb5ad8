//! Client surface for the external route-planning backend.
//!
//! The backend is a black box: it picks a vehicle and a facility, computes
//! a route, and estimates the ETA. The engine only depends on the
//! [`RoutePlanner`] trait, so the HTTP client can be swapped for a local
//! simulation.

pub mod client;

use std::future::Future;

use anyhow::Result;
use ems_core::models::{DispatchPlan, Facility, GeoPoint, MissionPhase};

pub use client::PlannerClient;

/// Inputs to a traffic-aware ETA refresh.
#[derive(Debug, Clone)]
pub struct EtaQuery {
    pub position: GeoPoint,
    pub phase: MissionPhase,
    pub patient: GeoPoint,
    pub facility: Facility,
}

/// A route-planning collaborator.
pub trait RoutePlanner: Send + Sync {
    /// Request a dispatch for a patient location.
    fn plan(&self, patient: GeoPoint) -> impl Future<Output = Result<DispatchPlan>> + Send;

    /// Best-effort ETA recomputation for the moving vehicle, in minutes.
    fn refresh_eta(&self, query: EtaQuery) -> impl Future<Output = Result<f64>> + Send;
}
