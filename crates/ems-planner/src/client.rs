//! Dispatch backend HTTP client.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ems_core::models::{DispatchPlan, Facility, GeoPoint, Vehicle};

use crate::{EtaQuery, RoutePlanner};

const HTTP_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the route-planning backend.
pub struct PlannerClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchRequest {
    patient_lat: f64,
    patient_lng: f64,
}

#[derive(Debug, Deserialize)]
struct AmbulanceDto {
    id: String,
    #[serde(rename = "prepTime", default)]
    prep_time: u32,
}

#[derive(Debug, Deserialize)]
struct DispatchResponse {
    ambulance: AmbulanceDto,
    hospital: Facility,
    route: Vec<[f64; 2]>,
    eta: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EtaRefreshRequest {
    lat: f64,
    lng: f64,
    phase: ems_core::models::MissionPhase,
    patient_loc: [f64; 2],
    hospital_loc: Facility,
}

#[derive(Debug, Deserialize)]
struct EtaRefreshResponse {
    eta: f64,
}

impl PlannerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn dispatch(&self, patient: GeoPoint) -> Result<DispatchPlan> {
        let url = format!("{}/api/dispatch", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&DispatchRequest {
                patient_lat: patient.lat,
                patient_lng: patient.lng,
            })
            .send()
            .await
            .context("Dispatch request failed")?
            .error_for_status()
            .context("Dispatch request rejected")?;

        let payload: DispatchResponse = response
            .json()
            .await
            .context("Malformed dispatch response")?;

        if payload.route.is_empty() {
            bail!("Dispatch response carried an empty route");
        }

        Ok(DispatchPlan {
            vehicle: Vehicle {
                id: payload.ambulance.id,
                prep_time_min: payload.ambulance.prep_time,
            },
            facility: payload.hospital,
            route: payload
                .route
                .into_iter()
                .map(|[lat, lng]| GeoPoint::new(lat, lng))
                .collect(),
            eta_minutes: payload.eta,
        })
    }

    async fn eta(&self, query: EtaQuery) -> Result<f64> {
        let url = format!("{}/api/refresh-eta", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EtaRefreshRequest {
                lat: query.position.lat,
                lng: query.position.lng,
                phase: query.phase,
                patient_loc: [query.patient.lat, query.patient.lng],
                hospital_loc: query.facility,
            })
            .send()
            .await
            .context("ETA refresh request failed")?
            .error_for_status()
            .context("ETA refresh rejected")?;

        let payload: EtaRefreshResponse =
            response.json().await.context("Malformed ETA response")?;
        Ok(payload.eta)
    }
}

impl RoutePlanner for PlannerClient {
    async fn plan(&self, patient: GeoPoint) -> Result<DispatchPlan> {
        tracing::debug!(lat = patient.lat, lng = patient.lng, "Requesting dispatch");
        self.dispatch(patient).await
    }

    async fn refresh_eta(&self, query: EtaQuery) -> Result<f64> {
        self.eta(query).await
    }
}
