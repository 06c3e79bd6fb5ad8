//! Shared mission state behind a single-writer lock.
//!
//! Every timer callback and control action mutates the aggregate through
//! this type, one at a time, and each mutation republishes the snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::{broadcast, watch};

use ems_core::clearance::{ClearanceOutcome, ClearancePlatform};
use ems_core::geofence::{GeofenceMonitor, ZoneEvent};
use ems_core::mission::Mission;
use ems_core::models::MissionPhase;
use ems_core::zones::ZoneMap;
use ems_planner::EtaQuery;

use crate::snapshot::MissionSnapshot;

/// Handle for the SLA timer of a freshly opened clearance request.
#[derive(Debug, Clone)]
pub struct SlaTicket {
    pub request_id: String,
    pub generation: u64,
}

struct MissionState {
    mission: Mission,
    monitor: GeofenceMonitor,
    clearance: ClearancePlatform,
    generation: u64,
    shutdown: broadcast::Sender<()>,
}

/// Application state - the single Mission + ClearancePlatform aggregate.
pub struct AppState {
    inner: Mutex<Option<MissionState>>,
    snapshot_tx: watch::Sender<MissionSnapshot>,
    generation: AtomicU64,
}

impl AppState {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(MissionSnapshot::idle());
        Self {
            inner: Mutex::new(None),
            snapshot_tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Subscribe to per-tick snapshots.
    pub fn subscribe(&self) -> watch::Receiver<MissionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> MissionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Install a new mission, replacing any previous one.
    ///
    /// Loops of the previous mission are shut down and its clearance
    /// history is carried over (only the active request is dropped).
    /// Returns the shutdown channel the new mission's loops subscribe to.
    pub fn begin_mission(&self, mission: Mission, zones: ZoneMap) -> broadcast::Sender<()> {
        let (shutdown, _) = broadcast::channel(4);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Ok(mut guard) = self.inner.lock() else {
            return shutdown;
        };

        let mut clearance = match guard.take() {
            Some(previous) => {
                let _ = previous.shutdown.send(());
                previous.clearance
            }
            None => ClearancePlatform::new(),
        };
        clearance.clear_active();

        let state = MissionState {
            mission,
            monitor: GeofenceMonitor::new(zones),
            clearance,
            generation,
            shutdown: shutdown.clone(),
        };
        let snapshot = MissionSnapshot::capture(&state.mission, &state.monitor, &state.clearance);
        *guard = Some(state);
        drop(guard);

        let _ = self.snapshot_tx.send_replace(snapshot);
        shutdown
    }

    /// One movement tick: advance the position, run geofence detection,
    /// and open a clearance request on zone entry.
    ///
    /// Returns a ticket when a request was opened so the caller can start
    /// its SLA timer.
    pub fn movement_tick(&self) -> Option<SlaTicket> {
        let Ok(mut guard) = self.inner.lock() else {
            return None;
        };
        let state = guard.as_mut()?;

        let transition = state.mission.advance_tick();
        let mut ticket = None;

        if let Some(position) = state.mission.position {
            match state.monitor.observe(position, Utc::now()) {
                Some(ZoneEvent::Entered { zone_name, at, .. }) => {
                    tracing::info!(zone = %zone_name, "Entered jurisdiction, requesting clearance");
                    let request = state.clearance.open(&zone_name, at);
                    ticket = Some(SlaTicket {
                        request_id: request.id,
                        generation: state.generation,
                    });
                }
                Some(ZoneEvent::Exited { zone_name, .. }) => {
                    tracing::info!(zone = %zone_name, "Left jurisdiction");
                }
                None => {}
            }
        }

        match transition {
            Some(MissionPhase::ToHospital) => {
                tracing::info!("Patient reached, proceeding to facility");
            }
            Some(MissionPhase::Done) => {
                tracing::info!("Patient delivered, mission complete");
                let _ = state.shutdown.send(());
            }
            _ => {}
        }

        self.publish(guard.as_ref());
        ticket
    }

    /// One preparation countdown tick.
    pub fn prep_tick(&self) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let Some(state) = guard.as_mut() else {
            return;
        };

        if let Some(phase) = state.mission.prep_tick() {
            tracing::info!(?phase, "Crew ready, rolling out");
        }
        self.publish(guard.as_ref());
    }

    /// Resample the travel speed if a leg is active.
    pub fn resample_speed(&self) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let Some(state) = guard.as_mut() else {
            return;
        };

        if state.mission.is_moving() {
            let speed = state.mission.resample_speed();
            tracing::debug!(speed_kmph = speed, "Speed resampled");
            self.publish(guard.as_ref());
        }
    }

    /// Inputs for an external ETA refresh, or `None` when no leg is
    /// active. The generation ties the eventual result back to this
    /// mission.
    pub fn refresh_query(&self) -> Option<(u64, EtaQuery)> {
        let Ok(guard) = self.inner.lock() else {
            return None;
        };
        let state = guard.as_ref()?;
        if !state.mission.is_moving() {
            return None;
        }

        Some((
            state.generation,
            EtaQuery {
                position: state.mission.position?,
                phase: state.mission.phase,
                patient: state.mission.patient,
                facility: state.mission.facility.clone(),
            },
        ))
    }

    /// Apply a server-provided ETA unless the mission changed underneath
    /// the in-flight refresh.
    pub fn apply_eta_refresh(&self, generation: u64, eta_minutes: f64) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let Some(state) = guard.as_mut() else {
            return;
        };
        if state.generation != generation {
            tracing::debug!("Discarding stale ETA refresh");
            return;
        }

        state.mission.apply_eta_refresh(eta_minutes);
        self.publish(guard.as_ref());
    }

    /// Approve the pending clearance request. Returns false (and leaves
    /// state untouched) when nothing is pending.
    pub fn approve_clearance(&self) -> bool {
        self.resolve_active(ClearanceOutcome::Approved)
    }

    /// Reject the pending clearance request.
    pub fn reject_clearance(&self) -> bool {
        self.resolve_active(ClearanceOutcome::Rejected)
    }

    fn resolve_active(&self, outcome: ClearanceOutcome) -> bool {
        let Ok(mut guard) = self.inner.lock() else {
            return false;
        };
        let Some(state) = guard.as_mut() else {
            return false;
        };

        match state.clearance.resolve_active(outcome, Utc::now()) {
            Ok(request) => {
                tracing::info!(
                    zone = %request.zone,
                    status = ?request.status,
                    response_secs = request.response_secs,
                    "Clearance resolved"
                );
                self.publish(guard.as_ref());
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring clearance decision");
                false
            }
        }
    }

    /// SLA expiry for a clearance request. A stale timer (mission
    /// replaced, or request already resolved) is a no-op.
    ///
    /// The recorded resolution time is the SLA deadline itself, so the
    /// response time reflects the agreed window rather than timer
    /// scheduling jitter.
    pub fn expire_clearance(&self, request_id: &str, generation: u64, sla_secs: u64) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let Some(state) = guard.as_mut() else {
            return;
        };
        if state.generation != generation {
            tracing::debug!("Discarding SLA timer from a previous mission");
            return;
        }

        let Some(requested_at) = state
            .clearance
            .history()
            .iter()
            .find(|r| r.id == request_id)
            .map(|r| r.requested_at)
        else {
            return;
        };

        let deadline = requested_at + ChronoDuration::seconds(sla_secs as i64);
        match state
            .clearance
            .resolve(request_id, ClearanceOutcome::TimedOut, deadline)
        {
            Ok(request) => {
                tracing::warn!(zone = %request.zone, "Clearance SLA breached");
                self.publish(guard.as_ref());
            }
            // The external decision won the race
            Err(_) => {}
        }
    }

    /// Tear down the current mission and clear all state, clearance
    /// history included.
    pub fn reset(&self) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        if let Some(state) = guard.take() {
            let _ = state.shutdown.send(());
        }
        drop(guard);
        let _ = self.snapshot_tx.send_replace(MissionSnapshot::idle());
    }

    /// Publish a mission-level error (dispatch failure) without starting
    /// a mission.
    pub fn publish_error(&self, message: impl Into<String>) {
        let mut snapshot = self.snapshot();
        snapshot.error = Some(message.into());
        let _ = self.snapshot_tx.send_replace(snapshot);
    }

    fn publish(&self, state: Option<&MissionState>) {
        let snapshot = match state {
            Some(s) => MissionSnapshot::capture(&s.mission, &s.monitor, &s.clearance),
            None => MissionSnapshot::idle(),
        };
        let _ = self.snapshot_tx.send_replace(snapshot);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
