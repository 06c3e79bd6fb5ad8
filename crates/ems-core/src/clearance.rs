//! Clearance request lifecycle for jurisdiction entries.
//!
//! Each zone entry opens a request against the clearance authority; the
//! request resolves through an external decision or SLA expiry, whichever
//! lands first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClearanceError;

/// Status of a clearance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClearanceStatus {
    /// Awaiting a decision
    Pending,
    /// Approved by the authority
    Acked,
    /// Explicitly denied by the authority
    Rejected,
    /// SLA expired without a decision
    Timeout,
}

impl ClearanceStatus {
    pub fn is_terminal(self) -> bool {
        self != ClearanceStatus::Pending
    }
}

/// How a pending request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearanceOutcome {
    Approved,
    Rejected,
    TimedOut,
}

impl ClearanceOutcome {
    fn status(self) -> ClearanceStatus {
        match self {
            ClearanceOutcome::Approved => ClearanceStatus::Acked,
            ClearanceOutcome::Rejected => ClearanceStatus::Rejected,
            ClearanceOutcome::TimedOut => ClearanceStatus::Timeout,
        }
    }
}

/// A clearance request for one jurisdiction entry.
///
/// Terminal requests are immutable; they stay in history and are never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceRequest {
    pub id: String,
    pub zone: String,
    pub status: ClearanceStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Seconds between request and resolution.
    pub response_secs: Option<f64>,
}

impl ClearanceRequest {
    fn new(zone: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            zone: zone.to_string(),
            status: ClearanceStatus::Pending,
            requested_at: now,
            resolved_at: None,
            response_secs: None,
        }
    }
}

/// The clearance authority's view of the mission: at most one active
/// request plus an append-only history of every request ever opened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearancePlatform {
    active: Option<ClearanceRequest>,
    history: Vec<ClearanceRequest>,
}

impl ClearancePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ClearanceRequest> {
        self.active.as_ref()
    }

    pub fn history(&self) -> &[ClearanceRequest] {
        &self.history
    }

    /// Open a new request for a zone entry and make it the active one.
    ///
    /// A still-pending prior request is replaced as the active request but
    /// remains resolvable in history by id.
    pub fn open(&mut self, zone: &str, now: DateTime<Utc>) -> ClearanceRequest {
        let request = ClearanceRequest::new(zone, now);
        self.history.push(request.clone());
        self.active = Some(request.clone());
        request
    }

    /// Resolve a request by id.
    ///
    /// The transition to a terminal status happens at most once: a request
    /// that already resolved rejects further resolutions, so racing SLA
    /// timers and external decisions cannot double-apply.
    pub fn resolve(
        &mut self,
        id: &str,
        outcome: ClearanceOutcome,
        now: DateTime<Utc>,
    ) -> Result<ClearanceRequest, ClearanceError> {
        let entry = self
            .history
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ClearanceError::UnknownRequest { id: id.to_string() })?;

        if entry.status.is_terminal() {
            return Err(ClearanceError::AlreadyResolved { id: id.to_string() });
        }

        entry.status = outcome.status();
        entry.resolved_at = Some(now);
        entry.response_secs = Some(
            (now - entry.requested_at)
                .num_milliseconds()
                .max(0) as f64
                / 1000.0,
        );
        let resolved = entry.clone();

        // History and the active request must never diverge for a shared id
        if let Some(active) = self.active.as_mut() {
            if active.id == id {
                *active = resolved.clone();
            }
        }

        Ok(resolved)
    }

    /// Resolve the currently active request, if it is still pending.
    pub fn resolve_active(
        &mut self,
        outcome: ClearanceOutcome,
        now: DateTime<Utc>,
    ) -> Result<ClearanceRequest, ClearanceError> {
        let id = self
            .active
            .as_ref()
            .map(|r| r.id.clone())
            .ok_or(ClearanceError::NoActiveRequest)?;
        self.resolve(&id, outcome, now)
    }

    /// Drop the active request while keeping history. Used when a new
    /// mission starts.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Full reset, clearing history as well.
    pub fn clear(&mut self) {
        self.active = None;
        self.history.clear();
    }
}
