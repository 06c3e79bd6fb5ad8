//! Simulated clearance authority.
//!
//! Watches the snapshot stream and answers pending clearance requests
//! after a human-ish delay. Occasionally it stays silent so the SLA
//! timeout path gets exercised too.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use ems_core::clearance::ClearanceStatus;
use ems_engine::AppState;

const MIN_DELAY_SECS: f64 = 2.0;
const MAX_DELAY_SECS: f64 = 6.0;
const REJECT_PROBABILITY: f64 = 0.1;
const IGNORE_PROBABILITY: f64 = 0.1;

pub async fn run_responder(state: Arc<AppState>) {
    let mut rx = state.subscribe();
    let mut last_seen: Option<String> = None;

    loop {
        if rx.changed().await.is_err() {
            break;
        }

        let pending = {
            let snapshot = rx.borrow_and_update();
            snapshot
                .active_clearance
                .as_ref()
                .filter(|r| r.status == ClearanceStatus::Pending)
                .cloned()
        };
        let Some(request) = pending else {
            continue;
        };
        if last_seen.as_deref() == Some(request.id.as_str()) {
            continue;
        }
        last_seen = Some(request.id.clone());

        let roll: f64 = rand::rng().random_range(0.0..1.0);
        if roll < IGNORE_PROBABILITY {
            tracing::info!(zone = %request.zone, "Authority busy, letting the SLA run");
            continue;
        }

        let delay = rand::rng().random_range(MIN_DELAY_SECS..MAX_DELAY_SECS);
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;

        if roll < IGNORE_PROBABILITY + REJECT_PROBABILITY {
            if state.reject_clearance() {
                tracing::info!(zone = %request.zone, "Authority rejected clearance");
            }
        } else if state.approve_clearance() {
            tracing::info!(zone = %request.zone, "Authority granted clearance");
        }
    }
}
