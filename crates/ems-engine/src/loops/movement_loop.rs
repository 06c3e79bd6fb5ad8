//! Position advancement loop.
//!
//! Ticks the movement model once per second, feeds the new position to
//! the geofence monitor, and starts an SLA timer for every clearance
//! request a zone entry opens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::loops::sla_timer::run_sla_timer;
use crate::state::AppState;

const MOVE_TICK_SECS: u64 = 1;

pub async fn run_movement_loop(
    state: Arc<AppState>,
    clearance_sla_secs: u64,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_secs(MOVE_TICK_SECS));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!("Movement loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Some(ticket) = state.movement_tick() {
                    tokio::spawn(run_sla_timer(
                        state.clone(),
                        ticket,
                        clearance_sla_secs,
                    ));
                }
            }
        }
    }
}
