//! Traffic-aware ETA refresh loop.
//!
//! Polls the route-planning backend every two minutes while a leg is
//! active. Failures are soft: the locally computed ETA keeps running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use ems_planner::RoutePlanner;

use crate::state::AppState;

const ETA_REFRESH_SECS: u64 = 120;

pub async fn run_eta_refresh_loop<P: RoutePlanner>(
    state: Arc<AppState>,
    planner: Arc<P>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_secs(ETA_REFRESH_SECS));
    // Skip the interval's immediate first fire; the dispatch ETA is fresh.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!("ETA refresh loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let Some((generation, query)) = state.refresh_query() else {
                    continue;
                };

                match planner.refresh_eta(query).await {
                    Ok(eta) => state.apply_eta_refresh(generation, eta),
                    Err(err) => {
                        tracing::debug!(error = %err, "ETA refresh failed");
                    }
                }
            }
        }
    }
}
