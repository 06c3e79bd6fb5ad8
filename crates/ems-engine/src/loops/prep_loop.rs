//! Crew preparation countdown loop, one tick per minute.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

const PREP_TICK_SECS: u64 = 60;

pub async fn run_prep_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(Duration::from_secs(PREP_TICK_SECS));
    // The interval fires immediately; the first countdown tick must land
    // a full minute after dispatch.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!("Prep loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.prep_tick();
            }
        }
    }
}
