//! Traffic-variability loop: resamples the travel speed every few
//! seconds while a leg is active.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

const SPEED_RESAMPLE_SECS: u64 = 5;

pub async fn run_speed_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(Duration::from_secs(SPEED_RESAMPLE_SECS));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!("Speed loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.resample_speed();
            }
        }
    }
}
