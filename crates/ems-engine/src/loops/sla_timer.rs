//! One-shot SLA timer for a clearance request.

use std::sync::Arc;
use std::time::Duration;

use crate::state::{AppState, SlaTicket};

/// Sleep out the SLA window, then time the request out unless an external
/// decision resolved it first. Resolution is a compare-and-swap, so the
/// losing path is a no-op.
pub async fn run_sla_timer(state: Arc<AppState>, ticket: SlaTicket, sla_secs: u64) {
    tokio::time::sleep(Duration::from_secs(sla_secs)).await;
    state.expire_clearance(&ticket.request_id, ticket.generation, sla_secs);
}
