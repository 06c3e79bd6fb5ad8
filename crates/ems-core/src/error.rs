//! Error types for defensive rejection of invalid state changes.

use thiserror::Error;

use crate::models::MissionPhase;

#[derive(Debug, Error)]
pub enum MissionError {
    /// Phases only move forward through adjacent states; anything else is
    /// caller misuse and is rejected without touching state.
    #[error("phase transition {from:?} -> {to:?} is not allowed")]
    PhaseTransition {
        from: MissionPhase,
        to: MissionPhase,
    },

    #[error("dispatch plan contains an empty route")]
    EmptyRoute,
}

#[derive(Debug, Error)]
pub enum ClearanceError {
    #[error("clearance request {id} is already resolved")]
    AlreadyResolved { id: String },

    #[error("unknown clearance request {id}")]
    UnknownRequest { id: String },

    #[error("no active clearance request")]
    NoActiveRequest,
}
