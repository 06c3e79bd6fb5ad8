pub mod clearance;
pub mod error;
pub mod geofence;
pub mod mission;
pub mod models;
pub mod movement;
pub mod spatial;
pub mod zones;

pub use clearance::{ClearanceOutcome, ClearancePlatform, ClearanceRequest, ClearanceStatus};
pub use error::{ClearanceError, MissionError};
pub use geofence::{GeofenceMonitor, ZoneEvent};
pub use mission::Mission;
pub use models::{
    DispatchPlan, Facility, GeoPoint, MissionPhase, Vehicle, ZoneTransition,
};
pub use movement::{advance, step_km};
pub use spatial::distance_km;
pub use zones::{Zone, ZoneMap};
