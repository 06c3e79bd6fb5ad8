//! Position advancement along a route.

use crate::models::GeoPoint;
use crate::spatial::distance_km;

/// Ticks per hour at the fixed 1-second tick period.
pub const TICKS_PER_HOUR: f64 = 3600.0;

/// Distance covered in one 1-second tick at the given speed.
pub fn step_km(speed_kmph: f64) -> f64 {
    speed_kmph / TICKS_PER_HOUR
}

/// Advance `current` toward `target` by `step_km`.
///
/// An unset `current` teleports straight to the target (mission start).
/// If the remaining distance fits inside one step, the position snaps
/// exactly onto the target. Otherwise the position is interpolated
/// linearly in (lat, lng) space, a flat-plane approximation that holds
/// for steps far shorter than Earth's curvature.
pub fn advance(current: Option<GeoPoint>, target: GeoPoint, step_km: f64) -> GeoPoint {
    let Some(current) = current else {
        return target;
    };

    let dist = distance_km(current, target);
    if dist == 0.0 || dist < step_km {
        return target;
    }

    let ratio = step_km / dist;
    GeoPoint::new(
        current.lat + (target.lat - current.lat) * ratio,
        current.lng + (target.lng - current.lng) * ratio,
    )
}
