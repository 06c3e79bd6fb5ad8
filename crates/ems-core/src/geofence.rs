//! Jurisdiction boundary monitoring.
//!
//! Consumes the moving position each tick and detects zone entries and
//! exits against the static zone map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, ZoneTransition};
use crate::zones::{Zone, ZoneMap};

/// A detected zone boundary crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ZoneEvent {
    Entered {
        zone_id: String,
        zone_name: String,
        at: DateTime<Utc>,
    },
    Exited {
        zone_id: String,
        zone_name: String,
        at: DateTime<Utc>,
    },
}

/// Tracks which jurisdiction the moving vehicle is currently inside.
///
/// Entry events feed the clearance coordinator; exits only clear the
/// active-zone state. A transition timeline records every entry.
#[derive(Debug, Clone)]
pub struct GeofenceMonitor {
    zones: ZoneMap,
    active: Option<String>,
    timeline: Vec<ZoneTransition>,
}

impl GeofenceMonitor {
    pub fn new(zones: ZoneMap) -> Self {
        Self {
            zones,
            active: None,
            timeline: Vec::new(),
        }
    }

    /// The zone the vehicle is currently inside, if any.
    pub fn active_zone(&self) -> Option<&Zone> {
        let id = self.active.as_deref()?;
        self.zones.zones().iter().find(|z| z.id == id)
    }

    /// Every zone entry observed so far, oldest first. Display truncation
    /// is the caller's concern.
    pub fn timeline(&self) -> &[ZoneTransition] {
        &self.timeline
    }

    /// Nearest not-currently-active zone by centroid distance. Advisory
    /// indicator only; has no effect on mission state.
    pub fn predicted_next(&self, position: GeoPoint) -> Option<&Zone> {
        self.zones.nearest_other(position, self.active.as_deref())
    }

    /// Process a position update.
    ///
    /// Returns an entry event when the detected zone differs from the
    /// previous one (including from none), or an exit event when the
    /// vehicle leaves all zones. Exits carry no clearance action.
    pub fn observe(&mut self, position: GeoPoint, now: DateTime<Utc>) -> Option<ZoneEvent> {
        let detected = self
            .zones
            .locate(position)
            .map(|z| (z.id.clone(), z.name.clone()));

        match detected {
            Some((zone_id, zone_name)) => {
                if self.active.as_deref() == Some(zone_id.as_str()) {
                    return None;
                }
                self.active = Some(zone_id.clone());
                self.timeline.push(ZoneTransition {
                    zone: zone_name.clone(),
                    at: now,
                });
                Some(ZoneEvent::Entered {
                    zone_id,
                    zone_name,
                    at: now,
                })
            }
            None => {
                let zone_id = self.active.take()?;
                let zone_name = self
                    .zones
                    .zones()
                    .iter()
                    .find(|z| z.id == zone_id)
                    .map(|z| z.name.clone())
                    .unwrap_or_default();
                Some(ZoneEvent::Exited {
                    zone_id,
                    zone_name,
                    at: now,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneMap;

    fn monitor() -> GeofenceMonitor {
        GeofenceMonitor::new(ZoneMap::bengaluru())
    }

    fn central_interior() -> GeoPoint {
        ZoneMap::bengaluru().zones()[0].centroid()
    }

    #[test]
    fn test_entry_emits_event_and_timeline() {
        let mut m = monitor();
        let now = Utc::now();

        let event = m.observe(central_interior(), now);
        match event {
            Some(ZoneEvent::Entered { zone_name, .. }) => {
                assert_eq!(zone_name, "Central Zone");
            }
            other => panic!("expected entry event, got {other:?}"),
        }
        assert_eq!(m.timeline().len(), 1);
        assert_eq!(m.active_zone().unwrap().id, "PS1");
    }

    #[test]
    fn test_staying_inside_is_silent() {
        let mut m = monitor();
        let now = Utc::now();
        let p = central_interior();

        assert!(m.observe(p, now).is_some());
        assert!(m.observe(p, now).is_none());
        assert_eq!(m.timeline().len(), 1);
    }

    #[test]
    fn test_exit_clears_active_zone() {
        let mut m = monitor();
        let now = Utc::now();

        m.observe(central_interior(), now);
        let event = m.observe(GeoPoint::new(0.0, 0.0), now);
        assert!(matches!(event, Some(ZoneEvent::Exited { .. })));
        assert!(m.active_zone().is_none());
        // Exits are not recorded on the timeline
        assert_eq!(m.timeline().len(), 1);
    }

    #[test]
    fn test_exit_without_active_zone_is_silent() {
        let mut m = monitor();
        assert!(m.observe(GeoPoint::new(0.0, 0.0), Utc::now()).is_none());
    }

    #[test]
    fn test_predicted_next_excludes_active() {
        let mut m = monitor();
        let p = central_interior();
        m.observe(p, Utc::now());

        let predicted = m.predicted_next(p).unwrap();
        assert_ne!(predicted.id, "PS1");
    }
}
