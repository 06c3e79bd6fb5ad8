//! Jurisdiction zones and the static zone map.

use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;
use crate::spatial::{centroid, distance_km, point_in_polygon};

/// A named polygonal jurisdiction requiring clearance coordination on entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Simple polygon, implicitly closed (last vertex connects to first).
    pub boundary: Vec<GeoPoint>,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>, boundary: Vec<GeoPoint>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            boundary,
        }
    }

    /// Check if a point is inside this zone's boundary.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point_in_polygon(point, &self.boundary)
    }

    /// Vertex-mean centroid, used for nearest-zone ranking.
    pub fn centroid(&self) -> GeoPoint {
        centroid(&self.boundary)
    }

    /// Validate zone configuration.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push("Zone id must not be empty".to_string());
        }
        if self.boundary.len() < 3 {
            errors.push("Boundary must have at least 3 vertices".to_string());
        }
        errors
    }
}

/// Static, ordered set of jurisdiction zones. Loaded once, immutable for
/// the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneMap {
    zones: Vec<Zone>,
}

impl ZoneMap {
    /// Build a zone map. Declaration order is the lookup priority order.
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Find the zone containing a point.
    ///
    /// Zones are scanned in declaration order and the first containing
    /// zone wins. Zones are assumed non-overlapping; where they do
    /// overlap, earliest-declared wins (a policy, not an error).
    pub fn locate(&self, point: GeoPoint) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(point))
    }

    /// Nearest zone by centroid distance, skipping `exclude` (the
    /// currently active zone). Advisory only.
    pub fn nearest_other(&self, point: GeoPoint, exclude: Option<&str>) -> Option<&Zone> {
        let mut best: Option<(&Zone, f64)> = None;
        for zone in &self.zones {
            if exclude == Some(zone.id.as_str()) {
                continue;
            }
            let d = distance_km(point, zone.centroid());
            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                best = Some((zone, d));
            }
        }
        best.map(|(z, _)| z)
    }

    /// The six Bengaluru police jurisdictions used by the reference
    /// deployment.
    pub fn bengaluru() -> Self {
        fn poly(points: &[(f64, f64)]) -> Vec<GeoPoint> {
            points.iter().map(|&(lat, lng)| GeoPoint::new(lat, lng)).collect()
        }

        Self::new(vec![
            Zone::new(
                "PS1",
                "Central Zone",
                poly(&[
                    (12.9695, 77.5862),
                    (12.9768, 77.5885),
                    (12.9789, 77.5959),
                    (12.9744, 77.6018),
                    (12.9682, 77.5996),
                    (12.9669, 77.5918),
                ]),
            ),
            Zone::new(
                "PS2",
                "East Zone",
                poly(&[
                    (12.9792, 77.6023),
                    (12.9867, 77.6064),
                    (12.9911, 77.6138),
                    (12.9850, 77.6209),
                    (12.9783, 77.6154),
                    (12.9765, 77.6081),
                ]),
            ),
            Zone::new(
                "PS3",
                "South Zone",
                poly(&[
                    (12.9628, 77.5871),
                    (12.9692, 77.5938),
                    (12.9681, 77.6024),
                    (12.9607, 77.6031),
                    (12.9568, 77.5950),
                    (12.9589, 77.5883),
                ]),
            ),
            Zone::new(
                "PS4",
                "West Zone",
                poly(&[
                    (12.9711, 77.5752),
                    (12.9784, 77.5786),
                    (12.9769, 77.5859),
                    (12.9702, 77.5884),
                    (12.9654, 77.5832),
                    (12.9671, 77.5771),
                ]),
            ),
            Zone::new(
                "PS5",
                "North Zone",
                poly(&[
                    (12.9851, 77.5867),
                    (12.9923, 77.5891),
                    (12.9958, 77.5968),
                    (12.9897, 77.6027),
                    (12.9831, 77.5982),
                    (12.9822, 77.5903),
                ]),
            ),
            Zone::new(
                "PS6",
                "North-East Zone",
                poly(&[
                    (12.9902, 77.6049),
                    (12.9975, 77.6096),
                    (13.0001, 77.6172),
                    (12.9943, 77.6224),
                    (12.9876, 77.6181),
                    (12.9864, 77.6102),
                ]),
            ),
        ])
    }
}
