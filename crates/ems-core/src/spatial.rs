//! Spatial math for distance, containment, and centroid calculations.

use crate::models::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the great-circle distance between two points in kilometers
/// using the Haversine formula.
///
/// Symmetric in its arguments; zero iff the points coincide (within
/// floating tolerance).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Check whether a point lies inside a polygon using ray casting.
///
/// The polygon is treated as implicitly closed: the last vertex connects
/// back to the first. Points exactly on an edge get an arbitrary but
/// consistent classification; callers must not rely on either outcome.
pub fn point_in_polygon(point: GeoPoint, polygon: &[GeoPoint]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i].lat, polygon[i].lng);
        let (xj, yj) = (polygon[j].lat, polygon[j].lng);

        if ((yi > point.lng) != (yj > point.lng))
            && (point.lat < (xj - xi) * (point.lng - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Arithmetic mean of the polygon vertices.
///
/// Not the true geometric centroid for non-convex shapes, but sufficient
/// for nearest-zone ranking.
pub fn centroid(polygon: &[GeoPoint]) -> GeoPoint {
    if polygon.is_empty() {
        return GeoPoint::new(0.0, 0.0);
    }

    let mut lat = 0.0;
    let mut lng = 0.0;
    for p in polygon {
        lat += p.lat;
        lng += p.lng;
    }
    let n = polygon.len() as f64;
    GeoPoint::new(lat / n, lng / n)
}
