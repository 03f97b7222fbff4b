use serde::{Deserialize, Serialize};

/// Mean Earth radius used for the spherical destination formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Bearing assumed when the client does not report a compass heading:
/// the observer stands due south of the landmark.
pub const DEFAULT_BEARING_DEG: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle point reached by travelling `distance_m` from `origin` along
/// `bearing_deg` (clockwise from north).
pub fn destination_point(
    origin: GeoCoordinate,
    distance_m: f64,
    bearing_deg: f64,
) -> GeoCoordinate {
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    GeoCoordinate::new(lat2.to_degrees(), lon2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: GeoCoordinate = GeoCoordinate::new(31.481559513821388, 74.30379489883944);

    #[test]
    fn zero_distance_is_identity() {
        let p = destination_point(LIBRARY, 0.0, 73.0);
        assert!((p.latitude - LIBRARY.latitude).abs() < 1e-12);
        assert!((p.longitude - LIBRARY.longitude).abs() < 1e-12);
    }

    #[test]
    fn due_south_keeps_longitude_and_lowers_latitude() {
        let p = destination_point(LIBRARY, 100.0, DEFAULT_BEARING_DEG);

        // 100 m of arc is 100 / R radians of latitude.
        let expected_dlat = (100.0 / EARTH_RADIUS_M).to_degrees();
        assert!((LIBRARY.latitude - p.latitude - expected_dlat).abs() < 1e-9);
        assert!((p.longitude - LIBRARY.longitude).abs() < 1e-9);
    }

    #[test]
    fn due_east_raises_longitude() {
        let p = destination_point(LIBRARY, 50.0, 90.0);
        assert!(p.longitude > LIBRARY.longitude);
        assert!((p.latitude - LIBRARY.latitude).abs() < 1e-6);
    }
}
