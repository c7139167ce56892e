/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two GPS coordinates, in metres.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlam = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlam / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn zero_distance() {
        assert_eq!(haversine_m(30.0, 120.0, 30.0, 120.0), 0.0);
    }
    #[test]
    fn one_degree_latitude() {
        // one degree of latitude is ~111km everywhere
        let d = haversine_m(30.0, 120.0, 31.0, 120.0);
        assert!((d - 111_195.0).abs() < 500.0, "got {}", d);
    }
    #[test]
    fn symmetric() {
        let a = haversine_m(22.5, 114.0, 39.9, 116.4);
        let b = haversine_m(39.9, 116.4, 22.5, 114.0);
        assert!((a - b).abs() < 1e-6);
    }
}
