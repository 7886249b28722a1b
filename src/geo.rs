// ABOUTME: Small geographic helpers for bike drop-off positions
// ABOUTME: Jitters coordinates within a radius using the degrees-per-kilometer approximation

use rand::Rng;

/// Approximate kilometers per degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Pick a uniformly-jittered position within roughly `radius_km` of the
/// start. Each axis is offset independently by up to `radius_km / 111`
/// degrees, a flat-earth approximation that is fine at city scale.
pub fn random_nearby(start: Coordinates, radius_km: f64) -> Coordinates {
    let mut rng = rand::thread_rng();
    let delta_degrees = radius_km / KM_PER_DEGREE;
    Coordinates {
        latitude: start.latitude + rng.gen_range(-delta_degrees..=delta_degrees),
        longitude: start.longitude + rng.gen_range(-delta_degrees..=delta_degrees),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jittered_position_stays_within_the_box() {
        let start = Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let delta = 5.0 / KM_PER_DEGREE;
        for _ in 0..100 {
            let end = random_nearby(start, 5.0);
            assert!((end.latitude - start.latitude).abs() <= delta);
            assert!((end.longitude - start.longitude).abs() <= delta);
        }
    }

    #[test]
    fn zero_radius_returns_the_start() {
        let start = Coordinates {
            latitude: 10.0,
            longitude: 20.0,
        };
        let end = random_nearby(start, 0.0);
        assert!((end.latitude - start.latitude).abs() < f64::EPSILON);
        assert!((end.longitude - start.longitude).abs() < f64::EPSILON);
    }
}
