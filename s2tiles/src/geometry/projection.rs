//! Web Mercator projection into the unit square.

use std::f64::consts::PI;

/// Longitude in degrees to `[0, 1]`, west to east, clamped at the antimeridian.
#[inline]
pub fn mercator_x(lon: f64) -> f64 {
    (lon / 360.0 + 0.5).clamp(0.0, 1.0)
}

/// Latitude in degrees to `[0, 1]`, north to south, clamped at the poles.
#[inline]
pub fn mercator_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

#[inline]
pub fn lon_lat_to_mercator(point: [f64; 2]) -> [f64; 2] {
    [mercator_x(point[0]), mercator_y(point[1])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_center() {
        assert_eq!(lon_lat_to_mercator([0.0, 0.0]), [0.5, 0.5]);
    }

    #[test]
    fn test_extremes_clamp() {
        assert_eq!(mercator_x(-180.0), 0.0);
        assert_eq!(mercator_x(180.0), 1.0);
        assert_eq!(mercator_y(90.0), 0.0);
        assert_eq!(mercator_y(-90.0), 1.0);
        assert!(mercator_y(45.0) < 0.5);
    }

    #[test]
    fn test_longitude_past_antimeridian_clamps() {
        assert_eq!(mercator_x(190.0), 1.0);
        assert_eq!(mercator_x(-200.0), 0.0);
        assert_eq!(lon_lat_to_mercator([540.0, 0.0]), [1.0, 0.5]);
    }
}
