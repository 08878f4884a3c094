//! Coordinate math for the proximity feed.
//!
//! Provides the great-circle radius test used to relate feed items to the
//! current search region, and the rounded-coordinate bucket keys used to
//! group near-duplicate items into a single map marker.

mod types;

pub use types::{
    Coordinate, GeoError, EARTH_RADIUS_M, MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG,
};

/// Default number of decimal digits for bucket keys.
///
/// Five digits resolve to roughly 1.1 m at the equator, which matches the
/// granularity of reports pinned on the same storefront or parking lot.
pub const DEFAULT_BUCKET_PRECISION: usize = 5;

/// Great-circle distance between two coordinates in meters (haversine).
///
/// Numerically stable for near-zero and antipodal separations: the haversine
/// term is clamped into `[0, 1]` before the arcsine so floating-point drift
/// cannot produce a NaN at the antipodes. Invalid inputs (NaN components)
/// yield NaN, which the boolean wrappers below treat as "not within".
#[inline]
pub fn haversine_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Check whether `b` lies within `radius_m` meters of `a`.
///
/// Malformed coordinates (NaN or out-of-range components) and NaN radii
/// propagate as `false`; this function never panics.
#[inline]
pub fn is_within_radius(a: Coordinate, b: Coordinate, radius_m: f64) -> bool {
    if !a.is_valid() || !b.is_valid() {
        return false;
    }
    haversine_distance_m(a, b) <= radius_m
}

/// Derive a deterministic bucket key from a coordinate.
///
/// Both components are rounded to `precision` decimal digits, so coordinates
/// within ~1 m of each other at precision 5 produce identical keys. This is
/// an approximation, not clustering: two points just either side of a
/// rounding boundary land in different buckets even when they are closer
/// than the bucket width. Negative zero normalizes to positive zero so both
/// hemispheres of the boundary share a key. NaN components produce the
/// literal `NaN` token, keeping unplaceable items in a single bucket.
pub fn bucket_key(c: Coordinate, precision: usize) -> String {
    format!(
        "{:.prec$}_{:.prec$}",
        round_component(c.lat, precision),
        round_component(c.lng, precision),
        prec = precision
    )
}

/// Round a component to `precision` decimal digits, collapsing -0.0.
fn round_component(value: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new_unchecked(lat, lng)
    }

    #[test]
    fn test_distance_zero_for_identical_points() {
        let seoul = coord(37.5665, 126.9780);
        assert_eq!(haversine_distance_m(seoul, seoul), 0.0);
    }

    #[test]
    fn test_distance_seoul_to_busan() {
        // Seoul City Hall to Busan Station is roughly 320 km.
        let seoul = coord(37.5665, 126.9780);
        let busan = coord(35.1151, 129.0403);
        let d = haversine_distance_m(seoul, busan);
        assert!((315_000.0..330_000.0).contains(&d), "unexpected distance {}", d);
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 180.0);
        let d = haversine_distance_m(a, b);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - half_circumference).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_within_radius_boundary() {
        let center = coord(37.5, 127.0);
        // ~111 m north of center.
        let near = coord(37.501, 127.0);
        assert!(is_within_radius(center, near, 200.0));
        assert!(!is_within_radius(center, near, 50.0));
    }

    #[test]
    fn test_within_radius_nan_is_false() {
        let center = coord(37.5, 127.0);
        let broken = coord(f64::NAN, 127.0);
        assert!(!is_within_radius(center, broken, 1_000.0));
        assert!(!is_within_radius(broken, center, 1_000.0));
        assert!(!is_within_radius(center, center, f64::NAN));
    }

    #[test]
    fn test_within_radius_out_of_range_is_false() {
        let center = coord(37.5, 127.0);
        let bogus = coord(95.0, 127.0);
        assert!(!is_within_radius(center, bogus, f64::INFINITY));
    }

    #[test]
    fn test_bucket_key_format() {
        let c = coord(37.50001, 127.00001);
        assert_eq!(bucket_key(c, 5), "37.50001_127.00001");
        assert_eq!(bucket_key(c, 2), "37.50_127.00");
    }

    #[test]
    fn test_bucket_key_merges_sub_meter_neighbors() {
        // ~11 cm apart: identical at the ~1.1 m bucket width, distinct one
        // digit deeper.
        let a = coord(37.500001, 127.000001);
        let b = coord(37.500002, 127.000002);
        assert_eq!(bucket_key(a, 5), bucket_key(b, 5));
        assert_ne!(bucket_key(a, 6), bucket_key(b, 6));
    }

    #[test]
    fn test_bucket_key_boundary_split() {
        // Points ~1.1 m apart straddling a rounding boundary land in
        // different buckets. Accepted approximation, not true clustering.
        let a = coord(37.500004, 127.0);
        let b = coord(37.500006, 127.0);
        assert_ne!(bucket_key(a, 5), bucket_key(b, 5));
    }

    #[test]
    fn test_bucket_key_normalizes_negative_zero() {
        let west = coord(0.000001, -0.000001);
        let east = coord(-0.000001, 0.000001);
        assert_eq!(bucket_key(west, 5), "0.00000_0.00000");
        assert_eq!(bucket_key(west, 5), bucket_key(east, 5));
    }

    #[test]
    fn test_bucket_key_nan_sentinel() {
        let broken = coord(f64::NAN, f64::NAN);
        assert_eq!(bucket_key(broken, 5), "NaN_NaN");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_distance_is_symmetric(
                lat_a in -90.0..90.0_f64,
                lng_a in -180.0..180.0_f64,
                lat_b in -90.0..90.0_f64,
                lng_b in -180.0..180.0_f64,
            ) {
                let a = coord(lat_a, lng_a);
                let b = coord(lat_b, lng_b);
                let forward = haversine_distance_m(a, b);
                let backward = haversine_distance_m(b, a);
                prop_assert!((forward - backward).abs() < 1e-6);
            }

            #[test]
            fn test_distance_is_bounded(
                lat_a in -90.0..90.0_f64,
                lng_a in -180.0..180.0_f64,
                lat_b in -90.0..90.0_f64,
                lng_b in -180.0..180.0_f64,
            ) {
                let d = haversine_distance_m(coord(lat_a, lng_a), coord(lat_b, lng_b));
                let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
                prop_assert!(d >= 0.0);
                prop_assert!(d <= half_circumference + 1.0);
            }

            #[test]
            fn test_within_radius_matches_distance(
                lat_a in -90.0..90.0_f64,
                lng_a in -180.0..180.0_f64,
                lat_b in -90.0..90.0_f64,
                lng_b in -180.0..180.0_f64,
                radius in 0.0..25_000_000.0_f64,
            ) {
                let a = coord(lat_a, lng_a);
                let b = coord(lat_b, lng_b);
                let expected = haversine_distance_m(a, b) <= radius;
                prop_assert_eq!(is_within_radius(a, b, radius), expected);
            }

            #[test]
            fn test_bucket_key_is_deterministic(
                lat in -90.0..90.0_f64,
                lng in -180.0..180.0_f64,
                precision in 0usize..=7,
            ) {
                let c = coord(lat, lng);
                prop_assert_eq!(bucket_key(c, precision), bucket_key(c, precision));
            }

            #[test]
            fn test_bucket_key_stable_under_sub_precision_noise(
                lat in -89.0..89.0_f64,
                lng in -179.0..179.0_f64,
            ) {
                // Perturbation far below the precision-5 bucket width must not
                // change the key unless the point sits on a rounding boundary.
                let c = coord(lat, lng);
                let nudged = coord(lat + 1e-9, lng + 1e-9);
                let factor = 10f64.powi(5);
                let on_boundary = |v: f64| {
                    let scaled = v * factor;
                    (scaled - scaled.floor() - 0.5).abs() < 1e-3
                };
                prop_assume!(!on_boundary(lat) && !on_boundary(lng));
                prop_assert_eq!(bucket_key(c, 5), bucket_key(nudged, 5));
            }
        }
    }
}
