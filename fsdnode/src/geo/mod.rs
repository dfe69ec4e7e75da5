//! Great-circle math and heading utilities.
//!
//! Everything here works in WGS-84 degrees and is deliberately free of any
//! registry or controller state, so the functions double as the reference
//! implementation for the snapshot publisher's derived fields.
//!
//! # Components
//!
//! - [`bearing`] - initial great-circle bearing plus haversine distance
//! - [`wrap360`] - total mapping of any finite angle into `[0, 360)`
//! - [`pbh`] - the packed 32-bit pitch/bank/heading word from the wire
//! - [`magnetic`] - World Magnetic Model declination lookup

pub mod magnetic;
pub mod pbh;

/// Mean Earth radius in metres (haversine sphere).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per nautical mile.
pub const METERS_PER_NM: f64 = 1852.0;

/// Minimum separation between consecutive positions before a new track
/// heading is derived. Below this the previous track is retained.
pub const TRACK_MIN_DISTANCE_M: f64 = 50.0;

/// Initial great-circle bearing and distance between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bearing {
    /// Initial bearing, rounded to the nearest whole degree in `0..=359`.
    pub heading_deg: i32,
    /// Haversine distance in metres.
    pub distance_m: f64,
}

/// Map any finite angle into `[0, 360)` degrees.
///
/// Exact at the boundaries: `wrap360(360.0) == 0.0` and `wrap360(0.0) == 0.0`.
pub fn wrap360(x: f64) -> f64 {
    let r = x % 360.0;
    if r < 0.0 {
        r + 360.0
    } else {
        r
    }
}

/// Initial great-circle bearing from `(lat1, lon1)` to `(lat2, lon2)`.
///
/// Returns `None` when any input is non-finite or when the two points
/// coincide numerically (the bearing is undefined there).
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<Bearing> {
    if !lat1.is_finite() || !lon1.is_finite() || !lat2.is_finite() || !lon2.is_finite() {
        return None;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    if x == 0.0 && y == 0.0 {
        return None;
    }

    let theta = y.atan2(x);
    let brng = wrap360(theta.to_degrees());
    let heading_deg = (brng.round() as i32).rem_euclid(360);

    // Haversine distance, used for track gating and client range checks.
    let dphi = (lat2 - lat1).to_radians();
    let a = (dphi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Some(Bearing {
        heading_deg,
        distance_m: EARTH_RADIUS_M * c,
    })
}

/// Great-circle distance in nautical miles, `None` where the bearing is
/// undefined (coincident or non-finite points yield zero distance anyway,
/// so callers treat `None` as "no meaningful separation").
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    bearing(lat1, lon1, lat2, lon2).map(|b| b.distance_m / METERS_PER_NM)
}
