//! Magnetic declination via the World Magnetic Model.
//!
//! The snapshot publisher converts PBH-derived headings between true and
//! magnetic north using the declination at the aircraft position. Lookups
//! can fail (position outside the model grid, date outside the model's
//! validity window) and can produce garbage near the magnetic poles, so
//! the result is gated by a plausibility band before anyone trusts it:
//! a declination is usable only when it is finite and within ±30 degrees.
//! Callers treat an implausible or failed lookup as "declination
//! unavailable", never as an error.

use world_magnetic_model::time::OffsetDateTime;
use world_magnetic_model::uom::si::angle::degree;
use world_magnetic_model::uom::si::f32::{Angle, Length};
use world_magnetic_model::uom::si::length::meter;
use world_magnetic_model::GeomagneticField;

use crate::time::UnixTime;

/// Declinations beyond this magnitude are treated as unavailable.
pub const MAX_PLAUSIBLE_DECLINATION_DEG: f64 = 30.0;

/// Process-lifetime handle for declination lookups.
///
/// The model coefficients are compiled into the `world_magnetic_model`
/// crate; this wrapper exists so the node owns one shared-read resource
/// instead of every call site touching the crate directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagneticModel;

impl MagneticModel {
    pub fn new() -> Self {
        Self
    }

    /// Declination in degrees (east-positive) at a position and time.
    ///
    /// `None` when the model rejects the query or the result falls outside
    /// the plausibility band.
    pub fn declination(&self, lat: f64, lon: f64, alt_m: f64, at: UnixTime) -> Option<f64> {
        let date = OffsetDateTime::from_unix_timestamp(at).ok()?.date();
        let field = GeomagneticField::new(
            Length::new::<meter>(alt_m as f32),
            Angle::new::<degree>(lat as f32),
            Angle::new::<degree>(lon as f32),
            date,
        )
        .ok()?;

        let decl = f64::from(field.declination().get::<degree>());
        is_plausible(decl).then_some(decl)
    }
}

/// Plausibility band for declination values.
pub fn is_plausible(decl_deg: f64) -> bool {
    decl_deg.is_finite() && decl_deg.abs() <= MAX_PLAUSIBLE_DECLINATION_DEG
}
