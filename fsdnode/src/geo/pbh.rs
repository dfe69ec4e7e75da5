//! The packed 32-bit pitch/bank/heading word.
//!
//! Pilot position packets carry aircraft attitude as a single unsigned
//! 32-bit word. Each attitude field is a 10-bit fraction of a full circle
//! (one unit is 360/1024 degrees):
//!
//! ```text
//!  31        22 21        12 11         2  1  0
//! +------------+------------+------------+--+--+
//! |   pitch    |    bank    |  heading   |og|  |
//! +------------+------------+------------+--+--+
//! ```
//!
//! `og` is the on-ground flag. The word is stored opaquely on the client
//! entry; headings are always derived on demand, never stored back.

use super::wrap360;

/// Width of each attitude field.
const FIELD_BITS: u32 = 10;

/// Mask for a single attitude field.
const FIELD_MASK: u32 = (1 << FIELD_BITS) - 1;

/// Degrees represented by one field unit.
const DEG_PER_UNIT: f64 = 360.0 / 1024.0;

const PITCH_SHIFT: u32 = 22;
const BANK_SHIFT: u32 = 12;
const HEADING_SHIFT: u32 = 2;
const ON_GROUND_BIT: u32 = 1 << 1;

/// Decode the heading field to degrees.
///
/// Total over all 32-bit inputs: the result is always in `[0, 360)`
/// (a 10-bit field tops out at 1023 units = 359.648 degrees).
pub fn heading_from_pbh(pbh: u32) -> f64 {
    (((pbh >> HEADING_SHIFT) & FIELD_MASK) as f64) * DEG_PER_UNIT
}

/// Decode the pitch field to degrees in `[0, 360)`.
pub fn pitch_from_pbh(pbh: u32) -> f64 {
    (((pbh >> PITCH_SHIFT) & FIELD_MASK) as f64) * DEG_PER_UNIT
}

/// Decode the bank field to degrees in `[0, 360)`.
pub fn bank_from_pbh(pbh: u32) -> f64 {
    (((pbh >> BANK_SHIFT) & FIELD_MASK) as f64) * DEG_PER_UNIT
}

/// True when the on-ground flag is set.
pub fn on_ground(pbh: u32) -> bool {
    pbh & ON_GROUND_BIT != 0
}

/// Pack pitch, bank, and heading (degrees) into the wire word.
///
/// Angles are wrapped into `[0, 360)` and quantized to 10 bits, so a
/// decode after encode is accurate to half a unit (±360/2048 degrees).
pub fn encode_pbh(pitch_deg: f64, bank_deg: f64, heading_deg: f64, on_ground: bool) -> u32 {
    let field = |deg: f64| -> u32 { ((wrap360(deg) / DEG_PER_UNIT).round() as u32) & FIELD_MASK };

    (field(pitch_deg) << PITCH_SHIFT)
        | (field(bank_deg) << BANK_SHIFT)
        | (field(heading_deg) << HEADING_SHIFT)
        | if on_ground { ON_GROUND_BIT } else { 0 }
}
