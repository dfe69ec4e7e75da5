//! Rich status snapshot JSON.
//!
//! The diagnostic sibling of the compact pilot snapshot, refreshed on a
//! shorter cadence. Where `pilot_snapshot.json` silently degrades on a
//! failed declination lookup, `status.json` says so: `wmm_ok` reports
//! whether the World Magnetic Model produced a plausible declination, and
//! `decl_deg`/`hdg_true` are JSON null when it did not.
//!
//! The simulator's compass is effectively magnetic, so the PBH-decoded
//! heading is published here as `hdg_sim` (the simulator's magnetic
//! reading) and the true heading is reconstructed as
//! `wrap360(hdg_sim + decl)`, but only when the declination is trustworthy.

use std::path::Path;

use serde::Serialize;

use crate::geo::magnetic::MagneticModel;
use crate::geo::{pbh, wrap360};
use crate::registry::{ClientKind, Registry};
use crate::time::UnixTime;

use super::roster::position_publishable;
use super::{write_atomic, SnapshotError};

/// File name, relative to the roster directory.
pub const FILE_NAME: &str = "status.json";

/// Feet to metres.
const FEET_TO_METERS: f64 = 0.3048;

/// The complete status document.
#[derive(Debug, Serialize)]
pub struct StatusSnapshot {
    /// Unix seconds at publication.
    pub ts: i64,
    pub clients: Vec<StatusEntry>,
}

/// One pilot with full heading diagnostics.
#[derive(Debug, Serialize)]
pub struct StatusEntry {
    pub callsign: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: i32,
    pub gs: i32,
    /// Raw packed pitch/bank/heading word.
    pub pbh: u32,
    /// PBH-decoded heading, taken as the simulator's magnetic reading.
    pub hdg_sim: f64,
    /// Track over ground from consecutive fixes; absent until derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_deg: Option<f64>,
    /// Whether the declination lookup produced a plausible value.
    pub wmm_ok: bool,
    /// Declination, null unless `wmm_ok`.
    pub decl_deg: Option<f64>,
    /// `wrap360(hdg_sim + decl_deg)`, null unless `wmm_ok`.
    pub hdg_true: Option<f64>,
}

/// Assemble the status document from the registry's current state.
pub fn build(registry: &Registry, magnetic: &MagneticModel, now: UnixTime) -> StatusSnapshot {
    let clients = registry
        .clients()
        .filter(|c| c.kind == ClientKind::Pilot && position_publishable(c))
        .map(|c| {
            let hdg_sim = pbh::heading_from_pbh(c.pbh);
            let alt_m = f64::from(c.altitude) * FEET_TO_METERS;
            let decl = magnetic.declination(c.lat, c.lon, alt_m, now);

            StatusEntry {
                callsign: c.callsign.clone(),
                lat: c.lat,
                lon: c.lon,
                alt: c.altitude,
                gs: c.groundspeed,
                pbh: c.pbh,
                hdg_sim,
                track_deg: (c.computed_hdg >= 0.0).then_some(c.computed_hdg),
                wmm_ok: decl.is_some(),
                decl_deg: decl,
                hdg_true: decl.map(|d| wrap360(hdg_sim + d)),
            }
        })
        .collect();

    StatusSnapshot { ts: now, clients }
}

/// Build and atomically publish `status.json` in `dir`.
pub fn publish(
    dir: &Path,
    registry: &Registry,
    magnetic: &MagneticModel,
    now: UnixTime,
) -> Result<(), SnapshotError> {
    let snapshot = build(registry, magnetic, now);
    let mut body = serde_json::to_vec(&snapshot)?;
    body.push(b'\n');
    write_atomic(&dir.join(FILE_NAME), &body)?;
    Ok(())
}
