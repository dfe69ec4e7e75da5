//! Compact pilot snapshot JSON.
//!
//! `pilot_snapshot.json` lives next to the roster file and carries one
//! entry per pilot with a publishable position. Consumers get the raw PBH
//! word plus derived headings: `hdg_tru` decoded from PBH, and `hdg_mag`
//! corrected by the magnetic declination at the aircraft position. When
//! the declination lookup fails, `decl_deg` falls back to 0 and the
//! magnetic heading degenerates to the true one: still useful, never
//! fatal.

use std::path::Path;

use serde::Serialize;

use crate::geo::magnetic::MagneticModel;
use crate::geo::{pbh, wrap360};
use crate::registry::{ClientKind, Registry};
use crate::time::UnixTime;

use super::roster::position_publishable;
use super::{write_atomic, SnapshotError};

/// File name, relative to the roster directory.
pub const FILE_NAME: &str = "pilot_snapshot.json";

/// Feet to metres.
const FEET_TO_METERS: f64 = 0.3048;

/// The complete snapshot document.
#[derive(Debug, Serialize)]
pub struct PilotSnapshot {
    /// Unix seconds at publication.
    pub ts: i64,
    pub clients: Vec<PilotEntry>,
}

/// One pilot with a publishable position.
#[derive(Debug, Serialize)]
pub struct PilotEntry {
    pub callsign: String,
    pub lat: f64,
    pub lon: f64,
    /// Feet MSL.
    pub alt: i32,
    /// Knots.
    pub gs: i32,
    /// Raw packed pitch/bank/heading word.
    pub pbh: u32,
    /// True heading decoded from PBH, degrees.
    pub hdg_tru: f64,
    /// Declination used for the magnetic correction; 0 when unavailable.
    pub decl_deg: f64,
    /// `wrap360(hdg_tru - decl_deg)`.
    pub hdg_mag: f64,
}

/// Assemble the snapshot from the registry's current state.
pub fn build(registry: &Registry, magnetic: &MagneticModel, now: UnixTime) -> PilotSnapshot {
    let clients = registry
        .clients()
        .filter(|c| c.kind == ClientKind::Pilot && position_publishable(c))
        .map(|c| {
            let hdg_tru = pbh::heading_from_pbh(c.pbh);
            let alt_m = f64::from(c.altitude) * FEET_TO_METERS;
            let decl_deg = magnetic.declination(c.lat, c.lon, alt_m, now).unwrap_or(0.0);
            PilotEntry {
                callsign: c.callsign.clone(),
                lat: c.lat,
                lon: c.lon,
                alt: c.altitude,
                gs: c.groundspeed,
                pbh: c.pbh,
                hdg_tru,
                decl_deg,
                hdg_mag: wrap360(hdg_tru - decl_deg),
            }
        })
        .collect();

    PilotSnapshot { ts: now, clients }
}

/// Build and atomically publish `pilot_snapshot.json` in `dir`.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Client, ClientHandshake, PilotPosition};

    fn connect(registry: &mut Registry, callsign: &str, kind: ClientKind) {
        registry.insert_client(Client::new(
            ClientHandshake {
                cid: "1000001".to_string(),
                server_ident: "LOCAL".to_string(),
                callsign: callsign.to_string(),
                kind,
                rating: 1,
                realname: "Test".to_string(),
                protocol: "9".to_string(),
                simtype: 1,
            },
            0,
        ));
    }

    fn report(registry: &mut Registry, callsign: &str, lat: f64, lon: f64, alt: i32, pbh: u32) {
        registry
            .get_client_mut(callsign)
            .unwrap()
            .update_pilot_position(
                PilotPosition {
                    lat,
                    lon,
                    altitude: alt,
                    groundspeed: 450,
                    transponder: 2200,
                    pbh,
                    position_ok: true,
                },
                1,
            );
    }

    #[test]
    fn test_only_publishable_pilots_appear() {
        let mut registry = Registry::new();
        connect(&mut registry, "DLH123", ClientKind::Pilot);
        connect(&mut registry, "NOPOS", ClientKind::Pilot);
        connect(&mut registry, "EDDF_TWR", ClientKind::Atc);
        report(&mut registry, "DLH123", 50.0, 8.0, 35_000, 0);
        // NOPOS never reports; the controller reports but is not a pilot.
        registry
            .get_client_mut("EDDF_TWR")
            .unwrap()
            .update_atc_position(
                crate::registry::AtcPosition {
                    frequency: 20_500,
                    facility_type: 4,
                    visual_range: 50,
                    lat: 50.03,
                    lon: 8.57,
                    altitude: 0,
                    groundspeed: 0,
                },
                1,
            );

        let snapshot = build(&registry, &MagneticModel::new(), 42);
        assert_eq!(snapshot.ts, 42);
        assert_eq!(snapshot.clients.len(), 1);
        assert_eq!(snapshot.clients[0].callsign, "DLH123");
    }

    #[test]
    fn test_bogus_altitude_excluded() {
        let mut registry = Registry::new();
        connect(&mut registry, "DLH123", ClientKind::Pilot);
        report(&mut registry, "DLH123", 50.0, 8.0, 100_000, 0);
        assert!(build(&registry, &MagneticModel::new(), 0).clients.is_empty());
    }

    #[test]
    fn test_headings_are_consistent() {
        let mut registry = Registry::new();
        connect(&mut registry, "DLH123", ClientKind::Pilot);
        let word = pbh::encode_pbh(0.0, 0.0, 90.0, false);
        report(&mut registry, "DLH123", 50.0, 8.0, 35_000, word);

        let snapshot = build(&registry, &MagneticModel::new(), 1_750_000_000);
        let entry = &snapshot.clients[0];
        assert!((entry.hdg_tru - 90.0).abs() < 360.0 / 1024.0);
        assert_eq!(entry.pbh, word);
        let expected = wrap360(entry.hdg_tru - entry.decl_deg);
        assert!((entry.hdg_mag - expected).abs() < 1e-9);
        assert!((0.0..360.0).contains(&entry.hdg_mag));
    }

    #[test]
    fn test_serialized_shape() {
        let mut registry = Registry::new();
        connect(&mut registry, "DLH123", ClientKind::Pilot);
        report(&mut registry, "DLH123", 50.0, 8.0, 35_000, 0);

        let json =
            serde_json::to_value(build(&registry, &MagneticModel::new(), 7)).unwrap();
        assert_eq!(json["ts"], 7);
        let entry = &json["clients"][0];
        assert_eq!(entry["callsign"], "DLH123");
        assert_eq!(entry["alt"], 35_000);
        assert!(entry["hdg_tru"].is_number());
        assert!(entry["decl_deg"].is_number());
        assert!(entry["hdg_mag"].is_number());
    }
}
