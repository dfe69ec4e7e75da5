//! Boundary to the wire protocol collaborator.
//!
//! The TCP/line codec itself is external. What crosses this boundary:
//!
//! - outbound: [`PeerLink`] (pings, server-notify broadcasts)
//! - inbound: [`Command`]s produced by registered [`Process`]es, carrying
//!   packet payloads as token sequences already split by the wire layer
//!
//! The parse functions below turn token sequences into typed updates.
//! They return `None` for malformed input; the controller drops and
//! counts such updates, it never errors (peer-attributable failures are
//! not this node's problem).
//!
//! # Token orders
//!
//! Pilot position (`@` packet):
//! `ident_flag : callsign : transponder : rating : lat : lon : altitude : groundspeed : pbh`
//!
//! ATC position (`%` packet):
//! `callsign : frequency : facility_type : visual_range : rating : lat : lon : altitude`
//!
//! Flight plan (`$FP` packet, callsign delivered separately):
//! `type : aircraft : tascruise : dep : deptime : actdeptime : cruise_alt :
//!  dest : hrs_enr : min_enr : hrs_fuel : min_fuel : alt_airport : remarks : route`

mod link;
mod process;

pub use link::{NullLink, PeerLink, RecordedTraffic, RecordingLink, BROADCAST};
pub use process::{Command, PeerAnnounce, Process, ProcessManager, QueueProcess};

use crate::registry::{AtcPosition, FlightPlan, FlightPlanKind, PilotPosition};

/// A parsed pilot position report.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPilotUpdate {
    pub callsign: String,
    pub ident_flag: String,
    pub rating: i32,
    pub position: PilotPosition,
}

/// A parsed ATC position report.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAtcUpdate {
    pub callsign: String,
    pub rating: i32,
    pub position: AtcPosition,
}

fn tok_i32(tok: &str) -> Option<i32> {
    tok.trim().parse().ok()
}

fn tok_u32(tok: &str) -> Option<u32> {
    tok.trim().parse().ok()
}

fn tok_f64(tok: &str) -> Option<f64> {
    tok.trim().parse().ok()
}

/// Parse a pilot position report. `None` on malformed input.
///
/// A report whose coordinates parse but are non-finite is not malformed:
/// it is accepted with `position_ok` cleared, which records the fields
/// while keeping the client out of published snapshots.
pub fn parse_pilot_update(tokens: &[&str]) -> Option<ParsedPilotUpdate> {
    let [ident_flag, callsign, transponder, rating, lat, lon, altitude, groundspeed, pbh, ..] =
        *tokens
    else {
        return None;
    };
    if callsign.is_empty() {
        return None;
    }

    let lat = tok_f64(lat)?;
    let lon = tok_f64(lon)?;
    let position_ok = lat.is_finite() && lon.is_finite();

    Some(ParsedPilotUpdate {
        callsign: callsign.to_string(),
        ident_flag: ident_flag.to_string(),
        rating: tok_i32(rating)?,
        position: PilotPosition {
            lat,
            lon,
            altitude: tok_i32(altitude)?,
            groundspeed: tok_i32(groundspeed)?,
            transponder: tok_i32(transponder)?,
            pbh: tok_u32(pbh)?,
            position_ok,
        },
    })
}

/// Parse an ATC position report. `None` on malformed input.
pub fn parse_atc_update(tokens: &[&str]) -> Option<ParsedAtcUpdate> {
    let [callsign, frequency, facility_type, visual_range, rating, lat, lon, altitude, ..] =
        *tokens
    else {
        return None;
    };
    if callsign.is_empty() {
        return None;
    }

    Some(ParsedAtcUpdate {
        callsign: callsign.to_string(),
        rating: tok_i32(rating)?,
        position: AtcPosition {
            frequency: tok_i32(frequency)?,
            facility_type: tok_i32(facility_type)?,
            visual_range: tok_i32(visual_range)?,
            lat: tok_f64(lat)?,
            lon: tok_f64(lon)?,
            altitude: tok_i32(altitude)?,
            groundspeed: 0,
        },
    })
}

/// Parse flight plan tokens for `callsign`. `None` on malformed input.
///
/// The returned plan carries revision 0; the client entry makes the
/// revision monotonic when the plan is attached.
pub fn parse_flight_plan(callsign: &str, tokens: &[&str]) -> Option<FlightPlan> {
    let [kind, aircraft, tascruise, dep_airport, dep_time, act_dep_time, cruise_alt, dest_airport, hrs_enroute, min_enroute, hrs_fuel, min_fuel, alt_airport, remarks, route, ..] =
        *tokens
    else {
        return None;
    };

    let kind = FlightPlanKind::from_char(kind.chars().next()?)?;

    Some(FlightPlan {
        callsign: callsign.to_string(),
        revision: 0,
        kind,
        aircraft: aircraft.to_string(),
        tascruise: tok_i32(tascruise)?,
        dep_airport: dep_airport.to_string(),
        dep_time: tok_i32(dep_time)?,
        act_dep_time: tok_i32(act_dep_time)?,
        cruise_alt: cruise_alt.to_string(),
        dest_airport: dest_airport.to_string(),
        alt_airport: alt_airport.to_string(),
        route: route.to_string(),
        remarks: remarks.to_string(),
        hrs_enroute: tok_i32(hrs_enroute)?,
        min_enroute: tok_i32(min_enroute)?,
        hrs_fuel: tok_i32(hrs_fuel)?,
        min_fuel: tok_i32(min_fuel)?,
    })
}
