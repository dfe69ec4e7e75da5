//! Connected user session (pilot or controller).
//!
//! A client is materialised by the protocol layer after a successful
//! handshake and mutated by position and flight-plan updates until it
//! disconnects, its owning peer is evicted, or it times out. All dynamic
//! strings are owned by the entry itself.
//!
//! # Track vs heading
//!
//! The PBH word carries where the nose points; the derived track
//! (`computed_hdg`) is where the aircraft actually moves over the ground,
//! recomputed from consecutive position fixes. The two differ in any
//! crosswind, which is exactly why the status snapshot publishes both.

use crate::geo;
use crate::registry::plan::FlightPlan;
use crate::time::UnixTime;

/// Sentinel for "no track derived yet".
pub const HEADING_UNKNOWN: f64 = -1.0;

/// Effective visibility ceiling for pilots, nautical miles.
pub const MAX_PILOT_RANGE_NM: f64 = 600.0;

/// Session role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Pilot,
    Atc,
}

impl ClientKind {
    /// Roster spelling of the role.
    pub fn roster_label(&self) -> &'static str {
        match self {
            Self::Pilot => "PILOT",
            Self::Atc => "ATC",
        }
    }
}

/// One pilot position report, already tokenized by the wire layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotPosition {
    pub lat: f64,
    pub lon: f64,
    /// Feet MSL.
    pub altitude: i32,
    /// Knots.
    pub groundspeed: i32,
    pub transponder: i32,
    /// Packed pitch/bank/heading word (see [`geo::pbh`]).
    pub pbh: u32,
    /// False marks a report whose position must not be published.
    pub position_ok: bool,
}

/// One ATC position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtcPosition {
    /// kHz above 100 MHz, e.g. 20500 for 120.500 MHz.
    pub frequency: i32,
    pub facility_type: i32,
    /// Nautical miles.
    pub visual_range: i32,
    pub lat: f64,
    pub lon: f64,
    pub altitude: i32,
    pub groundspeed: i32,
}

/// Handshake tuple delivered by the protocol layer on login.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientHandshake {
    pub cid: String,
    /// Ident of the peer this client reached us through.
    pub server_ident: String,
    pub callsign: String,
    pub kind: ClientKind,
    pub rating: i32,
    pub realname: String,
    pub protocol: String,
    pub simtype: i32,
}

/// A connected session.
#[derive(Debug, Clone)]
pub struct Client {
    // Identity
    pub cid: String,
    pub callsign: String,
    pub realname: String,
    pub protocol: String,

    // Role
    pub kind: ClientKind,
    pub rating: i32,
    pub simtype: i32,

    // Liveness
    pub starttime: UnixTime,
    pub alive: UnixTime,

    // Position
    pub lat: f64,
    pub lon: f64,
    pub altitude: i32,
    pub groundspeed: i32,
    pub transponder: i32,
    pub pbh: u32,
    pub position_ok: bool,

    // ATC facets
    pub frequency: i32,
    pub facility_type: i32,
    pub visual_range: i32,
    pub sector: String,
    pub ident_flag: String,

    // Derived
    pub prev_lat: f64,
    pub prev_lon: f64,
    /// Track over ground, degrees; [`HEADING_UNKNOWN`] until derived.
    pub computed_hdg: f64,

    // Attachments
    pub plan: Option<FlightPlan>,
    pub infolines: Vec<String>,
    /// Set once the plan was modified locally, to suppress re-broadcast loops.
    pub fp_moded: bool,

    /// Ident of the owning peer server (non-owning relation; the registry
    /// guarantees it names a live server).
    pub server_ident: String,
}

impl Client {
    pub fn new(handshake: ClientHandshake, now: UnixTime) -> Self {
        Self {
            cid: handshake.cid,
            callsign: handshake.callsign,
            realname: handshake.realname,
            protocol: handshake.protocol,
            kind: handshake.kind,
            rating: handshake.rating,
            simtype: handshake.simtype,
            starttime: now,
            alive: now,
            lat: 0.0,
            lon: 0.0,
            altitude: 0,
            groundspeed: 0,
            transponder: 0,
            pbh: 0,
            position_ok: false,
            frequency: 0,
            facility_type: 0,
            visual_range: 0,
            sector: String::new(),
            ident_flag: String::new(),
            // NaN marks "no previous fix"; geo::bearing treats it as
            // undefined, so the first report never fabricates a track.
            prev_lat: f64::NAN,
            prev_lon: f64::NAN,
            computed_hdg: HEADING_UNKNOWN,
            plan: None,
            infolines: Vec::new(),
            fp_moded: false,
            server_ident: handshake.server_ident,
        }
    }

    /// Refresh the liveness stamp.
    pub fn set_alive(&mut self, now: UnixTime) {
        self.alive = now;
    }

    /// Apply a pilot position report.
    ///
    /// Fields are recorded even when `position_ok` is false; the snapshot
    /// publisher is responsible for exclusion. The previous fix is shifted
    /// before overwriting so the track derivation always sees the last two
    /// reports.
    pub fn update_pilot_position(&mut self, pos: PilotPosition, now: UnixTime) {
        self.prev_lat = self.lat;
        self.prev_lon = self.lon;

        self.lat = pos.lat;
        self.lon = pos.lon;
        self.altitude = pos.altitude;
        self.groundspeed = pos.groundspeed;
        self.transponder = pos.transponder;
        self.pbh = pos.pbh;
        self.position_ok = pos.position_ok;

        self.update_track_heading();
        self.set_alive(now);
    }

    /// Apply an ATC position report. Position fields are maintained too:
    /// a controller sits at a position even though it files no PBH.
    pub fn update_atc_position(&mut self, pos: AtcPosition, now: UnixTime) {
        self.frequency = pos.frequency;
        self.facility_type = pos.facility_type;
        self.visual_range = pos.visual_range;

        self.prev_lat = self.lat;
        self.prev_lon = self.lon;
        self.lat = pos.lat;
        self.lon = pos.lon;
        self.altitude = pos.altitude;
        self.groundspeed = pos.groundspeed;
        self.position_ok = true;

        self.set_alive(now);
    }

    /// Attach a plan, replacing any existing one atomically.
    ///
    /// The revision is made monotonic here: a replacement always carries
    /// the previous revision plus one, whatever the wire said.
    pub fn set_flight_plan(&mut self, mut plan: FlightPlan) {
        if let Some(old) = &self.plan {
            plan.revision = old.revision + 1;
        }
        self.plan = Some(plan);
        self.fp_moded = false;
    }

    /// Mark the attached plan as locally edited, suppressing re-broadcast.
    pub fn mark_plan_modified(&mut self) {
        self.fp_moded = true;
    }

    /// Re-derive the track over ground from the last two fixes.
    ///
    /// A new track is only adopted when the fixes are at least
    /// [`geo::TRACK_MIN_DISTANCE_M`] apart; jitter below that keeps the
    /// previous value.
    pub fn update_track_heading(&mut self) {
        if let Some(b) = geo::bearing(self.prev_lat, self.prev_lon, self.lat, self.lon) {
            if b.distance_m > geo::TRACK_MIN_DISTANCE_M {
                self.computed_hdg = f64::from(b.heading_deg);
            }
        }
    }

    /// Great-circle distance to another client, nautical miles.
    pub fn distance_to(&self, other: &Client) -> Option<f64> {
        geo::distance_nm(self.lat, self.lon, other.lat, other.lon)
    }

    /// Effective visibility radius in nautical miles.
    ///
    /// Controllers advertise it directly; for pilots it grows with
    /// altitude (`sqrt(alt_ft * 1.5)`), capped at [`MAX_PILOT_RANGE_NM`].
    pub fn visual_range_nm(&self) -> f64 {
        match self.kind {
            ClientKind::Atc => f64::from(self.visual_range),
            ClientKind::Pilot => {
                let alt = f64::from(self.altitude.max(0));
                (alt * 1.5).sqrt().min(MAX_PILOT_RANGE_NM)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::plan::FlightPlanKind;

    fn pilot_handshake(callsign: &str) -> ClientHandshake {
        ClientHandshake {
            cid: "1000001".to_string(),
            server_ident: "LOCAL".to_string(),
            callsign: callsign.to_string(),
            kind: ClientKind::Pilot,
            rating: 1,
            realname: "Test Pilot".to_string(),
            protocol: "9".to_string(),
            simtype: 1,
        }
    }

    fn position(lat: f64, lon: f64) -> PilotPosition {
        PilotPosition {
            lat,
            lon,
            altitude: 35_000,
            groundspeed: 450,
            transponder: 2200,
            pbh: 0,
            position_ok: true,
        }
    }

    fn plan(callsign: &str) -> FlightPlan {
        FlightPlan {
            callsign: callsign.to_string(),
            revision: 0,
            kind: FlightPlanKind::Ifr,
            aircraft: "B738".to_string(),
            tascruise: 450,
            dep_airport: "EDDF".to_string(),
            dep_time: 1200,
            act_dep_time: 1210,
            cruise_alt: "FL350".to_string(),
            dest_airport: "EGLL".to_string(),
            alt_airport: "EGKK".to_string(),
            route: "OBOKA DCT".to_string(),
            remarks: "/v/".to_string(),
            hrs_enroute: 1,
            min_enroute: 25,
            hrs_fuel: 3,
            min_fuel: 0,
        }
    }

    // ==================== position update tests ====================

    #[test]
    fn test_position_update_refreshes_alive() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.update_pilot_position(position(50.0, 8.0), 170);
        assert_eq!(client.alive, 170);
        assert_eq!(client.lat, 50.0);
        assert!(client.position_ok);
    }

    #[test]
    fn test_first_fix_derives_no_track() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.update_pilot_position(position(50.0, 8.0), 101);
        assert_eq!(client.computed_hdg, HEADING_UNKNOWN);
    }

    #[test]
    fn test_track_derived_after_second_fix() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.update_pilot_position(position(50.0, 8.0), 101);
        // Due north, well beyond the 50 m gate.
        client.update_pilot_position(position(50.1, 8.0), 102);
        assert_eq!(client.computed_hdg, 0.0);
        assert_eq!(client.prev_lat, 50.0);
    }

    #[test]
    fn test_track_retained_below_minimum_distance() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.update_pilot_position(position(50.0, 8.0), 101);
        client.update_pilot_position(position(50.0, 8.001), 102); // ~71 m, east
        assert_eq!(client.computed_hdg, 90.0);

        // A fix 1e-6 degrees away (~0.1 m) must not disturb the track.
        client.update_pilot_position(position(50.0, 8.001001), 103);
        assert_eq!(client.computed_hdg, 90.0);
    }

    #[test]
    fn test_not_ok_position_still_recorded() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        let mut pos = position(50.0, 8.0);
        pos.position_ok = false;
        client.update_pilot_position(pos, 101);
        assert_eq!(client.lat, 50.0);
        assert!(!client.position_ok);
        assert_eq!(client.alive, 101);
    }

    // ==================== ATC update tests ====================

    #[test]
    fn test_atc_update_sets_facets_and_position() {
        let mut client = Client::new(
            ClientHandshake {
                kind: ClientKind::Atc,
                ..pilot_handshake("EDDF_TWR")
            },
            100,
        );
        client.update_atc_position(
            AtcPosition {
                frequency: 20_500,
                facility_type: 4,
                visual_range: 50,
                lat: 50.03,
                lon: 8.57,
                altitude: 0,
                groundspeed: 0,
            },
            140,
        );
        assert_eq!(client.frequency, 20_500);
        assert_eq!(client.visual_range, 50);
        assert_eq!(client.lat, 50.03);
        assert_eq!(client.alive, 140);
    }

    // ==================== flight plan tests ====================

    #[test]
    fn test_plan_replacement_bumps_revision() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.set_flight_plan(plan("DLH123"));
        assert_eq!(client.plan.as_ref().unwrap().revision, 0);

        let mut second = plan("DLH123");
        second.dest_airport = "LFPG".to_string();
        client.set_flight_plan(second);

        let attached = client.plan.as_ref().unwrap();
        assert_eq!(attached.revision, 1);
        assert_eq!(attached.dest_airport, "LFPG");
    }

    #[test]
    fn test_plan_replacement_clears_local_edit_flag() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.set_flight_plan(plan("DLH123"));
        client.mark_plan_modified();
        assert!(client.fp_moded);

        client.set_flight_plan(plan("DLH123"));
        assert!(!client.fp_moded);
    }

    // ==================== range tests ====================

    #[test]
    fn test_pilot_range_grows_with_altitude() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.altitude = 0;
        assert_eq!(client.visual_range_nm(), 0.0);

        client.altitude = 6_000;
        assert!((client.visual_range_nm() - (9_000.0_f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_pilot_range_capped() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.altitude = 10_000_000;
        assert_eq!(client.visual_range_nm(), MAX_PILOT_RANGE_NM);
    }

    #[test]
    fn test_pilot_range_negative_altitude_clamped() {
        let mut client = Client::new(pilot_handshake("DLH123"), 100);
        client.altitude = -500;
        assert_eq!(client.visual_range_nm(), 0.0);
    }

    #[test]
    fn test_atc_range_uses_visual_range() {
        let mut client = Client::new(
            ClientHandshake {
                kind: ClientKind::Atc,
                ..pilot_handshake("EDDF_TWR")
            },
            100,
        );
        client.visual_range = 150;
        assert_eq!(client.visual_range_nm(), 150.0);
    }

    #[test]
    fn test_distance_between_clients() {
        let mut a = Client::new(pilot_handshake("DLH123"), 100);
        let mut b = Client::new(pilot_handshake("BAW456"), 100);
        a.update_pilot_position(position(50.033, 8.570), 101);
        b.update_pilot_position(position(51.478, -0.461), 101);
        let nm = a.distance_to(&b).unwrap();
        assert!((nm - 355.0).abs() < 5.0);
    }
}
