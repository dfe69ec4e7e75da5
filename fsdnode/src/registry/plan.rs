//! Flight plan record.
//!
//! A plan is owned by exactly one client. Delivery of a new plan replaces
//! the old one atomically; the revision counter is bumped so peers can
//! discard stale copies.

/// Flight rules under which a plan is filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPlanKind {
    /// Instrument flight rules (`I`).
    Ifr,
    /// Visual flight rules (`V`).
    Vfr,
    /// Special VFR (`S`).
    SpecialVfr,
    /// Defense VFR (`D`).
    Dvfr,
}

impl FlightPlanKind {
    /// Parse the single-character wire form. Unknown characters are
    /// rejected at the protocol boundary, so this returns `None` rather
    /// than guessing.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(Self::Ifr),
            'V' => Some(Self::Vfr),
            'S' => Some(Self::SpecialVfr),
            'D' => Some(Self::Dvfr),
            _ => None,
        }
    }

    /// The single-character wire form.
    pub fn as_char(&self) -> char {
        match self {
            Self::Ifr => 'I',
            Self::Vfr => 'V',
            Self::SpecialVfr => 'S',
            Self::Dvfr => 'D',
        }
    }
}

/// A filed flight plan, attached to at most one client.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPlan {
    pub callsign: String,
    /// Monotonic per client; bumped on every replacement.
    pub revision: i32,
    pub kind: FlightPlanKind,
    pub aircraft: String,
    /// True airspeed at cruise, knots.
    pub tascruise: i32,
    pub dep_airport: String,
    /// Filed departure time, HHMM.
    pub dep_time: i32,
    /// Actual departure time, HHMM.
    pub act_dep_time: i32,
    /// Cruise altitude as filed (free text, e.g. "FL350" or "10000").
    pub cruise_alt: String,
    pub dest_airport: String,
    pub alt_airport: String,
    pub route: String,
    pub remarks: String,
    pub hrs_enroute: i32,
    pub min_enroute: i32,
    pub hrs_fuel: i32,
    pub min_fuel: i32,
}
