//! Legacy colon-delimited roster ("whazzup") file.
//!
//! External dashboards have parsed this format for decades, so the layout
//! is fixed: a GMT date stamp, a `!GENERAL` block, one line per client,
//! one line per publishable server. Client lines are seven colon-joined
//! segments; segments without data collapse to bare colons so the field
//! count stays stable for downstream parsers.

use std::path::Path;

use crate::registry::{Client, FlightPlan, Registry};
use crate::time::{sprint_gmt, sprint_gmt_date, UnixTime};

use super::{write_atomic, SnapshotError};

/// Upper altitude bound (feet) for a position to be considered publishable.
pub const MAX_PLAUSIBLE_ALTITUDE_FT: i32 = 100_000;

/// True when a client's position belongs in public snapshots.
///
/// Unreported positions sit at the (0, 0) origin and bogus altitude
/// readings run past 100 000 ft; both stay private, as does any report
/// whose position flag was cleared by the wire layer.
pub fn position_publishable(client: &Client) -> bool {
    client.position_ok
        && client.lat != 0.0
        && client.lon != 0.0
        && client.altitude < MAX_PLAUSIBLE_ALTITUDE_FT
}

/// Render the complete roster text.
pub fn render(registry: &Registry, now: UnixTime) -> String {
    let mut out = String::new();

    out.push_str(&format!("![DateStamp]{}\n", sprint_gmt_date(now)));
    out.push_str("!GENERAL\n");
    out.push_str("VERSION = 1\n");
    out.push_str("RELOAD = 1\n");
    out.push_str(&format!("UPDATE = {}\n", sprint_gmt(now)));
    out.push_str(&format!("CONNECTED CLIENTS = {}\n", registry.client_count()));
    out.push_str(&format!("CONNECTED SERVERS = {}\n", registry.server_count()));

    out.push_str("!CLIENTS\n");
    for client in registry.clients() {
        out.push_str(&client_line(client));
        out.push('\n');
    }

    out.push_str("!SERVERS\n");
    for server in registry.servers() {
        if server.is_placeholder() {
            continue;
        }
        let connected = if server.is_silent() { 0 } else { 1 };
        out.push_str(&format!(
            "{}:{}:{}:{}:{}\n",
            server.ident, server.hostname, server.location, server.name, connected
        ));
    }

    out
}

/// Render the roster and replace the target file atomically.
pub fn publish(path: &Path, registry: &Registry, now: UnixTime) -> Result<(), SnapshotError> {
    write_atomic(path, render(registry, now).as_bytes())?;
    Ok(())
}

/// One client as its seven colon-joined roster segments.
fn client_line(client: &Client) -> String {
    let seg1 = format!(
        "{}:{}:{}:{}",
        client.callsign,
        client.cid,
        client.realname,
        client.kind.roster_label()
    );

    let seg2 = frequency_segment(client.frequency);

    let seg3 = if position_publishable(client) {
        format!(
            "{:.6}:{:.6}:{}:{}",
            client.lat, client.lon, client.altitude, client.groundspeed
        )
    } else {
        ":::".to_string()
    };

    let seg4 = match &client.plan {
        Some(plan) => format!(
            "{}:{}:{}:{}:{}",
            plan.aircraft, plan.tascruise, plan.dep_airport, plan.cruise_alt, plan.dest_airport
        ),
        None => "::::".to_string(),
    };

    let seg5 = format!(
        "{}:{}:{}:{}:{}:{}",
        client.server_ident,
        client.protocol,
        client.rating,
        client.transponder,
        client.facility_type,
        client.visual_range
    );

    let seg6 = match &client.plan {
        Some(plan) => plan_extended_segment(plan),
        None => "::::::::::".to_string(),
    };

    let seg7 = format!("::::::{}", sprint_gmt(client.starttime));

    format!("{seg1}:{seg2}:{seg3}:{seg4}:{seg5}:{seg6}:{seg7}")
}

/// ATC frequency as `1FF.fff` (kHz above 100 MHz), or empty outside the
/// valid band.
fn frequency_segment(frequency: i32) -> String {
    if frequency > 0 && frequency < 100_000 {
        format!("1{:02}.{:03}", frequency / 1000, frequency % 1000)
    } else {
        String::new()
    }
}

fn plan_extended_segment(plan: &FlightPlan) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        plan.revision,
        plan.kind.as_char(),
        plan.dep_time,
        plan.act_dep_time,
        plan.hrs_enroute,
        plan.min_enroute,
        plan.hrs_fuel,
        plan.min_fuel,
        plan.alt_airport,
        plan.remarks,
        plan.route
    )
}
