//! Periodic controller and node state.
//!
//! [`Node`] owns everything the legacy daemon kept in process-wide
//! globals: the registry, this node's identity, the config manager, the
//! peer link, the certificate store, the magnetic model, and the duty
//! timestamps. The outer supervisor calls [`Node::run`] in a tight loop;
//! `run` drains the registered sub-processes every time and advances the
//! time-driven duties at most once per wall-clock second.
//!
//! # Duty order
//!
//! Within one tick, duties execute strictly in this order: status
//! refresh, server-notify, lag probe, certificate reload, snapshot
//! publish, server eviction, client eviction. Server eviction runs
//! before client eviction so the orphan cascade has already happened by
//! the time individual client timeouts are considered.
//!
//! # Failure policy
//!
//! Periodic duties return nothing. Transient failures (snapshot I/O,
//! declination lookups, unreadable cert files) are logged and retried on
//! a later cycle; malformed peer input is dropped and counted. Only
//! construction can fail.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cert::CertStore;
use crate::config::{parse_bool, ConfigError, ConfigManager};
use crate::geo::magnetic::MagneticModel;
use crate::protocol::{
    self, Command, PeerAnnounce, PeerLink, Process, ProcessManager, BROADCAST,
};
use crate::registry::{Client, ClientHandshake, Registry, Server, ServerFlags};
use crate::snapshot::{self, SnapshotError};
use crate::time::{Clock, UnixTime};

/// Seconds between runs of each periodic duty, and the timeout horizons.
#[derive(Debug, Clone, Copy)]
pub struct Intervals {
    /// Server-notify broadcast (`NOTIFYCHECK`).
    pub notify: i64,
    /// Lag probe broadcast (`LAGCHECK`).
    pub lag: i64,
    /// Certificate file mtime poll (`CERTFILECHECK`).
    pub certfile: i64,
    /// Roster + pilot snapshot publish (`WHAZZUPCHECK`).
    pub whazzup: i64,
    /// Rich status snapshot refresh (`STATUSCHECK`).
    pub status: i64,
    /// Peer eviction horizon (`SERVERTIMEOUT`).
    pub server_timeout: i64,
    /// Client eviction horizon (`CLIENTTIMEOUT`).
    pub client_timeout: i64,
    /// Client eviction horizon when this node is silent
    /// (`SILENTCLIENTTIMEOUT`, roughly ten hours: a silent node receives
    /// no updates, so ordinary timeouts would starve its view).
    pub silent_client_timeout: i64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            notify: 60,
            lag: 60,
            certfile: 60,
            whazzup: 60,
            status: 5,
            server_timeout: 600,
            client_timeout: 800,
            silent_client_timeout: 36_000,
        }
    }
}

/// Unrecoverable boot failures. Everything past construction is logged
/// and survived.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The config has no `[system] ident`; a node with no identity
    /// cannot join a federation.
    #[error("config is missing system.ident")]
    MissingIdent,
}

/// The daemon core: registry, collaborators, and duty schedule.
pub struct Node {
    registry: Registry,
    my_ident: String,
    config: ConfigManager,
    link: Box<dyn PeerLink>,
    clock: Box<dyn Clock>,
    cert: CertStore,
    magnetic: MagneticModel,
    pman: ProcessManager,
    intervals: Intervals,

    prev_notify: UnixTime,
    prev_lag: UnixTime,
    prev_cert: UnixTime,
    prev_whazzup: UnixTime,
    prev_status: UnixTime,
    /// Last wall-clock second `dochecks` ran for.
    timer: UnixTime,
    /// Re-entry guard around snapshot publication.
    fileopen: bool,

    dropped_updates: u64,
}

impl Node {
    /// Build a node from loaded configuration with default intervals.
    pub fn new(
        config: ConfigManager,
        link: Box<dyn PeerLink>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, BootError> {
        Self::with_intervals(config, link, clock, Intervals::default())
    }

    /// Build a node with explicit duty intervals (tests compress them).
    pub fn with_intervals(
        config: ConfigManager,
        link: Box<dyn PeerLink>,
        clock: Box<dyn Clock>,
        intervals: Intervals,
    ) -> Result<Self, BootError> {
        let my_ident = config
            .system_entry("ident")
            .ok_or(BootError::MissingIdent)?
            .to_string();

        let now = clock.now_unix();
        let mut node = Self {
            registry: Registry::new(),
            my_ident,
            config,
            link,
            clock,
            cert: CertStore::new(),
            magnetic: MagneticModel::new(),
            pman: ProcessManager::new(),
            intervals,
            prev_notify: now,
            prev_lag: now,
            // Zero so the first cert poll happens on the first tick past
            // the interval rather than a full interval after boot.
            prev_cert: 0,
            prev_whazzup: now,
            prev_status: now,
            timer: now,
            fileopen: false,
            dropped_updates: 0,
        };
        node.configure_myserver(now);
        info!(ident = %node.my_ident, "node configured");
        Ok(node)
    }

    /// Register a cooperatively scheduled sub-process (wire pump, METAR).
    pub fn register_process(&mut self, process: Box<dyn Process>) {
        self.pman.register(process);
    }

    // ==================== accessors ====================

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn my_ident(&self) -> &str {
        &self.my_ident
    }

    pub fn cert_store(&self) -> &CertStore {
        &self.cert
    }

    /// Updates rejected at the boundary since boot.
    pub fn dropped_updates(&self) -> u64 {
        self.dropped_updates
    }

    /// Whether this node is a receive-only federation member.
    pub fn is_silent(&self) -> bool {
        self.registry
            .get_server(&self.my_ident)
            .is_some_and(Server::is_silent)
    }

    // ==================== main loop ====================

    /// One supervisor step: drain sub-processes, then advance the duty
    /// schedule if the wall-clock second moved.
    pub fn run(&mut self) {
        for command in self.pman.run() {
            self.apply(command);
        }
        let now = self.clock.now_unix();
        if self.timer != now {
            self.timer = now;
            self.dochecks(now);
        }
    }

    /// Advance every due periodic duty. Assumes serial invocation, which
    /// [`run`](Self::run) guarantees.
    pub fn dochecks(&mut self, now: UnixTime) {
        if now - self.prev_status >= self.intervals.status {
            self.prev_status = now;
            self.publish_status(now);
        }

        if now - self.prev_notify > self.intervals.notify {
            if self.config.group("system").is_some_and(|g| g.changed) {
                self.configure_myserver(now);
            }
            if let Some(server) = self.registry.get_server(&self.my_ident) {
                self.link.send_server_notify(BROADCAST, server);
            }
            self.prev_notify = now;
        }

        if now - self.prev_lag > self.intervals.lag {
            let payload = format!("-1 {}", self.clock.now_millis());
            self.link.send_ping(BROADCAST, &payload);
            self.prev_lag = now;
        }

        if now - self.prev_cert > self.intervals.certfile {
            self.prev_cert = now;
            if let Some(path) = self.config.system_path("certificates") {
                self.cert.set_path(path);
                self.cert.check_reload();
            }
        }

        if now - self.prev_whazzup >= self.intervals.whazzup {
            self.prev_whazzup = now;
            self.publish_snapshots(now);
        }

        // Peers first: their clients cascade away here, so the client
        // timeout below never sees an orphan.
        self.registry
            .evict_servers(now, self.intervals.server_timeout, &self.my_ident);

        let limit = if self.is_silent() {
            self.intervals.silent_client_timeout
        } else {
            self.intervals.client_timeout
        };
        self.registry.evict_clients(now, limit, &self.my_ident);
    }

    // ==================== inbound commands ====================

    /// Apply one inbound command from the wire layer.
    pub fn apply(&mut self, command: Command) {
        let now = self.clock.now_unix();
        match command {
            Command::ClientConnect(handshake) => self.handle_client_connect(handshake, now),
            Command::ClientDisconnect { callsign } => {
                if self.registry.remove_client(&callsign).is_some() {
                    info!(callsign = %callsign, "client disconnected");
                }
            }
            Command::PilotPosition { tokens } => {
                let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
                self.handle_pilot_update(&tokens);
            }
            Command::AtcPosition { tokens } => {
                let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
                self.handle_atc_update(&tokens);
            }
            Command::FlightPlan {
                callsign,
                tokens,
                amended,
            } => {
                let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
                self.handle_flight_plan(&callsign, &tokens, amended);
            }
            Command::InfoLine { callsign, line } => {
                match self.registry.get_client_mut(&callsign) {
                    Some(client) => {
                        client.infolines.push(line);
                        client.set_alive(now);
                    }
                    None => self.drop_update("info line for unknown client"),
                }
            }
            Command::ServerNotify(announce) => self.handle_server_notify(announce, now),
            Command::ServerDepart { ident } => {
                if ident == self.my_ident {
                    self.drop_update("server depart naming this node");
                } else if let Some((_, clients)) = self.registry.remove_server_cascade(&ident) {
                    info!(server = %ident, clients, "peer departed");
                }
            }
        }
    }

    /// Materialise a client session after a successful handshake.
    fn handle_client_connect(&mut self, handshake: ClientHandshake, now: UnixTime) {
        if self.registry.get_server(&handshake.server_ident).is_none() {
            self.drop_update("client connect via unknown server");
            return;
        }
        let client = Client::new(handshake, now);
        info!(callsign = %client.callsign, server = %client.server_ident, "client connected");
        self.registry.insert_client(client);
    }

    /// Pilot position hook (`@` packet tokens).
    pub fn handle_pilot_update(&mut self, tokens: &[&str]) {
        let now = self.clock.now_unix();
        let Some(parsed) = protocol::parse_pilot_update(tokens) else {
            self.drop_update("malformed pilot position");
            return;
        };
        let Some(client) = self.registry.get_client_mut(&parsed.callsign) else {
            self.drop_update("pilot position for unknown client");
            return;
        };
        client.rating = parsed.rating;
        client.ident_flag = parsed.ident_flag;
        client.update_pilot_position(parsed.position, now);
    }

    /// ATC position hook (`%` packet tokens).
    pub fn handle_atc_update(&mut self, tokens: &[&str]) {
        let now = self.clock.now_unix();
        let Some(parsed) = protocol::parse_atc_update(tokens) else {
            self.drop_update("malformed ATC position");
            return;
        };
        let Some(client) = self.registry.get_client_mut(&parsed.callsign) else {
            self.drop_update("ATC position for unknown client");
            return;
        };
        client.rating = parsed.rating;
        client.update_atc_position(parsed.position, now);
    }

    /// Flight plan hook (`$FP` packet tokens).
    pub fn handle_flight_plan(&mut self, callsign: &str, tokens: &[&str], amended: bool) {
        let now = self.clock.now_unix();
        let Some(plan) = protocol::parse_flight_plan(callsign, tokens) else {
            self.drop_update("malformed flight plan");
            return;
        };
        let Some(client) = self.registry.get_client_mut(callsign) else {
            self.drop_update("flight plan for unknown client");
            return;
        };
        client.set_flight_plan(plan);
        if amended {
            client.mark_plan_modified();
        }
        client.set_alive(now);
    }

    fn handle_server_notify(&mut self, announce: PeerAnnounce, now: UnixTime) {
        if announce.ident == self.my_ident {
            debug!("ignoring server notify naming this node");
            return;
        }
        match self.registry.get_server_mut(&announce.ident) {
            Some(server) => {
                server.hostname = announce.hostname;
                server.location = announce.location;
                server.name = announce.name;
                server.email = announce.email;
                server.flags = announce.flags;
                server.set_alive(now);
            }
            None => {
                info!(server = %announce.ident, "peer announced");
                self.registry.insert_server(Server::new(
                    announce.ident,
                    announce.hostname,
                    announce.location,
                    announce.name,
                    announce.email,
                    announce.flags,
                    now,
                ));
            }
        }
    }

    fn drop_update(&mut self, reason: &str) {
        self.dropped_updates += 1;
        warn!(reason, total = self.dropped_updates, "dropped inbound update");
    }

    // ==================== duties ====================

    /// (Re)build this node's own server entry from the `system` group and
    /// acknowledge the group's change flag.
    fn configure_myserver(&mut self, now: UnixTime) {
        let (name, email, hostname, location, silent) = {
            let Some(group) = self.config.group_mut("system") else {
                return;
            };
            group.clear_changed();
            (
                group.entry("name").unwrap_or_default().to_string(),
                group.entry("email").unwrap_or_default().to_string(),
                group.entry("hostname").unwrap_or("localhost").to_string(),
                group.entry("location").unwrap_or_default().to_string(),
                group.entry("silent").map(parse_bool).unwrap_or(false),
            )
        };

        let mut flags = ServerFlags::default();
        if silent {
            flags.insert(ServerFlags::SILENT);
        }

        match self.registry.get_server_mut(&self.my_ident) {
            Some(server) => {
                server.hostname = hostname;
                server.name = name;
                server.email = email;
                server.location = location;
                server.flags = flags;
                server.set_alive(now);
            }
            None => {
                self.registry.insert_server(Server::new(
                    self.my_ident.clone(),
                    hostname,
                    location,
                    name,
                    email,
                    flags,
                    now,
                ));
            }
        }
    }

    /// Publish the roster and the pilot JSON, guarded against re-entry.
    ///
    /// Failures are transient-local by contract: log, keep the previous
    /// files on disk, retry next cycle.
    fn publish_snapshots(&mut self, now: UnixTime) {
        if self.fileopen {
            return;
        }
        let Some(path) = self.config.system_path("whazzup") else {
            return;
        };
        self.fileopen = true;
        if let Err(e) = self.try_publish_snapshots(&path, now) {
            warn!(error = %e, "snapshot publish failed; keeping previous files");
        }
        self.fileopen = false;
    }

    fn try_publish_snapshots(&self, path: &Path, now: UnixTime) -> Result<(), SnapshotError> {
        snapshot::roster::publish(path, &self.registry, now)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        snapshot::pilots::publish(dir, &self.registry, &self.magnetic, now)?;
        Ok(())
    }

    fn publish_status(&mut self, now: UnixTime) {
        let Some(path) = self.config.system_path("whazzup") else {
            return;
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        if let Err(e) = snapshot::status::publish(dir, &self.registry, &self.magnetic, now) {
            warn!(error = %e, "status publish failed; keeping previous file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{QueueProcess, RecordingLink};
    use crate::registry::ClientKind;
    use crate::time::ManualClock;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BOOT_TS: UnixTime = 1_000_000;

    struct Fixture {
        node: Node,
        clock: Arc<ManualClock>,
        link: RecordingLink,
        dir: TempDir,
    }

    fn fixture(extra: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let whazzup = dir.path().join("whazzup.txt");
        let config_path = dir.path().join("fsd.conf");
        fs::write(
            &config_path,
            format!(
                "[system]\nident = LOCAL\nname = Test Node\nhostname = localhost\n\
                 location = EU\nwhazzup = {}\n{extra}",
                whazzup.display()
            ),
        )
        .unwrap();

        let clock = ManualClock::starting_at(BOOT_TS);
        let link = RecordingLink::new();
        let node = Node::new(
            ConfigManager::load(&config_path).unwrap(),
            Box::new(link.clone()),
            Box::new(clock.clone()),
        )
        .unwrap();

        Fixture {
            node,
            clock,
            link,
            dir,
        }
    }

    fn announce(ident: &str) -> Command {
        Command::ServerNotify(PeerAnnounce {
            ident: ident.to_string(),
            hostname: format!("{}.example.net", ident.to_lowercase()),
            location: "EU".to_string(),
            name: ident.to_string(),
            email: String::new(),
            flags: ServerFlags::default(),
        })
    }

    fn connect(callsign: &str, server_ident: &str) -> Command {
        Command::ClientConnect(ClientHandshake {
            cid: "1000001".to_string(),
            server_ident: server_ident.to_string(),
            callsign: callsign.to_string(),
            kind: ClientKind::Pilot,
            rating: 1,
            realname: "Test Pilot".to_string(),
            protocol: "9".to_string(),
            simtype: 1,
        })
    }

    // ==================== boot tests ====================

    #[test]
    fn test_boot_requires_ident() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fsd.conf");
        fs::write(&path, "[system]\nname = No Ident\n").unwrap();

        let result = Node::new(
            ConfigManager::load(&path).unwrap(),
            Box::new(RecordingLink::new()),
            Box::new(ManualClock::starting_at(0)),
        );
        assert!(matches!(result, Err(BootError::MissingIdent)));
    }

    #[test]
    fn test_boot_creates_and_acknowledges_myserver() {
        let f = fixture("");
        let myserver = f.node.registry().get_server("LOCAL").unwrap();
        assert_eq!(myserver.hostname, "localhost");
        assert_eq!(myserver.name, "Test Node");
        assert!(!f.node.is_silent());
        // The boot configure consumed the change flag.
        assert!(!f.node.config.group("system").unwrap().changed);
    }

    #[test]
    fn test_silent_flag_from_config() {
        let f = fixture("silent = yes\n");
        assert!(f.node.is_silent());
    }

    // ==================== duty tests ====================

    #[test]
    fn test_notify_duty_broadcasts_myserver() {
        let mut f = fixture("");
        f.clock.advance(61);
        f.node.run();

        let traffic = f.link.recorded();
        assert_eq!(traffic.notifies, vec![(BROADCAST.to_string(), "LOCAL".to_string())]);
    }

    #[test]
    fn test_lag_duty_payload_carries_millis() {
        let mut f = fixture("");
        f.clock.advance(61);
        f.node.run();

        let traffic = f.link.recorded();
        assert_eq!(traffic.pings.len(), 1);
        let (target, payload) = &traffic.pings[0];
        assert_eq!(target, BROADCAST);
        assert_eq!(payload, &format!("-1 {}", (BOOT_TS + 61) * 1000));
    }

    #[test]
    fn test_duties_do_not_refire_within_interval() {
        let mut f = fixture("");
        f.clock.advance(61);
        f.node.run();
        f.clock.advance(1);
        f.node.run();

        assert_eq!(f.link.recorded().pings.len(), 1);
    }

    #[test]
    fn test_dochecks_at_most_once_per_second() {
        let mut f = fixture("");
        f.clock.advance(61);
        f.node.run();
        f.node.run(); // same second: no duty may refire
        assert_eq!(f.link.recorded().notifies.len(), 1);
    }

    #[test]
    fn test_cert_duty_loads_table() {
        let dir = TempDir::new().unwrap();
        let cert_path = dir.path().join("cert.txt");
        fs::write(&cert_path, "1000001 secret 5\n").unwrap();

        let mut f = fixture(&format!("certificates = {}\n", cert_path.display()));
        f.clock.advance(61);
        f.node.run();

        assert_eq!(f.node.cert_store().len(), 1);
        assert!(f.node.cert_store().get("1000001").is_some());
    }

    #[test]
    fn test_config_reload_reconfigures_myserver_on_notify() {
        let mut f = fixture("");
        // Simulate an edited config picked up by a reload.
        let path = f.dir.path().join("fsd.conf");
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("Test Node", "Renamed")).unwrap();
        f.node.config.reload().unwrap();

        f.clock.advance(61);
        f.node.run();
        assert_eq!(f.node.registry().get_server("LOCAL").unwrap().name, "Renamed");
        assert!(!f.node.config.group("system").unwrap().changed);
    }

    // ==================== eviction tests ====================

    #[test]
    fn test_server_eviction_cascades_and_spares_self() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(announce("B"));
        f.node.apply(connect("DLH123", "A"));
        f.node.apply(connect("BAW456", "B"));

        // Keep B alive, let A rot past SERVERTIMEOUT.
        f.clock.advance(601);
        f.node.apply(announce("B"));
        f.node.run();

        assert!(f.node.registry().get_server("A").is_none());
        assert!(f.node.registry().get_client("DLH123").is_none());
        assert!(f.node.registry().get_server("B").is_some());
        assert!(f.node.registry().get_client("BAW456").is_some());
        assert!(f.node.registry().get_server("LOCAL").is_some());
    }

    #[test]
    fn test_client_timeout_normal_mode() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));

        // Keep the peer alive but never refresh the client.
        f.clock.advance(500);
        f.node.apply(announce("A"));
        f.clock.advance(301);
        f.node.apply(announce("A"));
        f.node.run();

        assert!(f.node.registry().get_client("DLH123").is_none());
        assert!(f.node.registry().get_server("A").is_some());
    }

    #[test]
    fn test_silent_node_uses_stretched_client_timeout() {
        let mut f = fixture("silent = 1\n");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));

        f.clock.advance(500);
        f.node.apply(announce("A"));
        f.clock.advance(301); // past CLIENTTIMEOUT, far from SILENTCLIENTTIMEOUT
        f.node.apply(announce("A"));
        f.node.run();

        assert!(f.node.registry().get_client("DLH123").is_some());
    }

    // ==================== inbound handler tests ====================

    #[test]
    fn test_pilot_update_stamps_mock_clock() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));

        f.clock.advance(42);
        f.node.handle_pilot_update(&[
            "S", "DLH123", "2200", "1", "50.0", "8.0", "35000", "450", "0",
        ]);

        let client = f.node.registry().get_client("DLH123").unwrap();
        assert_eq!(client.alive, BOOT_TS + 42);
        assert_eq!(client.lat, 50.0);
    }

    #[test]
    fn test_malformed_updates_dropped_and_counted() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));

        f.node.handle_pilot_update(&["S", "DLH123", "2200"]);
        f.node.handle_atc_update(&["EDDF_TWR"]);
        f.node.handle_flight_plan("GHOST", &[], false);

        assert_eq!(f.node.dropped_updates(), 3);
        // Nothing changed on the live client.
        assert_eq!(f.node.registry().get_client("DLH123").unwrap().lat, 0.0);
    }

    #[test]
    fn test_connect_via_unknown_server_dropped() {
        let mut f = fixture("");
        f.node.apply(connect("DLH123", "NOWHERE"));
        assert!(f.node.registry().get_client("DLH123").is_none());
        assert_eq!(f.node.dropped_updates(), 1);
    }

    #[test]
    fn test_duplicate_callsign_second_session_wins() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));
        f.clock.advance(5);
        let mut second = connect("DLH123", "A");
        if let Command::ClientConnect(handshake) = &mut second {
            handshake.cid = "2000002".to_string();
        }
        f.node.apply(second);

        assert_eq!(f.node.registry().client_count(), 1);
        assert_eq!(f.node.registry().get_client("DLH123").unwrap().cid, "2000002");
    }

    #[test]
    fn test_flight_plan_attach_and_amend() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));

        let tokens = vec![
            "I", "B738", "450", "EDDF", "1200", "1210", "FL350", "EGLL", "1", "25", "3",
            "0", "EGKK", "/v/", "OBOKA DCT",
        ];
        f.node.handle_flight_plan("DLH123", &tokens, false);
        {
            let client = f.node.registry().get_client("DLH123").unwrap();
            assert_eq!(client.plan.as_ref().unwrap().revision, 0);
            assert!(!client.fp_moded);
        }

        f.node.handle_flight_plan("DLH123", &tokens, true);
        let client = f.node.registry().get_client("DLH123").unwrap();
        assert_eq!(client.plan.as_ref().unwrap().revision, 1);
        assert!(client.fp_moded);
    }

    #[test]
    fn test_commands_flow_through_process_manager() {
        let mut f = fixture("");
        let wire = QueueProcess::named("wire");
        f.node.register_process(Box::new(wire.clone()));

        wire.push(announce("A"));
        wire.push(connect("DLH123", "A"));
        f.node.run();

        assert!(f.node.registry().get_client("DLH123").is_some());
    }

    // ==================== snapshot duty tests ====================

    #[test]
    fn test_whazzup_duty_writes_files() {
        let mut f = fixture("");
        f.node.apply(announce("A"));
        f.node.apply(connect("DLH123", "A"));
        f.node.handle_pilot_update(&[
            "S", "DLH123", "2200", "1", "50.0", "8.0", "35000", "450", "0",
        ]);

        f.clock.advance(60);
        f.node.run();

        let roster = fs::read_to_string(f.dir.path().join("whazzup.txt")).unwrap();
        assert!(roster.contains("DLH123"));
        let json = fs::read_to_string(f.dir.path().join("pilot_snapshot.json")).unwrap();
        assert!(json.contains("\"DLH123\""));
        assert!(f.dir.path().join("status.json").exists());
    }

    #[test]
    fn test_snapshot_failure_does_not_disturb_controller() {
        let mut f = fixture("");
        // First successful publish.
        f.clock.advance(60);
        f.node.run();
        let before = fs::read_to_string(f.dir.path().join("whazzup.txt")).unwrap();

        // Sabotage the temp path, then cross the next interval.
        fs::create_dir(f.dir.path().join("whazzup.txt.tmp")).unwrap();
        f.node.apply(announce("A"));
        f.clock.advance(60);
        f.node.run();

        // Old roster intact, node still alive and serving duties.
        assert_eq!(
            fs::read_to_string(f.dir.path().join("whazzup.txt")).unwrap(),
            before
        );

        // Clear the fault: the next cycle recovers.
        fs::remove_dir(f.dir.path().join("whazzup.txt.tmp")).unwrap();
        f.clock.advance(60);
        f.node.run();
        assert!(
            fs::read_to_string(f.dir.path().join("whazzup.txt"))
                .unwrap()
                .contains("A:a.example.net")
        );
    }
}
